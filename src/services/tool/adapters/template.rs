use crate::models::ToolDescriptor;
use crate::services::tool::adapter_trait::{AdapterSettings, ToolAdapter};
use crate::services::tool::cache::DetectionCache;
use crate::utils::{CommandResult, CommandRunner};
use async_trait::async_trait;
use std::sync::Arc;

/// 由命令模板驱动的通用适配器
///
/// 除 yarn 外的所有内置工具都直接使用它，行为完全来自 trait 默认实现。
pub struct TemplateAdapter {
    descriptor: &'static ToolDescriptor,
    runner: Arc<dyn CommandRunner>,
    cache: DetectionCache<CommandResult>,
    settings: AdapterSettings,
}

impl TemplateAdapter {
    pub fn new(
        descriptor: &'static ToolDescriptor,
        runner: Arc<dyn CommandRunner>,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            descriptor,
            runner,
            cache: DetectionCache::new(settings.cache_ttl),
            settings,
        }
    }
}

#[async_trait]
impl ToolAdapter for TemplateAdapter {
    fn descriptor(&self) -> &ToolDescriptor {
        self.descriptor
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn cache(&self) -> &DetectionCache<CommandResult> {
        &self.cache
    }

    fn settings(&self) -> &AdapterSettings {
        &self.settings
    }
}
