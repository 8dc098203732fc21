use crate::models::{filter_value, ToolDescriptor};
use crate::services::tool::adapter_trait::{AdapterSettings, ToolAdapter};
use crate::services::tool::cache::DetectionCache;
use crate::utils::{CommandResult, CommandRunner};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::TemplateAdapter;

static YARNRC_PROXY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*"?(?:https-)?proxy"?\s+"([^"]*)""#).expect("invalid yarnrc regex")
});

/// Yarn 适配器
///
/// 代理读取走 `~/.yarnrc` 而不是 `yarn config get`，其余操作与模板适配器相同。
pub struct YarnAdapter {
    inner: TemplateAdapter,
    rc_path: Option<PathBuf>,
}

impl YarnAdapter {
    pub fn new(
        descriptor: &'static ToolDescriptor,
        runner: Arc<dyn CommandRunner>,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            inner: TemplateAdapter::new(descriptor, runner, settings),
            rc_path: dirs::home_dir().map(|home| home.join(".yarnrc")),
        }
    }

    /// 指定 .yarnrc 路径
    pub fn with_rc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rc_path = Some(path.into());
        self
    }
}

/// 从 .yarnrc 中读取第一个有效的 `proxy "..."` / `https-proxy "..."` 值
///
/// 文件不存在或无法读取都视为未配置代理。
pub async fn read_yarnrc_proxy(path: &Path) -> Option<String> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "读取 .yarnrc 失败");
            }
            return None;
        }
    };

    content.lines().find_map(|line| {
        YARNRC_PROXY
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|value| filter_value(value.as_str()))
    })
}

#[async_trait]
impl ToolAdapter for YarnAdapter {
    fn descriptor(&self) -> &ToolDescriptor {
        self.inner.descriptor()
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.inner.runner()
    }

    fn cache(&self) -> &DetectionCache<CommandResult> {
        self.inner.cache()
    }

    fn settings(&self) -> &AdapterSettings {
        self.inner.settings()
    }

    async fn get_current_proxy(&self) -> Option<String> {
        let path = self.rc_path.as_deref()?;
        read_yarnrc_proxy(path).await
    }
}
