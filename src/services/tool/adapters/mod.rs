// Tool Adapters Module
//
// 包含所有工具的适配器实现和注册表

mod template;
mod yarn;

pub use template::TemplateAdapter;
pub use yarn::{read_yarnrc_proxy, YarnAdapter};

use super::adapter_trait::{AdapterSettings, ToolAdapter};
use super::tools_config::BUILTIN_TOOLS;
use crate::core::error::{AppError, AppResult};
use crate::models::{ToolCategory, ToolSummary};
use crate::utils::CommandRunner;
use std::collections::HashMap;
use std::sync::Arc;

/// 适配器注册表
///
/// 启动时由内置工具表一次性构建，`all()` 保持声明顺序。
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn ToolAdapter>>,
    index: HashMap<String, usize>,
}

impl AdapterRegistry {
    /// 创建注册表并注册所有内置工具
    pub fn new(runner: Arc<dyn CommandRunner>, settings: AdapterSettings) -> Self {
        let mut registry = Self::empty();

        for descriptor in BUILTIN_TOOLS {
            let adapter: Arc<dyn ToolAdapter> = match descriptor.id {
                "yarn" => Arc::new(YarnAdapter::new(descriptor, runner.clone(), settings)),
                _ => Arc::new(TemplateAdapter::new(descriptor, runner.clone(), settings)),
            };
            registry.register(adapter);
        }

        tracing::debug!(
            "适配器注册表初始化完成，已注册 {} 个工具",
            registry.adapters.len()
        );

        registry
    }

    fn empty() -> Self {
        Self {
            adapters: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// 注册一个适配器；ID 已存在时替换原有适配器并保留其位置
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        let tool_id = adapter.tool_id().to_string();
        tracing::trace!("注册工具适配器: {}", tool_id);
        match self.index.get(&tool_id) {
            Some(&position) => self.adapters[position] = adapter,
            None => {
                self.index.insert(tool_id, self.adapters.len());
                self.adapters.push(adapter);
            }
        }
    }

    /// 根据工具 ID 获取适配器
    pub fn get(&self, tool_id: &str) -> Option<Arc<dyn ToolAdapter>> {
        self.index
            .get(tool_id)
            .map(|&position| self.adapters[position].clone())
    }

    /// 与 `get` 相同，但未知 ID 返回 `NotFound`
    pub fn require(&self, tool_id: &str) -> AppResult<Arc<dyn ToolAdapter>> {
        self.get(tool_id)
            .ok_or_else(|| AppError::NotFound(tool_id.to_string()))
    }

    /// 所有适配器（声明顺序）
    pub fn all(&self) -> Vec<Arc<dyn ToolAdapter>> {
        self.adapters.clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|adapter| adapter.tool_id().to_string())
            .collect()
    }

    pub fn contains(&self, tool_id: &str) -> bool {
        self.index.contains_key(tool_id)
    }

    pub fn by_category(&self, category: ToolCategory) -> Vec<Arc<dyn ToolAdapter>> {
        self.adapters
            .iter()
            .filter(|adapter| adapter.descriptor().category == category)
            .cloned()
            .collect()
    }

    /// 出现过的分类（排序、去重）
    pub fn categories(&self) -> Vec<ToolCategory> {
        let mut categories: Vec<ToolCategory> = self
            .adapters
            .iter()
            .map(|adapter| adapter.descriptor().category)
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn summaries(&self) -> Vec<ToolSummary> {
        self.adapters
            .iter()
            .map(|adapter| adapter.descriptor().summary())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
