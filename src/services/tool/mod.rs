// 工具服务模块
//
// 包含工具适配器、注册表、检测缓存和内置工具定义

pub mod adapter_trait;
pub mod adapters;
pub mod cache;
pub mod tools_config;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter_trait::{AdapterSettings, ToolAdapter};
pub use adapters::{AdapterRegistry, TemplateAdapter, YarnAdapter};
pub use cache::DetectionCache;
pub use tools_config::{find_tool, BUILTIN_TOOLS, NPM_TIERS};
