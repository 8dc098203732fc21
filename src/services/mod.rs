// 服务层模块
//
// - tool: 工具适配器、注册表、检测缓存
// - proxy: 代理编排和连通性探测
// - precedence: 分层配置分析

pub mod precedence;
pub mod proxy;
pub mod tool;

pub use precedence::{PrecedenceResolver, PrecedenceSettings};
pub use proxy::{ProbeSettings, ProxyOrchestrator};
pub use tool::{AdapterRegistry, AdapterSettings, DetectionCache, ToolAdapter};
