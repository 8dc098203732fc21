// 代理服务模块
//
// 包含代理启用/禁用编排和连通性探测

pub mod orchestrator;
pub mod probe;

pub use orchestrator::ProxyOrchestrator;
pub use probe::{probe_through_proxy, time_registry_request, ProbeSettings};
