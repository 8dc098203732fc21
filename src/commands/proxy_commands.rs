// 代理相关命令

use super::state::AppState;
use crate::models::{BatchOperationResult, ProxyTestResult, ToolOperationResult};
use crate::services::tool::ToolAdapter;

/// 为单个工具启用代理，未知工具返回 NotFound 结果
pub async fn enable_proxy(state: &AppState, tool_id: &str, proxy_url: &str) -> ToolOperationResult {
    state.orchestrator.enable_proxy(tool_id, proxy_url).await
}

pub async fn disable_proxy(state: &AppState, tool_id: &str) -> ToolOperationResult {
    state.orchestrator.disable_proxy(tool_id).await
}

pub async fn enable_proxy_batch(
    state: &AppState,
    tool_ids: &[String],
    proxy_url: &str,
) -> BatchOperationResult {
    state
        .orchestrator
        .enable_proxy_batch(tool_ids, proxy_url)
        .await
}

pub async fn disable_proxy_batch(state: &AppState, tool_ids: &[String]) -> BatchOperationResult {
    state.orchestrator.disable_proxy_batch(tool_ids).await
}

/// 工具当前是否配置了代理
pub async fn is_proxy_enabled(state: &AppState, tool_id: &str) -> Result<bool, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    Ok(adapter.is_proxy_enabled().await)
}

/// 代理是否可用
pub async fn test_proxy(state: &AppState, proxy_url: &str) -> bool {
    state.orchestrator.test_proxy(proxy_url).await
}

/// 代理连通性详细结果（状态码、耗时、错误信息）
pub async fn probe_proxy(state: &AppState, proxy_url: &str) -> ProxyTestResult {
    state.orchestrator.probe_proxy(proxy_url).await
}
