// 分层配置命令（目前只有 npm 支持）

use super::state::AppState;
use crate::models::{
    BatchOperationResult, PrecedenceReport, PrecedenceSnapshot, RegistryPing, ToolOperationResult,
};
use crate::services::tool::ToolAdapter;

const NPM: &str = "npm";

/// 单个配置键的分层快照
pub async fn get_precedence_snapshot(
    state: &AppState,
    tool_id: &str,
    key: &str,
) -> Result<PrecedenceSnapshot, String> {
    state
        .resolver(tool_id)?
        .snapshot(key)
        .await
        .map_err(|e| e.to_string())
}

/// npm 配置诊断报告
pub async fn npm_diagnose(state: &AppState) -> Result<PrecedenceReport, String> {
    Ok(state.resolver(NPM)?.diagnose().await)
}

/// 把配置值固定到 user 层，并移除 global 层中的同名键
pub async fn npm_pin_user_value(
    state: &AppState,
    key: &str,
    value: &str,
) -> Result<ToolOperationResult, String> {
    let result = state.resolver(NPM)?.pin_user_value(key, value).await;
    // 解析器绕过了适配器，手动让检测缓存失效
    if let Some(adapter) = state.registry.get(NPM) {
        adapter.cache().clear();
    }
    Ok(result)
}

/// 清理 npm global 配置，`keys` 为空时清理默认清单
pub async fn npm_clear_global_config(
    state: &AppState,
    keys: &[String],
) -> Result<BatchOperationResult, String> {
    let result = state.resolver(NPM)?.clear_global_tier(keys).await;
    if let Some(adapter) = state.registry.get(NPM) {
        adapter.cache().clear();
    }
    Ok(result)
}

pub async fn npm_ping_registry(
    state: &AppState,
    registry_url: &str,
) -> Result<RegistryPing, String> {
    Ok(state.resolver(NPM)?.ping_registry(registry_url).await)
}
