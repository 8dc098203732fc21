// 代理编排器
//
// 负责按工具 ID 分发启用/禁用请求、批量执行以及代理连通性测试：
// - 单工具操作遇到未知 ID 返回 NotFound 结果
// - 批量操作严格按输入顺序串行执行，单个失败不影响后续工具

use std::sync::Arc;

use super::probe::{probe_through_proxy, time_registry_request, ProbeSettings};
use crate::core::error::AppError;
use crate::models::{BatchOperationResult, ProxyTestResult, RegistryPing, ToolOperationResult};
use crate::services::tool::AdapterRegistry;

/// 代理编排器
pub struct ProxyOrchestrator {
    registry: Arc<AdapterRegistry>,
    probe: ProbeSettings,
}

impl ProxyOrchestrator {
    pub fn new(registry: Arc<AdapterRegistry>, probe: ProbeSettings) -> Self {
        Self { registry, probe }
    }

    /// 为单个工具启用代理
    pub async fn enable_proxy(&self, tool_id: &str, proxy_url: &str) -> ToolOperationResult {
        match self.registry.get(tool_id) {
            Some(adapter) => adapter.enable_proxy(proxy_url).await,
            None => not_found(tool_id),
        }
    }

    /// 为单个工具禁用代理
    pub async fn disable_proxy(&self, tool_id: &str) -> ToolOperationResult {
        match self.registry.get(tool_id) {
            Some(adapter) => adapter.disable_proxy().await,
            None => not_found(tool_id),
        }
    }

    /// 批量启用代理
    pub async fn enable_proxy_batch(
        &self,
        tool_ids: &[String],
        proxy_url: &str,
    ) -> BatchOperationResult {
        tracing::info!(count = tool_ids.len(), "批量启用代理");
        let mut results = Vec::with_capacity(tool_ids.len());
        for tool_id in tool_ids {
            results.push(self.enable_proxy(tool_id, proxy_url).await);
        }
        log_batch("批量启用代理完成", BatchOperationResult::from_results(results))
    }

    /// 批量禁用代理
    pub async fn disable_proxy_batch(&self, tool_ids: &[String]) -> BatchOperationResult {
        tracing::info!(count = tool_ids.len(), "批量禁用代理");
        let mut results = Vec::with_capacity(tool_ids.len());
        for tool_id in tool_ids {
            results.push(self.disable_proxy(tool_id).await);
        }
        log_batch("批量禁用代理完成", BatchOperationResult::from_results(results))
    }

    /// 代理是否可用
    pub async fn test_proxy(&self, proxy_url: &str) -> bool {
        self.probe_proxy(proxy_url).await.success
    }

    /// 代理连通性详细结果
    pub async fn probe_proxy(&self, proxy_url: &str) -> ProxyTestResult {
        probe_through_proxy(proxy_url, &self.probe).await
    }

    /// 直连镜像源测速，超时与代理测试相同
    pub async fn time_registry(&self, registry_url: &str) -> RegistryPing {
        time_registry_request(registry_url, self.probe.timeout).await
    }
}

fn not_found(tool_id: &str) -> ToolOperationResult {
    tracing::warn!(tool_id = %tool_id, "未知的工具 ID");
    ToolOperationResult::failure(tool_id, &AppError::NotFound(tool_id.to_string()))
}

fn log_batch(message: &str, batch: BatchOperationResult) -> BatchOperationResult {
    tracing::info!(
        total = batch.total_tools,
        success = batch.success_count,
        failure = batch.failure_count,
        "{}",
        message
    );
    batch
}
