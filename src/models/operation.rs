//! 状态变更类操作的结果模型

use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, ErrorKind};
use crate::utils::CommandResult;

/// 单个工具的变更操作结果（启用/禁用代理、设置镜像源等）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOperationResult {
    pub tool_id: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// 失败命令的原始结果，便于诊断
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CommandResult>,
}

impl ToolOperationResult {
    pub fn success(tool_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            success: true,
            message: message.into(),
            error_kind: None,
            details: None,
        }
    }

    pub fn failure(tool_id: impl Into<String>, error: &AppError) -> Self {
        Self {
            tool_id: tool_id.into(),
            success: false,
            message: error.to_string(),
            error_kind: Some(error.kind()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: CommandResult) -> Self {
        self.details = Some(details);
        self
    }
}

/// 批量操作结果
///
/// `results` 的顺序与输入顺序一致，不去重。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOperationResult {
    pub total_tools: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<ToolOperationResult>,
}

impl BatchOperationResult {
    pub fn from_results(results: Vec<ToolOperationResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        Self {
            total_tools: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_counts() {
        let results = vec![
            ToolOperationResult::success("npm", "ok"),
            ToolOperationResult::failure("maven", &AppError::not_supported("maven", "代理设置")),
            ToolOperationResult::success("npm", "ok again"),
        ];
        let batch = BatchOperationResult::from_results(results);

        assert_eq!(batch.total_tools, 3);
        assert_eq!(batch.success_count, 2);
        assert_eq!(batch.failure_count, 1);
        assert_eq!(batch.results[1].tool_id, "maven");
        assert_eq!(batch.results[1].error_kind, Some(ErrorKind::NotSupported));
    }

    #[test]
    fn test_success_serialization_omits_empty_fields() {
        let json = serde_json::to_value(ToolOperationResult::success("git", "done")).unwrap();
        assert!(json.get("error_kind").is_none());
        assert!(json.get("details").is_none());
        assert_eq!(json["success"], true);
    }
}
