//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义引擎对外暴露的错误分类。所有公开操作都把错误表示为数据
//! （`ToolOperationResult` 中的 `error_kind`），只有按 ID 查询单个工具时才会以
//! `Err(AppError::NotFound)` 的形式返回。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 引擎统一错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 工具没有声明对应的命令模板
    #[error("工具 {tool_id} 不支持{operation}")]
    NotSupported { tool_id: String, operation: String },

    /// 未知的工具 ID
    #[error("未找到工具: {0}")]
    NotFound(String),

    /// 命令执行超时（或被信号终止）
    #[error("命令执行超时（已运行 {elapsed_ms}ms）: {command}")]
    ProcessTimeout { command: String, elapsed_ms: u64 },

    /// 进程无法启动
    #[error("命令启动失败: {command}: {reason}")]
    ProcessSpawnFailure { command: String, reason: String },

    /// 命令返回非零退出码且不在容忍列表中
    #[error("命令执行失败（返回码 {return_code}）: {command}: {stderr}")]
    CommandFailed {
        command: String,
        return_code: i32,
        stderr: String,
    },

    /// 命令全部成功，但回读验证未通过
    #[error("{tool_id} {operation}验证未通过: {reason}")]
    VerificationFailed {
        tool_id: String,
        operation: String,
        reason: String,
    },

    /// 非法输入（配置键、代理 URL 等）
    #[error("无效的输入: {0}")]
    InvalidInput(String),

    /// 本地文件系统操作失败（创建缓存目录、统计目录大小）
    #[error("文件操作失败: {0}")]
    Io(String),

    /// 引擎配置文件读写错误
    #[error("配置错误: {0}")]
    Config(String),

    /// HTTP 客户端构建失败
    #[error("HTTP 客户端错误: {0}")]
    Http(String),
}

/// 便于在服务层使用的结果别名
pub type AppResult<T> = std::result::Result<T, AppError>;

/// 可序列化的错误分类，随操作结果一起返回给调用方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotSupported,
    NotFound,
    ProcessTimeout,
    ProcessSpawnFailure,
    CommandFailed,
    VerificationFailed,
    InvalidInput,
    Io,
    Config,
    Http,
}

impl AppError {
    pub fn not_supported(tool_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::NotSupported {
            tool_id: tool_id.into(),
            operation: operation.into(),
        }
    }

    pub fn verification_failed(
        tool_id: impl Into<String>,
        operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::VerificationFailed {
            tool_id: tool_id.into(),
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// 获取错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotSupported { .. } => ErrorKind::NotSupported,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::ProcessTimeout { .. } => ErrorKind::ProcessTimeout,
            AppError::ProcessSpawnFailure { .. } => ErrorKind::ProcessSpawnFailure,
            AppError::CommandFailed { .. } => ErrorKind::CommandFailed,
            AppError::VerificationFailed { .. } => ErrorKind::VerificationFailed,
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
            AppError::Io(_) => ErrorKind::Io,
            AppError::Config(_) => ErrorKind::Config,
            AppError::Http(_) => ErrorKind::Http,
        }
    }
}
