// lib.rs - 暴露引擎给 CLI 和其他前端使用

pub mod commands;
pub mod core;
pub mod models;
pub mod services;
pub mod utils;

pub use models::*;

pub use commands::AppState;
pub use services::precedence::PrecedenceResolver;
pub use services::proxy::ProxyOrchestrator;
pub use services::tool::{AdapterRegistry, DetectionCache, ToolAdapter};

pub use utils::command::{CommandExecutor, CommandResult, CommandRunner, EnvOverlay, ExecOptions};
pub use utils::config::{load_engine_config, write_engine_config};

// 重新导出常用类型
pub use anyhow::{Context, Result};

pub use core::{init_logger, update_log_level, AppError, AppResult, ErrorKind};
