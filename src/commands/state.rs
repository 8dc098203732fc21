// 命令层共享状态

use std::sync::Arc;
use std::time::Duration;

use crate::core::error::AppError;
use crate::models::EngineConfig;
use crate::services::precedence::{PrecedenceResolver, PrecedenceSettings};
use crate::services::proxy::{ProbeSettings, ProxyOrchestrator};
use crate::services::tool::{find_tool, AdapterRegistry, AdapterSettings};
use crate::utils::{CommandExecutor, CommandRunner};

/// 引擎状态：启动时构建一次，之后只读
pub struct AppState {
    pub config: EngineConfig,
    pub settings: AdapterSettings,
    pub runner: Arc<dyn CommandRunner>,
    pub registry: Arc<AdapterRegistry>,
    pub orchestrator: ProxyOrchestrator,
}

impl AppState {
    /// 使用真实子进程执行器
    pub fn new(config: EngineConfig) -> Self {
        let executor = CommandExecutor::new()
            .with_default_timeout(Duration::from_millis(config.command_timeout_ms));
        Self::with_runner(config, Arc::new(executor))
    }

    pub fn with_runner(config: EngineConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let settings = AdapterSettings::from(&config);
        let registry = Arc::new(AdapterRegistry::new(runner.clone(), settings));
        let orchestrator = ProxyOrchestrator::new(registry.clone(), ProbeSettings::from(&config));

        tracing::debug!(
            tools = registry.len(),
            command_timeout_ms = config.command_timeout_ms,
            detection_timeout_ms = config.detection_timeout_ms,
            "引擎状态初始化完成"
        );

        Self {
            config,
            settings,
            runner,
            registry,
            orchestrator,
        }
    }

    /// 为指定工具创建分层配置解析器
    pub(crate) fn resolver(&self, tool_id: &str) -> Result<PrecedenceResolver, String> {
        let descriptor =
            find_tool(tool_id).ok_or_else(|| AppError::NotFound(tool_id.to_string()).to_string())?;
        PrecedenceResolver::for_tool(
            descriptor,
            self.runner.clone(),
            PrecedenceSettings::from(&self.settings),
        )
        .map_err(|e| e.to_string())
    }
}
