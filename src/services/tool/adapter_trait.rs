// Tool Adapter Trait - 工具适配器接口
//
// 统一的检测、代理、镜像源、缓存目录操作接口。
// 默认实现完全由 ToolDescriptor 中的命令模板驱动，只有行为确实不同的工具才覆盖个别方法。

use crate::core::error::{AppError, AppResult};
use crate::models::{
    filter_value, render_template, same_config_value, template_argv, CacheInfo, CommandTemplate,
    EngineConfig, MirrorInfo, ToolDescriptor, ToolInfo, ToolOperationResult, ToolStatus,
    CACHE_DIR_PLACEHOLDER, PROXY_PLACEHOLDER, REGISTRY_PLACEHOLDER,
};
use crate::models::proxy_config::redact_proxy_url;
use crate::utils::{
    dir_size, ensure_dir, format_size, CommandOutcome, CommandResult, CommandRunner, ExecOptions,
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::time::Duration;

use super::cache::DetectionCache;

/// 适配器运行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSettings {
    /// 变更类命令超时
    pub command_timeout: Duration,
    /// 检测类命令超时
    pub detection_timeout: Duration,
    /// 变更命令与回读验证之间的等待
    pub settle_delay: Duration,
    pub cache_ttl: Duration,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for AdapterSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            command_timeout: Duration::from_millis(config.command_timeout_ms),
            detection_timeout: Duration::from_millis(config.detection_timeout_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            cache_ttl: Duration::from_millis(config.cache_ttl_ms),
        }
    }
}

/// 把失败的命令结果转为错误分类
///
/// 变更命令的"良性空结果"同样视为失败：写入操作不存在"键不存在"的合法语义。
pub(crate) fn command_error(result: &CommandResult) -> AppError {
    result.to_error().unwrap_or_else(|| AppError::CommandFailed {
        command: result.command.clone(),
        return_code: result.return_code,
        stderr: result.stderr.trim().to_string(),
    })
}

/// 工具适配器 Trait
///
/// 所有操作都是全函数：失败以 `ToolOperationResult` / `None` / `false` 表示，不会 panic。
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    // ==================== 基础信息 ====================

    fn descriptor(&self) -> &ToolDescriptor;

    fn runner(&self) -> &dyn CommandRunner;

    fn cache(&self) -> &DetectionCache<CommandResult>;

    fn settings(&self) -> &AdapterSettings;

    /// 工具唯一标识（如 "npm"）
    fn tool_id(&self) -> &str {
        self.descriptor().id
    }

    fn display_name(&self) -> &str {
        self.descriptor().display_name
    }

    // ==================== 命令执行 ====================

    /// 执行只读检测命令，结果按命令字符串缓存
    async fn run_detection(&self, argv: Vec<String>) -> CommandResult {
        let key = argv.join(" ");
        let options = ExecOptions::with_timeout(self.settings().detection_timeout)
            .benign(self.descriptor().benign_exit_codes);
        self.cache()
            .get_or_compute(&key, || async move {
                self.runner().execute(&argv, options).await
            })
            .await
    }

    /// 执行变更命令（不走缓存）
    async fn run_mutation(&self, argv: Vec<String>) -> CommandResult {
        let options = ExecOptions::with_timeout(self.settings().command_timeout)
            .benign(self.descriptor().benign_exit_codes);
        self.runner().execute(&argv, options).await
    }

    /// 执行 get 模板并过滤输出；未声明模板或命令失败时返回 `None`
    async fn read_value(&self, template: Option<CommandTemplate>) -> Option<String> {
        let template = template?;
        let result = self.run_detection(template_argv(template)).await;
        if !result.success {
            return None;
        }
        filter_value(&result.stdout)
    }

    /// 等待工具落盘
    async fn settle(&self) {
        let delay = self.settings().settle_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    // ==================== 检测逻辑 ====================

    /// 检测命令成功即视为已安装
    async fn is_installed(&self) -> bool {
        self.run_detection(template_argv(self.descriptor().check_cmd))
            .await
            .success
    }

    /// 检测命令输出的第一行（经过占位值过滤）
    async fn get_version(&self) -> Option<String> {
        let result = self
            .run_detection(template_argv(self.descriptor().check_cmd))
            .await;
        if !result.success {
            return None;
        }
        result.first_line().and_then(filter_value)
    }

    async fn get_current_proxy(&self) -> Option<String> {
        self.read_value(self.descriptor().get_proxy_cmd).await
    }

    async fn get_current_registry(&self) -> Option<String> {
        self.read_value(self.descriptor().get_registry_cmd).await
    }

    async fn get_current_cache_dir(&self) -> Option<String> {
        self.read_value(self.descriptor().get_cache_dir_cmd).await
    }

    async fn is_proxy_enabled(&self) -> bool {
        self.get_current_proxy().await.is_some()
    }

    /// 汇总工具状态快照
    ///
    /// 未安装时不再执行任何依赖安装的命令；已安装时并发读取代理、镜像源、缓存目录。
    async fn get_info(&self) -> ToolInfo {
        let descriptor = self.descriptor();
        let check = self.run_detection(template_argv(descriptor.check_cmd)).await;

        if !check.success {
            let mut info = ToolInfo::not_installed(descriptor);
            if check.outcome == CommandOutcome::TimedOut {
                info.status = ToolStatus::Error;
                info.error = check.to_error().map(|e| e.to_string());
            }
            tracing::debug!(tool_id = %descriptor.id, status = ?info.status, "工具未安装");
            return info;
        }

        let (current_proxy, registry_url, cache_dir) = tokio::join!(
            self.get_current_proxy(),
            self.get_current_registry(),
            self.get_current_cache_dir()
        );

        ToolInfo {
            id: descriptor.id.to_string(),
            display_name: descriptor.display_name.to_string(),
            category: descriptor.category,
            status: ToolStatus::Installed,
            installed: true,
            version: check.first_line().and_then(filter_value),
            proxy_enabled: current_proxy.is_some(),
            current_proxy,
            registry_url,
            cache_dir,
            mirrors: descriptor.mirrors.iter().map(MirrorInfo::from).collect(),
            capabilities: descriptor.capabilities(),
            error: None,
            detected_at: Utc::now().timestamp(),
        }
    }

    // ==================== 代理管理 ====================

    /// 启用代理：按顺序执行启用命令，遇到失败立即中止；全部成功后等待、清缓存、回读验证
    async fn enable_proxy(&self, proxy_url: &str) -> ToolOperationResult {
        let descriptor = self.descriptor();
        let tool_id = descriptor.id;

        if !descriptor.supports_proxy() {
            return ToolOperationResult::failure(
                tool_id,
                &AppError::not_supported(tool_id, "代理设置"),
            );
        }
        if proxy_url.trim().is_empty() {
            return ToolOperationResult::failure(
                tool_id,
                &AppError::InvalidInput("代理地址不能为空".to_string()),
            );
        }

        let redacted = redact_proxy_url(proxy_url);
        tracing::info!(tool_id = %tool_id, proxy = %redacted, "启用代理");

        for template in descriptor.enable_cmds {
            let argv = render_template(template, PROXY_PLACEHOLDER, proxy_url);
            let result = self.run_mutation(argv).await;
            if !result.success {
                // 前面的命令可能已经生效
                self.cache().clear();
                let error = command_error(&result);
                tracing::warn!(tool_id = %tool_id, error = %error, "启用代理命令失败，已中止");
                return ToolOperationResult::failure(tool_id, &error).with_details(result);
            }
        }

        self.settle().await;
        self.cache().clear();

        if self.is_proxy_enabled().await {
            tracing::info!(tool_id = %tool_id, proxy = %redacted, "代理已启用并通过验证");
            ToolOperationResult::success(tool_id, format!("{} 代理已启用", descriptor.display_name))
        } else {
            let error = AppError::verification_failed(tool_id, "启用代理", "回读的代理配置为空");
            tracing::warn!(tool_id = %tool_id, error = %error, "启用代理验证失败");
            ToolOperationResult::failure(tool_id, &error)
        }
    }

    /// 禁用代理：执行全部禁用命令，单条失败不中止；最后验证代理已不存在
    async fn disable_proxy(&self) -> ToolOperationResult {
        let descriptor = self.descriptor();
        let tool_id = descriptor.id;

        if descriptor.disable_cmds.is_empty() {
            return ToolOperationResult::failure(
                tool_id,
                &AppError::not_supported(tool_id, "代理设置"),
            );
        }

        tracing::info!(tool_id = %tool_id, "禁用代理");

        let mut last_failure = None;
        for template in descriptor.disable_cmds {
            let result = self.run_mutation(template_argv(template)).await;
            match result.outcome {
                CommandOutcome::Success => {}
                CommandOutcome::BenignEmpty => {
                    tracing::debug!(
                        tool_id = %tool_id,
                        command = %result.command,
                        return_code = result.return_code,
                        "配置键已不存在"
                    );
                }
                _ => {
                    tracing::warn!(
                        tool_id = %tool_id,
                        error = %command_error(&result),
                        "禁用代理命令失败，继续执行"
                    );
                    last_failure = Some(result);
                }
            }
        }

        self.settle().await;
        self.cache().clear();

        if !self.is_proxy_enabled().await {
            tracing::info!(tool_id = %tool_id, "代理已禁用并通过验证");
            return ToolOperationResult::success(
                tool_id,
                format!("{} 代理已禁用", descriptor.display_name),
            );
        }

        let error = AppError::verification_failed(tool_id, "禁用代理", "代理配置仍然存在");
        tracing::warn!(tool_id = %tool_id, error = %error, "禁用代理验证失败");
        let failure = ToolOperationResult::failure(tool_id, &error);
        match last_failure {
            Some(result) => failure.with_details(result),
            None => failure,
        }
    }

    // ==================== 镜像源 / 缓存目录 ====================

    async fn set_registry(&self, registry_url: &str) -> ToolOperationResult {
        let descriptor = self.descriptor();
        self.apply_setting(
            "镜像源设置",
            descriptor.set_registry_cmd,
            REGISTRY_PLACEHOLDER,
            descriptor.get_registry_cmd,
            registry_url,
        )
        .await
    }

    /// 设置缓存目录：先创建目录，再写入配置并回读验证
    async fn set_cache_dir(&self, cache_dir: &str) -> ToolOperationResult {
        let descriptor = self.descriptor();
        let cache_dir = cache_dir.trim();
        if descriptor.set_cache_dir_cmd.is_some() && !cache_dir.is_empty() {
            if let Err(error) = ensure_dir(Path::new(cache_dir)).await {
                tracing::warn!(tool_id = %descriptor.id, error = %error, "创建缓存目录失败");
                return ToolOperationResult::failure(descriptor.id, &error);
            }
        }
        self.apply_setting(
            "缓存目录设置",
            descriptor.set_cache_dir_cmd,
            CACHE_DIR_PLACEHOLDER,
            descriptor.get_cache_dir_cmd,
            cache_dir,
        )
        .await
    }

    /// 清理缓存：按顺序执行清理命令，遇到失败立即中止
    async fn clean_cache(&self) -> ToolOperationResult {
        let descriptor = self.descriptor();
        let tool_id = descriptor.id;

        if descriptor.clean_cache_cmds.is_empty() {
            return ToolOperationResult::failure(
                tool_id,
                &AppError::not_supported(tool_id, "缓存清理"),
            );
        }

        tracing::info!(tool_id = %tool_id, "清理缓存");

        for template in descriptor.clean_cache_cmds {
            let result = self.run_mutation(template_argv(template)).await;
            if !result.success {
                let error = command_error(&result);
                tracing::warn!(tool_id = %tool_id, error = %error, "缓存清理命令失败，已中止");
                return ToolOperationResult::failure(tool_id, &error).with_details(result);
            }
        }

        self.cache().clear();
        tracing::info!(tool_id = %tool_id, "缓存已清理");
        ToolOperationResult::success(tool_id, format!("{} 缓存已清理", descriptor.display_name))
    }

    /// 缓存路径及其占用空间；路径存在但无法统计时大小记为 0
    async fn get_cache_info(&self) -> AppResult<CacheInfo> {
        let descriptor = self.descriptor();
        let tool_id = descriptor.id;
        let template = descriptor
            .cache_path_cmd
            .or(descriptor.get_cache_dir_cmd)
            .ok_or_else(|| AppError::not_supported(tool_id, "缓存信息查询"))?;

        let result = self.run_detection(template_argv(template)).await;
        if !result.success {
            return Err(command_error(&result));
        }
        let cache_path = result
            .first_line()
            .and_then(filter_value)
            .ok_or_else(|| AppError::CommandFailed {
                command: result.command.clone(),
                return_code: result.return_code,
                stderr: "未返回缓存路径".to_string(),
            })?;

        let size_bytes = match dir_size(Path::new(&cache_path)).await {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(tool_id = %tool_id, error = %e, "统计缓存大小失败");
                0
            }
        };
        tracing::debug!(tool_id = %tool_id, path = %cache_path, size_bytes, "缓存信息");

        Ok(CacheInfo {
            tool_id: tool_id.to_string(),
            cache_path,
            size_bytes,
            size_formatted: format_size(size_bytes),
        })
    }

    /// 单值设置：执行 set 模板、等待、清缓存，再用 get 模板回读比较
    async fn apply_setting(
        &self,
        operation: &str,
        set_template: Option<CommandTemplate>,
        placeholder: &str,
        get_template: Option<CommandTemplate>,
        value: &str,
    ) -> ToolOperationResult {
        let tool_id = self.descriptor().id;

        let Some(set_template) = set_template else {
            return ToolOperationResult::failure(
                tool_id,
                &AppError::not_supported(tool_id, operation),
            );
        };
        let value = value.trim();
        if value.is_empty() {
            return ToolOperationResult::failure(
                tool_id,
                &AppError::InvalidInput(format!("{operation}的值不能为空")),
            );
        }

        tracing::info!(tool_id = %tool_id, operation = %operation, value = %value, "更新工具配置");

        let result = self
            .run_mutation(render_template(set_template, placeholder, value))
            .await;
        if !result.success {
            self.cache().clear();
            let error = command_error(&result);
            tracing::warn!(tool_id = %tool_id, error = %error, "配置命令失败");
            return ToolOperationResult::failure(tool_id, &error).with_details(result);
        }

        self.settle().await;
        self.cache().clear();

        if get_template.is_none() {
            return ToolOperationResult::success(tool_id, format!("{operation}已更新"));
        }

        match self.read_value(get_template).await {
            Some(current) if same_config_value(&current, value) => {
                ToolOperationResult::success(tool_id, format!("{operation}已更新为 {current}"))
            }
            current => {
                let reason = match current {
                    Some(current) => format!("期望 {value}，实际为 {current}"),
                    None => format!("期望 {value}，实际未设置"),
                };
                let error = AppError::verification_failed(tool_id, operation, reason);
                tracing::warn!(tool_id = %tool_id, error = %error, "配置验证失败");
                ToolOperationResult::failure(tool_id, &error)
            }
        }
    }
}
