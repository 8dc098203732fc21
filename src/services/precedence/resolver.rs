//! 分层配置解析
//!
//! 同时查询生效值、user 层和 global 层，并扫描进程环境中会覆盖配置文件的变量，
//! 判断当前生效值来自哪一层、global 层是否构成真正的覆盖。
//!
//! 查询子进程一律带上移除 `<prefix>*` 环境变量的覆盖层，这样看到的是配置文件本身；
//! 环境变量的影响单独通过扫描报告。

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use crate::core::error::{AppError, AppResult};
use crate::models::{
    filter_value, same_config_value, BatchOperationResult, ConfigTier, PrecedenceReport,
    PrecedenceSnapshot, RegistryPing, TieredConfigProfile, ToolDescriptor, ToolOperationResult,
};
use crate::services::tool::adapter_trait::{command_error, AdapterSettings};
use crate::utils::{CommandOutcome, CommandResult, CommandRunner, EnvOverlay, ExecOptions};

/// 固定值后等待配置落盘的时间
pub const PIN_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// 清空 global 层时默认删除的键
pub const GLOBAL_CLEANUP_KEYS: &[&str] = &[
    "registry",
    "proxy",
    "https-proxy",
    "cache",
    "prefix",
    "cafile",
    "cert",
    "key",
    "strict-ssl",
    "user-agent",
];

/// 环境变量来源（测试时可替换）
pub type EnvScanner = Arc<dyn Fn() -> Vec<(String, String)> + Send + Sync>;

fn process_env() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// 解析器参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecedenceSettings {
    pub query_timeout: Duration,
    pub command_timeout: Duration,
    pub pin_settle_delay: Duration,
}

impl From<&AdapterSettings> for PrecedenceSettings {
    fn from(settings: &AdapterSettings) -> Self {
        Self {
            query_timeout: settings.detection_timeout,
            command_timeout: settings.command_timeout,
            pin_settle_delay: PIN_SETTLE_DELAY,
        }
    }
}

impl Default for PrecedenceSettings {
    fn default() -> Self {
        Self::from(&AdapterSettings::default())
    }
}

/// 分层配置解析器（目前只有 npm 声明了分层配置）
pub struct PrecedenceResolver {
    tool_id: &'static str,
    profile: &'static TieredConfigProfile,
    runner: Arc<dyn CommandRunner>,
    settings: PrecedenceSettings,
    env_scanner: EnvScanner,
}

impl PrecedenceResolver {
    pub fn new(
        tool_id: &'static str,
        profile: &'static TieredConfigProfile,
        runner: Arc<dyn CommandRunner>,
        settings: PrecedenceSettings,
    ) -> Self {
        Self {
            tool_id,
            profile,
            runner,
            settings,
            env_scanner: Arc::new(process_env),
        }
    }

    /// 为声明了分层配置的工具创建解析器，其余工具返回 `NotSupported`
    pub fn for_tool(
        descriptor: &'static ToolDescriptor,
        runner: Arc<dyn CommandRunner>,
        settings: PrecedenceSettings,
    ) -> AppResult<Self> {
        let profile = descriptor
            .tiers
            .ok_or_else(|| AppError::not_supported(descriptor.id, "分层配置分析"))?;
        Ok(Self::new(descriptor.id, profile, runner, settings))
    }

    pub fn with_env_scanner(mut self, scanner: EnvScanner) -> Self {
        self.env_scanner = scanner;
        self
    }

    pub fn tool_id(&self) -> &str {
        self.tool_id
    }

    pub fn profile(&self) -> &'static TieredConfigProfile {
        self.profile
    }

    // ==================== 查询 ====================

    /// 单个键的分层快照
    pub async fn snapshot(&self, key: &str) -> AppResult<PrecedenceSnapshot> {
        validate_key(key)?;
        let env = self.scan_env();

        let (effective, user, global) = tokio::join!(
            self.query(key, None, &env),
            self.query(key, Some(self.profile.user_scope), &env),
            self.query(key, Some(self.profile.global_scope), &env),
        );

        let effective = effective.as_deref().and_then(filter_value);
        let defaults = self.profile.defaults_for(key);
        let global = global.filter(|value| !defaults.contains(&value.as_str()));

        let has_global_override = match (&global, &user) {
            (Some(global), Some(user)) => !same_config_value(global, user),
            (Some(_), None) => true,
            (None, _) => false,
        };

        let env_name = self.profile.env_var_name(key);
        let env_vars: BTreeMap<String, String> = env
            .iter()
            .filter(|(name, _)| name.to_lowercase() == env_name)
            .cloned()
            .collect();

        let source = if !env_vars.is_empty() {
            ConfigTier::Environment
        } else if user.is_some() {
            ConfigTier::User
        } else if global.is_some() {
            ConfigTier::Global
        } else {
            ConfigTier::Default
        };

        let diagnostics = diagnose_tiers(key, &env_vars, user.as_deref(), global.as_deref());

        tracing::debug!(
            tool_id = %self.tool_id,
            key = %key,
            source = ?source,
            has_global_override,
            env_count = env_vars.len(),
            "分层配置分析完成"
        );

        Ok(PrecedenceSnapshot {
            tool_id: self.tool_id.to_string(),
            key: key.to_string(),
            effective,
            user,
            global,
            has_global_override,
            env_vars,
            source,
            diagnostics,
        })
    }

    /// 标准键的完整诊断报告
    pub async fn diagnose(&self) -> PrecedenceReport {
        let env = self.scan_env();
        let overlay = self.overlay(&env);

        let version_argv = vec![self.profile.binary.to_string(), "--version".to_string()];
        let list_argv = vec![
            self.profile.binary.to_string(),
            "config".to_string(),
            "list".to_string(),
        ];
        let (version, config_list) = tokio::join!(
            self.run(&version_argv, self.settings.query_timeout, &overlay),
            self.run(&list_argv, self.settings.query_timeout, &overlay),
        );

        let snapshots: Vec<PrecedenceSnapshot> =
            join_all(self.profile.keys.iter().map(|key| self.snapshot(key.name)))
                .await
                .into_iter()
                .filter_map(|snapshot| snapshot.ok())
                .collect();

        let has_global_config = snapshots.iter().any(|s| s.global.is_some());
        let env_vars = env
            .into_iter()
            .filter(|(name, _)| name.to_lowercase().starts_with(self.profile.env_prefix))
            .collect();

        tracing::info!(
            tool_id = %self.tool_id,
            keys = snapshots.len(),
            has_global_config,
            "分层配置诊断完成"
        );

        PrecedenceReport {
            tool_id: self.tool_id.to_string(),
            version: version
                .success
                .then(|| version.first_line().and_then(filter_value))
                .flatten(),
            config_list: config_list.success.then(|| config_list.stdout.clone()),
            env_vars,
            has_global_config,
            snapshots,
        }
    }

    /// 测试镜像源连通性（`<binary> ping --registry=<url>`）
    pub async fn ping_registry(&self, registry_url: &str) -> RegistryPing {
        let registry = registry_url.trim().to_string();
        if registry.is_empty() {
            return RegistryPing {
                registry,
                success: false,
                duration_ms: 0,
                message: "镜像源地址不能为空".to_string(),
            };
        }

        let overlay = self.overlay(&self.scan_env());
        let argv = vec![
            self.profile.binary.to_string(),
            "ping".to_string(),
            format!("--registry={registry}"),
        ];
        let started = Instant::now();
        let result = self.run(&argv, self.settings.command_timeout, &overlay).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let message = if result.success {
            let stdout = result.stdout.trim();
            if stdout.is_empty() {
                format!("{duration_ms}ms")
            } else {
                stdout.to_string()
            }
        } else {
            command_error(&result).to_string()
        };

        tracing::info!(
            tool_id = %self.tool_id,
            registry = %registry,
            success = result.success,
            duration_ms,
            "镜像源测试完成"
        );

        RegistryPing {
            registry,
            success: result.success,
            duration_ms,
            message,
        }
    }

    // ==================== 变更 ====================

    /// 把值固定在 user 层：先删除 global 层，再写入 user 层，等待后回读生效值
    pub async fn pin_user_value(&self, key: &str, value: &str) -> ToolOperationResult {
        if let Err(e) = validate_key(key) {
            return ToolOperationResult::failure(self.tool_id, &e);
        }
        let value = value.trim();
        if value.is_empty() {
            return ToolOperationResult::failure(
                self.tool_id,
                &AppError::InvalidInput(format!("{key} 的值不能为空")),
            );
        }

        let env = self.scan_env();
        let overlay = self.overlay(&env);

        let delete = self
            .run(
                &self.scoped_argv(self.profile.delete_args, key, None, self.profile.global_scope),
                self.settings.command_timeout,
                &overlay,
            )
            .await;
        if !delete.success {
            tracing::debug!(tool_id = %self.tool_id, key = %key, "删除 global 配置失败（可能本就不存在）");
        }

        let set = self
            .run(
                &self.scoped_argv(self.profile.set_args, key, Some(value), self.profile.user_scope),
                self.settings.command_timeout,
                &overlay,
            )
            .await;
        if !set.success {
            let error = command_error(&set);
            tracing::warn!(tool_id = %self.tool_id, key = %key, error = %error, "写入 user 配置失败");
            return ToolOperationResult::failure(self.tool_id, &error).with_details(set);
        }

        if !self.settings.pin_settle_delay.is_zero() {
            tokio::time::sleep(self.settings.pin_settle_delay).await;
        }

        let effective = self
            .query(key, None, &env)
            .await
            .and_then(|actual| filter_value(&actual));
        let shadowing: Vec<&String> = env
            .iter()
            .filter(|(name, _)| name.to_lowercase() == self.profile.env_var_name(key))
            .map(|(name, _)| name)
            .collect();

        match effective {
            Some(actual) if same_config_value(&actual, value) => {
                let mut message = format!("{key} 已设置为 {actual}（user 配置）");
                if !shadowing.is_empty() {
                    message.push_str(&format!(
                        "；注意：环境变量 {} 仍会在终端中覆盖该配置",
                        join_names(&shadowing)
                    ));
                }
                tracing::info!(tool_id = %self.tool_id, key = %key, "user 配置已固定并通过验证");
                ToolOperationResult::success(self.tool_id, message)
            }
            actual => {
                let mut reason = format!(
                    "期望 {value}，实际为 {}",
                    actual.as_deref().unwrap_or("未设置")
                );
                if !shadowing.is_empty() {
                    reason.push_str(&format!(
                        "，可能存在环境变量覆盖: {}",
                        join_names(&shadowing)
                    ));
                }
                let error = AppError::verification_failed(self.tool_id, format!("设置 {key} "), reason);
                tracing::warn!(tool_id = %self.tool_id, error = %error, "user 配置验证失败");
                ToolOperationResult::failure(self.tool_id, &error)
            }
        }
    }

    /// 删除 global 层中的指定键；`keys` 为空时删除默认清单
    pub async fn clear_global_tier(&self, keys: &[String]) -> BatchOperationResult {
        let keys: Vec<String> = if keys.is_empty() {
            GLOBAL_CLEANUP_KEYS.iter().map(|k| k.to_string()).collect()
        } else {
            keys.to_vec()
        };

        let overlay = self.overlay(&self.scan_env());
        let mut results = Vec::with_capacity(keys.len());

        for key in &keys {
            if let Err(e) = validate_key(key) {
                results.push(ToolOperationResult::failure(self.tool_id, &e));
                continue;
            }
            let result = self
                .run(
                    &self.scoped_argv(self.profile.delete_args, key, None, self.profile.global_scope),
                    self.settings.command_timeout,
                    &overlay,
                )
                .await;
            let entry = match result.outcome {
                CommandOutcome::Success | CommandOutcome::BenignEmpty => {
                    ToolOperationResult::success(self.tool_id, format!("已删除 global 配置 {key}"))
                }
                _ => {
                    let error = command_error(&result);
                    tracing::warn!(tool_id = %self.tool_id, key = %key, error = %error, "删除 global 配置失败");
                    ToolOperationResult::failure(self.tool_id, &error).with_details(result)
                }
            };
            results.push(entry);
        }

        let batch = BatchOperationResult::from_results(results);
        tracing::info!(
            tool_id = %self.tool_id,
            total = batch.total_tools,
            failure = batch.failure_count,
            "global 配置清理完成"
        );
        batch
    }

    // ==================== 内部 ====================

    fn scan_env(&self) -> Vec<(String, String)> {
        let prefix = self.profile.env_prefix.to_lowercase();
        (self.env_scanner)()
            .into_iter()
            .filter(|(name, _)| name.to_lowercase().starts_with(&prefix))
            .collect()
    }

    fn overlay(&self, env: &[(String, String)]) -> EnvOverlay {
        EnvOverlay::without_prefix_in(
            self.profile.env_prefix,
            env.iter().map(|(name, _)| OsString::from(name)),
        )
    }

    /// `<binary> <args..> <key> [value] <scope>`
    fn scoped_argv(
        &self,
        args: &[&str],
        key: &str,
        value: Option<&str>,
        scope: &str,
    ) -> Vec<String> {
        std::iter::once(self.profile.binary)
            .chain(args.iter().copied())
            .chain(std::iter::once(key))
            .chain(value)
            .chain(std::iter::once(scope))
            .map(str::to_string)
            .collect()
    }

    async fn run(&self, argv: &[String], timeout: Duration, overlay: &EnvOverlay) -> CommandResult {
        let options = ExecOptions::with_timeout(timeout).env(overlay.clone());
        self.runner.execute(argv, options).await
    }

    /// 查询单层的值：空串和 `undefined` 视为未设置，命令失败同样视为未设置
    async fn query(
        &self,
        key: &str,
        scope: Option<&str>,
        env: &[(String, String)],
    ) -> Option<String> {
        let argv: Vec<String> = std::iter::once(self.profile.binary)
            .chain(self.profile.get_args.iter().copied())
            .chain(std::iter::once(key))
            .chain(scope)
            .map(str::to_string)
            .collect();

        let result = self
            .run(&argv, self.settings.query_timeout, &self.overlay(env))
            .await;
        if !result.success {
            tracing::debug!(command = %result.command, return_code = result.return_code, "分层配置查询失败");
            return None;
        }

        let value = result.stdout.trim();
        if value.is_empty() || value == "undefined" {
            None
        } else {
            Some(value.to_string())
        }
    }
}

/// 作用域键（`@scope:registry`）和按主机的认证键（`//host/:_authToken`）都是合法的，
/// 只拒绝会被当作额外参数的输入
fn validate_key(key: &str) -> AppResult<()> {
    if key.is_empty() || key.starts_with('-') || key.chars().any(char::is_whitespace) {
        return Err(AppError::InvalidInput(format!("非法的配置键: {key:?}")));
    }
    Ok(())
}

fn join_names(names: &[&String]) -> String {
    names
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn diagnose_tiers(
    key: &str,
    env_vars: &BTreeMap<String, String>,
    user: Option<&str>,
    global: Option<&str>,
) -> Vec<String> {
    let mut diagnostics: Vec<String> = env_vars
        .iter()
        .map(|(name, value)| {
            format!("环境变量 {name}={value} 会覆盖所有配置文件中的 {key}，需要在 shell 配置中移除")
        })
        .collect();

    match (user, global) {
        (Some(user), Some(global)) if same_config_value(user, global) => {
            diagnostics.push(format!("global 配置中的 {key} 与 user 配置相同，可以删除"));
        }
        (Some(user), Some(global)) => {
            diagnostics.push(format!(
                "global 配置中的 {key}={global} 与 user 配置 {user} 不一致，建议删除 global 配置"
            ));
        }
        (None, Some(global)) => {
            diagnostics.push(format!(
                "{key} 只在 global 配置中设置为 {global}，建议改为 user 配置"
            ));
        }
        _ => {}
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::models::TieredKey;
    use crate::services::tool::testing::{failed, FakeRunner};
    use crate::services::tool::NPM_TIERS;
    use serial_test::serial;

    static TEST_TIERS: TieredConfigProfile = TieredConfigProfile {
        binary: "npm",
        get_args: &["config", "get"],
        set_args: &["config", "set"],
        delete_args: &["config", "delete"],
        user_scope: "--location=user",
        global_scope: "--location=global",
        env_prefix: "npm_config_",
        keys: &[TieredKey {
            name: "registry",
            defaults: &["https://default.example/"],
        }],
    };

    fn settings() -> PrecedenceSettings {
        PrecedenceSettings {
            pin_settle_delay: Duration::ZERO,
            ..PrecedenceSettings::default()
        }
    }

    fn resolver(runner: &Arc<FakeRunner>, env: Vec<(&'static str, &'static str)>) -> PrecedenceResolver {
        let env: Vec<(String, String)> = env
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PrecedenceResolver::new("npm", &TEST_TIERS, runner.clone(), settings())
            .with_env_scanner(Arc::new(move || env.clone()))
    }

    fn npm() -> Arc<FakeRunner> {
        Arc::new(FakeRunner::new().with_tool("npm", "10.2.0"))
    }

    #[tokio::test]
    async fn test_user_only_is_not_an_override() {
        let runner = npm();
        runner.set_value("npm", "user", "registry", "https://custom.example/");

        let snapshot = resolver(&runner, vec![]).snapshot("registry").await.unwrap();

        assert_eq!(snapshot.effective.as_deref(), Some("https://custom.example/"));
        assert_eq!(snapshot.user.as_deref(), Some("https://custom.example/"));
        assert_eq!(snapshot.global, None);
        assert!(!snapshot.has_global_override);
        assert_eq!(snapshot.source, ConfigTier::User);
        assert!(snapshot.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_global_default_is_not_an_override() {
        let runner = npm();
        runner.set_value("npm", "global", "registry", "https://default.example/");

        let snapshot = resolver(&runner, vec![]).snapshot("registry").await.unwrap();

        assert_eq!(snapshot.global, None);
        assert!(!snapshot.has_global_override);
        assert_eq!(snapshot.source, ConfigTier::Default);
    }

    #[tokio::test]
    async fn test_global_differing_from_empty_user_is_an_override() {
        let runner = npm();
        runner.set_value("npm", "user", "registry", "");
        runner.set_value("npm", "global", "registry", "https://custom.example/");

        let snapshot = resolver(&runner, vec![]).snapshot("registry").await.unwrap();

        assert_eq!(snapshot.user, None);
        assert_eq!(snapshot.global.as_deref(), Some("https://custom.example/"));
        assert!(snapshot.has_global_override);
        assert_eq!(snapshot.source, ConfigTier::Global);
        assert_eq!(snapshot.diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_global_equal_to_user_is_redundant() {
        let runner = npm();
        runner.set_value("npm", "user", "registry", "https://custom.example/");
        runner.set_value("npm", "global", "registry", "https://custom.example");

        let snapshot = resolver(&runner, vec![]).snapshot("registry").await.unwrap();

        assert!(!snapshot.has_global_override);
        assert!(snapshot.diagnostics[0].contains("相同"));
    }

    #[tokio::test]
    async fn test_env_var_shadows_files() {
        let runner = npm();
        runner.set_value("npm", "user", "registry", "https://custom.example/");

        let snapshot = resolver(
            &runner,
            vec![
                ("NPM_CONFIG_REGISTRY", "https://env.example/"),
                ("npm_config_proxy", "http://unrelated:1"),
                ("PATH", "/usr/bin"),
            ],
        )
        .snapshot("registry")
        .await
        .unwrap();

        assert_eq!(snapshot.source, ConfigTier::Environment);
        assert_eq!(snapshot.env_vars.len(), 1);
        assert_eq!(
            snapshot.env_vars.get("NPM_CONFIG_REGISTRY").map(String::as_str),
            Some("https://env.example/")
        );
        assert!(snapshot.diagnostics[0].contains("NPM_CONFIG_REGISTRY"));

        // 每个查询子进程都移除了所有 npm_config_* 变量
        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        for call in calls {
            let overlay = call.options.env.expect("overlay");
            assert!(overlay.unset_keys().contains(&"NPM_CONFIG_REGISTRY".to_string()));
            assert!(overlay.unset_keys().contains(&"npm_config_proxy".to_string()));
            assert!(!overlay.unset_keys().contains(&"PATH".to_string()));
        }
    }

    #[tokio::test]
    async fn test_dashed_key_maps_to_underscored_env_var() {
        let runner = npm();
        let snapshot = resolver(&runner, vec![("npm_config_https_proxy", "http://env:1")])
            .snapshot("https-proxy")
            .await
            .unwrap();
        assert_eq!(snapshot.source, ConfigTier::Environment);
        assert!(snapshot.env_vars.contains_key("npm_config_https_proxy"));
    }

    #[tokio::test]
    #[serial]
    async fn test_process_env_is_scanned_by_default() {
        std::env::set_var("npm_config_cache", "/tmp/devkit-npm-cache");
        let runner = npm();
        let resolver = PrecedenceResolver::new("npm", &NPM_TIERS, runner.clone(), settings());

        let snapshot = resolver.snapshot("cache").await.unwrap();
        std::env::remove_var("npm_config_cache");

        assert_eq!(snapshot.source, ConfigTier::Environment);
        assert_eq!(
            snapshot.env_vars.get("npm_config_cache").map(String::as_str),
            Some("/tmp/devkit-npm-cache")
        );
    }

    #[tokio::test]
    async fn test_failed_query_is_absent() {
        let runner = npm();
        runner.script(
            "npm config get registry --location=global",
            failed("npm config get registry --location=global", 1, "EPERM"),
        );
        runner.set_value("npm", "global", "registry", "https://custom.example/");

        let snapshot = resolver(&runner, vec![]).snapshot("registry").await.unwrap();
        assert_eq!(snapshot.global, None);
        assert!(!snapshot.has_global_override);
    }

    #[tokio::test]
    async fn test_invalid_key_is_rejected() {
        let runner = npm();
        let err = resolver(&runner, vec![])
            .snapshot("registry --location=global")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_flag_like_and_empty_keys_are_rejected() {
        let runner = npm();
        let resolver = resolver(&runner, vec![]);
        for key in ["", "--location=global", "-g", "cache\tdir"] {
            let err = resolver.snapshot(key).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "{key:?}");
        }
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_scoped_registry_key_is_queried() {
        let runner = npm();
        runner.set_value("npm", "user", "@myorg:registry", "https://npm.myorg.example/");

        let snapshot = resolver(&runner, vec![])
            .snapshot("@myorg:registry")
            .await
            .unwrap();

        assert_eq!(snapshot.key, "@myorg:registry");
        assert_eq!(snapshot.effective.as_deref(), Some("https://npm.myorg.example/"));
        assert_eq!(snapshot.user.as_deref(), Some("https://npm.myorg.example/"));
        assert_eq!(snapshot.source, ConfigTier::User);
        assert!(runner
            .commands()
            .contains(&"npm config get @myorg:registry --location=user".to_string()));
    }

    #[tokio::test]
    async fn test_auth_token_key_reports_global_override() {
        let runner = npm();
        let key = "//registry.npmjs.org/:_authToken";
        runner.set_value("npm", "global", key, "npm_globaltoken");

        let snapshot = resolver(&runner, vec![]).snapshot(key).await.unwrap();

        assert_eq!(snapshot.global.as_deref(), Some("npm_globaltoken"));
        assert!(snapshot.has_global_override);
        assert_eq!(snapshot.source, ConfigTier::Global);
    }

    #[tokio::test]
    async fn test_for_tool_requires_tiers() {
        let runner: Arc<dyn CommandRunner> = npm();
        let git = crate::services::tool::find_tool("git").unwrap();
        assert!(matches!(
            PrecedenceResolver::for_tool(git, runner.clone(), settings()),
            Err(AppError::NotSupported { .. })
        ));
        let npm = crate::services::tool::find_tool("npm").unwrap();
        assert!(PrecedenceResolver::for_tool(npm, runner, settings()).is_ok());
    }

    #[tokio::test]
    async fn test_pin_user_value_moves_value_out_of_global() {
        let runner = npm();
        runner.set_value("npm", "global", "registry", "https://old.example/");

        let result = resolver(&runner, vec![])
            .pin_user_value("registry", "https://registry.npmmirror.com/")
            .await;

        assert!(result.success, "{}", result.message);
        assert_eq!(runner.value("npm", "global", "registry"), None);
        assert_eq!(
            runner.value("npm", "user", "registry").as_deref(),
            Some("https://registry.npmmirror.com/")
        );
        assert_eq!(
            runner.commands()[..2],
            [
                "npm config delete registry --location=global".to_string(),
                "npm config set registry https://registry.npmmirror.com/ --location=user".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_pin_user_value_reports_env_shadowing_on_failure() {
        let runner = npm();
        runner.ignore_writes("npm", "registry");

        let result = resolver(&runner, vec![("npm_config_registry", "https://env.example/")])
            .pin_user_value("registry", "https://registry.npmmirror.com")
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::VerificationFailed));
        assert!(result.message.contains("npm_config_registry"));
    }

    #[tokio::test]
    async fn test_pin_user_value_warns_about_env_on_success() {
        let runner = npm();
        let result = resolver(&runner, vec![("npm_config_registry", "https://env.example/")])
            .pin_user_value("registry", "https://registry.npmmirror.com")
            .await;
        assert!(result.success);
        assert!(result.message.contains("npm_config_registry"));
    }

    #[tokio::test]
    async fn test_clear_global_tier_reports_each_key() {
        let runner = npm();
        runner.set_value("npm", "global", "proxy", "http://corp:3128");
        runner.set_value("npm", "user", "proxy", "http://mine:1");
        runner.script(
            "npm config delete cafile --location=global",
            failed("npm config delete cafile --location=global", 1, "EACCES"),
        );

        let batch = resolver(&runner, vec![]).clear_global_tier(&[]).await;

        assert_eq!(batch.total_tools, GLOBAL_CLEANUP_KEYS.len());
        assert_eq!(batch.failure_count, 1);
        assert!(!batch.results[5].success);
        assert!(batch.results[5].message.contains("EACCES"));
        assert_eq!(runner.value("npm", "global", "proxy"), None);
        assert_eq!(runner.value("npm", "user", "proxy").as_deref(), Some("http://mine:1"));
    }

    #[tokio::test]
    async fn test_diagnose_collects_standard_keys() {
        let runner = npm();
        runner.set_value("npm", "global", "prefix", "/usr/local");
        let resolver = PrecedenceResolver::new("npm", &NPM_TIERS, runner.clone(), settings())
            .with_env_scanner(Arc::new(|| {
                vec![("npm_config_loglevel".to_string(), "silent".to_string())]
            }));

        let report = resolver.diagnose().await;

        assert_eq!(report.version.as_deref(), Some("10.2.0"));
        let keys: Vec<_> = report.snapshots.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["registry", "proxy", "https-proxy", "cache", "prefix"]);
        assert!(report.has_global_config);
        assert!(report.env_vars.contains_key("npm_config_loglevel"));
    }

    #[tokio::test]
    async fn test_ping_registry() {
        let runner = npm();
        let resolver = resolver(&runner, vec![]);

        let ping = resolver.ping_registry("https://registry.npmmirror.com").await;
        assert!(ping.success);
        assert_eq!(ping.message, "PONG");
        assert_eq!(
            runner.commands(),
            vec!["npm ping --registry=https://registry.npmmirror.com"]
        );

        let ping = resolver.ping_registry("  ").await;
        assert!(!ping.success);
    }
}
