// 工具查询与配置命令

use std::path::Path;

use futures_util::future::join_all;

use super::state::AppState;
use crate::models::{
    CacheInfo, RegistryPing, ToolCategory, ToolInfo, ToolOperationResult, ToolSummary,
};
use crate::services::tool::ToolAdapter;
use crate::utils::ensure_dir;

/// 分层配置中缓存目录对应的键
const TIERED_CACHE_KEY: &str = "cache";

/// 列出所有内置工具（声明顺序）
pub fn list_tools(state: &AppState) -> Vec<ToolSummary> {
    state.registry.summaries()
}

/// 获取单个工具的完整状态
pub async fn get_tool_info(state: &AppState, tool_id: &str) -> Result<ToolInfo, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    Ok(adapter.get_info().await)
}

/// 并发获取多个工具的状态
///
/// 结果顺序与输入一致，未知 ID 直接跳过。
pub async fn get_tools_info(state: &AppState, tool_ids: &[String]) -> Vec<ToolInfo> {
    let adapters: Vec<_> = if tool_ids.is_empty() {
        state.registry.all()
    } else {
        tool_ids
            .iter()
            .filter_map(|id| {
                let adapter = state.registry.get(id);
                if adapter.is_none() {
                    tracing::warn!(tool_id = %id, "未知的工具 ID，已跳过");
                }
                adapter
            })
            .collect()
    };

    join_all(adapters.iter().map(|adapter| adapter.get_info())).await
}

pub async fn is_installed(state: &AppState, tool_id: &str) -> Result<bool, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    Ok(adapter.is_installed().await)
}

pub async fn get_version(state: &AppState, tool_id: &str) -> Result<Option<String>, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    Ok(adapter.get_version().await)
}

/// 所有出现过的工具分类
pub fn get_categories(state: &AppState) -> Vec<ToolCategory> {
    state.registry.categories()
}

/// 按分类列出工具，分类名如 `package_manager`
pub fn get_tools_by_category(state: &AppState, category: &str) -> Result<Vec<ToolSummary>, String> {
    let category =
        ToolCategory::parse(category).ok_or_else(|| format!("未知的工具分类: {category}"))?;
    Ok(state
        .registry
        .by_category(category)
        .iter()
        .map(|adapter| adapter.descriptor().summary())
        .collect())
}

/// 设置镜像源
pub async fn set_registry(
    state: &AppState,
    tool_id: &str,
    registry_url: &str,
) -> Result<ToolOperationResult, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    Ok(adapter.set_registry(registry_url).await)
}

/// 设置缓存目录
///
/// 目录不存在时先创建。声明了分层配置的工具（npm）写入 user 层并移除 global 层的同名键，
/// 其余工具走适配器的 set 模板。
pub async fn set_cache_dir(
    state: &AppState,
    tool_id: &str,
    cache_dir: &str,
) -> Result<ToolOperationResult, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    if adapter.descriptor().tiers.is_none() {
        return Ok(adapter.set_cache_dir(cache_dir).await);
    }

    let resolver = state.resolver(tool_id)?;
    let cache_dir = cache_dir.trim();
    if !cache_dir.is_empty() {
        if let Err(error) = ensure_dir(Path::new(cache_dir)).await {
            tracing::warn!(tool_id = %tool_id, error = %error, "创建缓存目录失败");
            return Ok(ToolOperationResult::failure(tool_id, &error));
        }
    }
    let result = resolver.pin_user_value(TIERED_CACHE_KEY, cache_dir).await;
    adapter.cache().clear();
    Ok(result)
}

/// 清理工具缓存
pub async fn clean_cache(state: &AppState, tool_id: &str) -> Result<ToolOperationResult, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    Ok(adapter.clean_cache().await)
}

/// 缓存路径和占用空间
pub async fn get_cache_info(state: &AppState, tool_id: &str) -> Result<CacheInfo, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    adapter.get_cache_info().await.map_err(|e| e.to_string())
}

/// 镜像源测速，未指定地址时使用工具当前配置的镜像源
pub async fn test_registry(
    state: &AppState,
    tool_id: &str,
    registry_url: Option<&str>,
) -> Result<RegistryPing, String> {
    let adapter = state.registry.require(tool_id).map_err(|e| e.to_string())?;
    let registry_url = match registry_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => url.to_string(),
        None => adapter
            .get_current_registry()
            .await
            .ok_or_else(|| format!("{tool_id} 未配置镜像源"))?,
    };
    Ok(state.orchestrator.time_registry(&registry_url).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::models::{EngineConfig, ToolStatus};
    use crate::services::proxy::probe::tests::spawn_fake_proxy;
    use crate::services::tool::testing::FakeRunner;
    use serial_test::serial;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn state(runner: &Arc<FakeRunner>) -> AppState {
        let config = EngineConfig {
            settle_delay_ms: 0,
            ..EngineConfig::default()
        };
        AppState::with_runner(config, runner.clone())
    }

    #[tokio::test]
    async fn test_get_tools_info_keeps_input_order() {
        let runner = Arc::new(
            FakeRunner::new()
                .with_tool("git", "git version 2.43.0")
                .with_tool("npm", "10.2.0"),
        );
        let state = state(&runner);
        let ids: Vec<String> = ["wget", "git", "nope", "npm"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let infos = get_tools_info(&state, &ids).await;

        let got: Vec<_> = infos.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(got, vec!["wget", "git", "npm"]);
        assert_eq!(infos[0].status, ToolStatus::NotInstalled);
        assert!(infos[1].installed);
        assert_eq!(infos[2].version.as_deref(), Some("10.2.0"));
    }

    #[tokio::test]
    async fn test_empty_ids_means_all_tools() {
        let runner = Arc::new(FakeRunner::new());
        let state = state(&runner);
        let infos = get_tools_info(&state, &[]).await;
        assert_eq!(infos.len(), list_tools(&state).len());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let runner = Arc::new(FakeRunner::new());
        let state = state(&runner);

        let err = get_tool_info(&state, "cargo").await.unwrap_err();
        assert!(err.contains("cargo"));
        assert!(is_installed(&state, "cargo").await.is_err());
        assert!(get_version(&state, "cargo").await.is_err());
        assert!(set_registry(&state, "cargo", "https://x/").await.is_err());
    }

    #[tokio::test]
    async fn test_version_and_install_state() {
        let runner = Arc::new(FakeRunner::new().with_tool("pip", "pip 24.0 from /usr/lib"));
        let state = state(&runner);

        assert!(is_installed(&state, "pip").await.unwrap());
        assert!(!is_installed(&state, "bun").await.unwrap());
        assert_eq!(
            get_version(&state, "pip").await.unwrap().as_deref(),
            Some("pip 24.0 from /usr/lib")
        );
    }

    #[test]
    fn test_categories() {
        let runner = Arc::new(FakeRunner::new());
        let state = state(&runner);

        assert_eq!(
            get_categories(&state),
            vec![ToolCategory::PackageManager, ToolCategory::DevTool]
        );
        let dev_tools = get_tools_by_category(&state, "dev_tool").unwrap();
        assert!(dev_tools.iter().any(|t| t.id == "git"));
        assert!(dev_tools.iter().all(|t| t.category == ToolCategory::DevTool));
        assert!(get_tools_by_category(&state, "editor").is_err());
    }

    #[tokio::test]
    async fn test_set_registry_through_command() {
        let runner = Arc::new(FakeRunner::new().with_tool("pnpm", "8.15.0"));
        let state = state(&runner);

        let result = set_registry(&state, "pnpm", "https://registry.npmmirror.com/")
            .await
            .unwrap();
        assert!(result.success, "{}", result.message);
        assert_eq!(
            runner.value("pnpm", "user", "registry").as_deref(),
            Some("https://registry.npmmirror.com/")
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_npm_cache_dir_is_created_and_pinned_to_user_tier() {
        let runner = Arc::new(FakeRunner::new().with_tool("npm", "10.2.0"));
        runner.set_value("npm", "global", "cache", "/opt/shared-npm-cache");
        let state = state(&runner);
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("npm-cache").display().to_string();

        let result = set_cache_dir(&state, "npm", &cache_dir).await.unwrap();

        assert!(result.success, "{}", result.message);
        assert!(dir.path().join("npm-cache").is_dir());
        assert_eq!(runner.value("npm", "global", "cache"), None);
        assert_eq!(
            runner.value("npm", "user", "cache").as_deref(),
            Some(cache_dir.as_str())
        );
        let commands = runner.commands();
        let delete = commands
            .iter()
            .position(|c| c == "npm config delete cache --location=global")
            .unwrap();
        let set = commands
            .iter()
            .position(|c| c.starts_with("npm config set cache "))
            .unwrap();
        assert!(delete < set);
    }

    #[tokio::test]
    async fn test_other_tools_set_cache_dir_through_template() {
        let runner = Arc::new(FakeRunner::new().with_tool("yarn", "1.22.19"));
        let state = state(&runner);
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("yarn").display().to_string();

        let result = set_cache_dir(&state, "yarn", &cache_dir).await.unwrap();

        assert!(result.success, "{}", result.message);
        assert!(dir.path().join("yarn").is_dir());
        assert_eq!(
            runner.value("yarn", "user", "cache-folder").as_deref(),
            Some(cache_dir.as_str())
        );
    }

    #[tokio::test]
    async fn test_clean_cache_and_cache_info_commands() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index"), vec![0u8; 10]).unwrap();
        let runner = Arc::new(FakeRunner::new().with_tool("npm", "10.2.0"));
        runner.set_value("npm", "user", "cache", &dir.path().display().to_string());
        let state = state(&runner);

        let info = get_cache_info(&state, "npm").await.unwrap();
        assert_eq!(info.size_bytes, 10);
        assert_eq!(info.size_formatted, "10 B");

        let result = clean_cache(&state, "npm").await.unwrap();
        assert!(result.success);
        assert_eq!(runner.count_of("npm cache verify"), 1);

        let result = clean_cache(&state, "wget").await.unwrap();
        assert_eq!(result.error_kind, Some(ErrorKind::NotSupported));
        assert!(clean_cache(&state, "cargo").await.is_err());
        assert!(get_cache_info(&state, "curl").await.unwrap_err().contains("curl"));
    }

    #[tokio::test]
    async fn test_registry_timing_uses_current_registry_by_default() {
        let registry = spawn_fake_proxy("200 OK").await;
        let runner = Arc::new(FakeRunner::new().with_tool("yarn", "1.22.19"));
        runner.set_value("yarn", "user", "registry", &format!("{registry}/"));
        let state = state(&runner);

        let ping = test_registry(&state, "yarn", None).await.unwrap();
        assert!(ping.success, "{}", ping.message);
        assert_eq!(ping.registry, format!("{registry}/"));

        let ping = test_registry(&state, "yarn", Some(&registry)).await.unwrap();
        assert!(ping.success);
        assert_eq!(ping.registry, registry);
    }

    #[tokio::test]
    async fn test_registry_timing_without_configured_registry() {
        let runner = Arc::new(FakeRunner::new().with_tool("pnpm", "8.15.0"));
        let state = state(&runner);

        let err = test_registry(&state, "pnpm", None).await.unwrap_err();
        assert!(err.contains("pnpm"));
    }
}
