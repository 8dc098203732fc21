use crate::core::error::{AppError, AppResult};
use crate::models::EngineConfig;
use std::fs;
use std::path::PathBuf;

/// 覆盖配置目录的环境变量
pub const CONFIG_DIR_ENV: &str = "DEVKIT_CONFIG_DIR";

/// 配置目录（默认 ~/.devkit，可由 `DEVKIT_CONFIG_DIR` 覆盖），若不存在则创建
pub fn config_dir() -> AppResult<PathBuf> {
    let config_dir = match std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .ok_or_else(|| AppError::Config("无法获取用户主目录".to_string()))?
            .join(".devkit"),
    };
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir).map_err(|e| {
            AppError::Config(format!("创建配置目录 {} 失败: {e}", config_dir.display()))
        })?;
    }
    Ok(config_dir)
}

/// 引擎配置文件路径
pub fn engine_config_path() -> AppResult<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// 读取引擎配置（若文件不存在返回 Ok(None)）
pub fn read_engine_config() -> AppResult<Option<EngineConfig>> {
    let config_path = engine_config_path()?;
    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("读取 {} 失败: {e}", config_path.display()))
    })?;
    let config: EngineConfig = serde_json::from_str(&content).map_err(|e| {
        AppError::Config(format!("解析 {} 失败: {e}", config_path.display()))
    })?;
    Ok(Some(config))
}

/// 读取引擎配置，文件缺失或损坏时回退到默认值
pub fn load_engine_config() -> EngineConfig {
    match read_engine_config() {
        Ok(Some(config)) => config,
        Ok(None) => EngineConfig::default(),
        Err(e) => {
            tracing::warn!(error = %e, "读取引擎配置失败，使用默认配置");
            EngineConfig::default()
        }
    }
}

/// 写入引擎配置（Unix 下权限 0600）
pub fn write_engine_config(config: &EngineConfig) -> AppResult<()> {
    let config_path = engine_config_path()?;
    let write_error =
        |e: std::io::Error| AppError::Config(format!("写入 {} 失败: {e}", config_path.display()));

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("序列化配置失败: {e}")))?;
    fs::write(&config_path, json).map_err(write_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))
            .map_err(write_error)?;
    }

    tracing::debug!(path = %config_path.display(), "引擎配置已保存");
    Ok(())
}
