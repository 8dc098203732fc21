// 引擎配置结构，放在 models 以便在库和二进制之间共享
use serde::{Deserialize, Serialize};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// 解析字符串为日志级别（不区分大小写）
    pub fn parse(level_str: &str) -> Option<Self> {
        match level_str.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub output: LogOutput,
    /// 日志目录（为空时使用 ~/.devkit/logs）
    #[serde(default)]
    pub file_path: Option<String>,
}

/// 引擎全局配置（~/.devkit/config.json）
///
/// 所有字段都有默认值，配置文件缺失或字段缺失时使用默认值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 变更类命令（set/delete）的默认超时
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// 检测类命令（--version / config get）的超时
    #[serde(default = "default_detection_timeout_ms")]
    pub detection_timeout_ms: u64,
    /// 变更命令执行后到回读验证之间的等待时间
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// 检测缓存有效期
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// 代理连通性测试的目标地址
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default)]
    pub log_config: LogConfig,
}

fn default_command_timeout_ms() -> u64 {
    10_000
}

fn default_detection_timeout_ms() -> u64 {
    5_000
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_cache_ttl_ms() -> u64 {
    5_000
}

fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: default_command_timeout_ms(),
            detection_timeout_ms: default_detection_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            probe_url: default_probe_url(),
            probe_timeout_ms: default_probe_timeout_ms(),
            log_config: LogConfig::default(),
        }
    }
}
