use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::precedence::TieredConfigProfile;

/// 命令模板：argv 形式，`argv[0]` 为可执行文件名
pub type CommandTemplate = &'static [&'static str];

/// 代理地址占位符
pub const PROXY_PLACEHOLDER: &str = "{proxy}";
/// 镜像源占位符
pub const REGISTRY_PLACEHOLDER: &str = "{registry}";
/// 缓存目录占位符
pub const CACHE_DIR_PLACEHOLDER: &str = "{cache_dir}";

/// 被视为"未设置"的配置值（比较前会 trim + 小写）
pub const IGNORED_VALUES: &[&str] = &["null", "undefined", "none", "noproxy"];

/// 过滤无效的配置值
///
/// 空串与 `IGNORED_VALUES` 中的占位值返回 `None`，其余返回 trim 后的原值。
pub fn filter_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if IGNORED_VALUES.contains(&lowered.as_str()) {
        return None;
    }
    Some(trimmed.to_string())
}

/// 将模板中与占位符完全相等的片段替换为实际值
pub fn render_template(template: CommandTemplate, placeholder: &str, value: &str) -> Vec<String> {
    template
        .iter()
        .map(|part| {
            if *part == placeholder {
                value.to_string()
            } else {
                (*part).to_string()
            }
        })
        .collect()
}

/// 模板转为 argv（无占位符替换）
pub fn template_argv(template: CommandTemplate) -> Vec<String> {
    template.iter().map(|part| (*part).to_string()).collect()
}

/// 比较两个配置值（忽略首尾空白与末尾的 `/`）
pub fn same_config_value(left: &str, right: &str) -> bool {
    left.trim().trim_end_matches('/') == right.trim().trim_end_matches('/')
}

/// 工具分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    PackageManager,
    DevTool,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::PackageManager => "package_manager",
            ToolCategory::DevTool => "dev_tool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "package_manager" => Some(ToolCategory::PackageManager),
            "dev_tool" => Some(ToolCategory::DevTool),
            _ => None,
        }
    }
}

/// 镜像源定义（静态表）
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Mirror {
    pub name: &'static str,
    pub display_name: &'static str,
    pub url: &'static str,
    /// 镜像站位置，如 "中国·北京"
    pub location: &'static str,
    pub homepage: Option<&'static str>,
}

/// 工具静态定义
///
/// 进程启动时由固定表构建，之后不再修改；`id` 在表内唯一。
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    pub category: ToolCategory,
    pub description: &'static str,
    /// 安装检测命令（如 `npm --version`）
    pub check_cmd: CommandTemplate,
    /// 按顺序执行的启用代理命令，包含 `{proxy}` 占位符
    pub enable_cmds: &'static [CommandTemplate],
    pub disable_cmds: &'static [CommandTemplate],
    pub get_proxy_cmd: Option<CommandTemplate>,
    pub get_registry_cmd: Option<CommandTemplate>,
    pub set_registry_cmd: Option<CommandTemplate>,
    pub get_cache_dir_cmd: Option<CommandTemplate>,
    pub set_cache_dir_cmd: Option<CommandTemplate>,
    /// 查询缓存实际路径（`yarn cache dir` 等），与配置项 `get_cache_dir_cmd` 可能不同
    pub cache_path_cmd: Option<CommandTemplate>,
    /// 按顺序执行的缓存清理命令
    pub clean_cache_cmds: &'static [CommandTemplate],
    pub mirrors: &'static [Mirror],
    /// 该工具的配置子命令用来表示"键不存在"的退出码
    ///
    /// 例如 `git config --get` 返回 1，`git config --unset` 返回 5。
    pub benign_exit_codes: &'static [i32],
    /// 分层配置（仅 npm）
    #[serde(skip)]
    pub tiers: Option<&'static TieredConfigProfile>,
}

impl ToolDescriptor {
    pub fn supports_proxy(&self) -> bool {
        !self.enable_cmds.is_empty()
    }

    pub fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities {
            proxy: self.supports_proxy(),
            registry: self.set_registry_cmd.is_some(),
            cache_dir: self.set_cache_dir_cmd.is_some(),
            clean_cache: !self.clean_cache_cmds.is_empty(),
            precedence: self.tiers.is_some(),
        }
    }

    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            id: self.id.to_string(),
            display_name: self.display_name.to_string(),
            category: self.category,
            description: self.description.to_string(),
            capabilities: self.capabilities(),
            mirrors: self.mirrors.iter().map(MirrorInfo::from).collect(),
        }
    }
}

/// 工具能力标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ToolCapabilities {
    pub proxy: bool,
    pub registry: bool,
    pub cache_dir: bool,
    pub clean_cache: bool,
    pub precedence: bool,
}

/// 镜像源（可序列化副本）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorInfo {
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl From<&Mirror> for MirrorInfo {
    fn from(mirror: &Mirror) -> Self {
        Self {
            name: mirror.name.to_string(),
            display_name: mirror.display_name.to_string(),
            url: mirror.url.to_string(),
            location: mirror.location.to_string(),
            homepage: mirror.homepage.map(str::to_string),
        }
    }
}

/// 工具列表项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSummary {
    pub id: String,
    pub display_name: String,
    pub category: ToolCategory,
    pub description: String,
    pub capabilities: ToolCapabilities,
    pub mirrors: Vec<MirrorInfo>,
}

/// 缓存目录占用信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub tool_id: String,
    pub cache_path: String,
    /// 目录不存在时为 0
    pub size_bytes: u64,
    pub size_formatted: String,
}

/// 工具安装状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Installed,
    NotInstalled,
    Error,
}

/// 工具状态快照
///
/// 每次检测整体重建，不会被局部更新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub id: String,
    pub display_name: String,
    pub category: ToolCategory,
    pub status: ToolStatus,
    pub installed: bool,
    pub version: Option<String>,
    pub proxy_enabled: bool,
    pub current_proxy: Option<String>,
    pub registry_url: Option<String>,
    pub cache_dir: Option<String>,
    pub mirrors: Vec<MirrorInfo>,
    pub capabilities: ToolCapabilities,
    pub error: Option<String>,
    /// 检测时间（Unix 时间戳，秒）
    pub detected_at: i64,
}

impl ToolInfo {
    /// 未安装工具的快照：依赖安装的字段全部为空
    pub fn not_installed(descriptor: &ToolDescriptor) -> Self {
        Self {
            id: descriptor.id.to_string(),
            display_name: descriptor.display_name.to_string(),
            category: descriptor.category,
            status: ToolStatus::NotInstalled,
            installed: false,
            version: None,
            proxy_enabled: false,
            current_proxy: None,
            registry_url: None,
            cache_dir: None,
            mirrors: descriptor.mirrors.iter().map(MirrorInfo::from).collect(),
            capabilities: descriptor.capabilities(),
            error: None,
            detected_at: Utc::now().timestamp(),
        }
    }
}
