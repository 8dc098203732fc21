//! 分层配置（环境变量 > user > global > 默认值）相关模型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 分层配置中的一个已知键
#[derive(Debug, Clone, Copy)]
pub struct TieredKey {
    pub name: &'static str,
    /// 工具自带的默认值，global 层出现这些值不算覆盖
    pub defaults: &'static [&'static str],
}

/// 支持分层查询的工具配置描述
///
/// 查询命令形如 `<binary> <get_args..> <key> <scope_flag>`。
#[derive(Debug, Clone, Copy)]
pub struct TieredConfigProfile {
    pub binary: &'static str,
    pub get_args: &'static [&'static str],
    pub set_args: &'static [&'static str],
    pub delete_args: &'static [&'static str],
    pub user_scope: &'static str,
    pub global_scope: &'static str,
    /// 会覆盖所有文件配置的环境变量前缀（不区分大小写）
    pub env_prefix: &'static str,
    /// 诊断时默认检查的键
    pub keys: &'static [TieredKey],
}

impl TieredConfigProfile {
    /// 查找键的默认值集合，未知键返回空集合
    pub fn defaults_for(&self, key: &str) -> &'static [&'static str] {
        self.keys
            .iter()
            .find(|k| k.name == key)
            .map(|k| k.defaults)
            .unwrap_or(&[])
    }

    /// 键对应的环境变量名（小写形式），如 `https-proxy` → `npm_config_https_proxy`
    pub fn env_var_name(&self, key: &str) -> String {
        format!("{}{}", self.env_prefix, key.replace('-', "_")).to_lowercase()
    }
}

/// 当前生效值的来源层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigTier {
    Environment,
    User,
    Global,
    Default,
}

/// 单个配置键的分层快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecedenceSnapshot {
    pub tool_id: String,
    pub key: String,
    pub effective: Option<String>,
    pub user: Option<String>,
    /// 未设置或等于工具默认值时为空
    pub global: Option<String>,
    pub has_global_override: bool,
    /// 检测到的环境变量（原始名称 → 原始值）
    pub env_vars: BTreeMap<String, String>,
    pub source: ConfigTier,
    pub diagnostics: Vec<String>,
}

/// 工具整体诊断报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecedenceReport {
    pub tool_id: String,
    pub version: Option<String>,
    /// `<binary> config list` 的原始输出
    pub config_list: Option<String>,
    /// 所有以前缀开头的环境变量
    pub env_vars: BTreeMap<String, String>,
    pub has_global_config: bool,
    pub snapshots: Vec<PrecedenceSnapshot>,
}

/// 镜像源连通性测试结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryPing {
    pub registry: String,
    pub success: bool,
    pub duration_ms: u64,
    pub message: String,
}
