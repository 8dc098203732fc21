//! 代理地址数据模型

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::error::{AppError, AppResult};

/// 结构化的代理地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    /// "http" / "https" / "socks5"
    pub scheme: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProxyEndpoint {
    /// 从 URL 字符串解析，缺省端口取 scheme 的默认端口
    pub fn parse(proxy_url: &str) -> AppResult<Self> {
        let url = Url::parse(proxy_url.trim())
            .map_err(|e| AppError::InvalidInput(format!("代理 URL 无效: {e}")))?;

        let scheme = match url.scheme() {
            "http" | "https" | "socks5" | "socks5h" => url.scheme().to_string(),
            other => {
                return Err(AppError::InvalidInput(format!(
                    "不支持的代理协议: {other}"
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::InvalidInput("代理 URL 缺少主机名".to_string()))?
            .to_string();

        let port = url.port_or_known_default().unwrap_or(match scheme.as_str() {
            "socks5" | "socks5h" => 1080,
            _ => 80,
        });

        let username = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let password = url.password().map(str::to_string);

        Ok(Self {
            scheme,
            host,
            port,
            username,
            password,
        })
    }

    /// 构建完整代理 URL
    pub fn to_url(&self) -> String {
        format!("{}://{}{}:{}", self.scheme, self.auth_part(), self.host, self.port)
    }

    /// 隐去凭据的 URL，用于日志输出
    pub fn redacted(&self) -> String {
        let auth = if self.username.is_some() {
            "***:***@"
        } else {
            ""
        };
        format!("{}://{}{}:{}", self.scheme, auth, self.host, self.port)
    }

    fn auth_part(&self) -> String {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                format!("{username}:{password}@")
            }
            (Some(username), _) if !username.is_empty() => format!("{username}@"),
            _ => String::new(),
        }
    }
}

/// 隐去任意代理字符串中的凭据；无法解析时原样返回
pub fn redact_proxy_url(proxy_url: &str) -> String {
    ProxyEndpoint::parse(proxy_url)
        .map(|endpoint| endpoint.redacted())
        .unwrap_or_else(|_| proxy_url.to_string())
}

/// 代理连通性测试结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyTestResult {
    pub success: bool,
    pub status: u16,
    pub url: Option<String>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}
