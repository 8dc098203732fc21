use crate::core::error::{AppError, AppResult};
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("devkit/", env!("CARGO_PKG_VERSION"));

/// 构建 HTTP 客户端
///
/// - `proxy_url`: 为空时直连，否则所有请求（http/https）都经过该代理
/// - `timeout`: 整个请求的超时
pub fn build_http_client(proxy_url: Option<&str>, timeout: Duration) -> AppResult<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10));

    match proxy_url {
        Some(url) => {
            let proxy = reqwest::Proxy::all(url)
                .map_err(|e| AppError::InvalidInput(format!("代理 URL 无效: {e}")))?;
            builder = builder.proxy(proxy);
        }
        // 直连时忽略 HTTP_PROXY 等环境变量，避免测量到系统代理
        None => builder = builder.no_proxy(),
    }

    builder.build().map_err(|e| AppError::Http(e.to_string()))
}
