// 代理连通性探测
//
// 通过指定代理向探测地址发送一次 HEAD 请求，收到任何 HTTP 响应即视为代理可用。
// 镜像源测速同理，只是直连并请求一个常见包的元数据。

use crate::core::http::build_http_client;
use crate::models::{EngineConfig, ProxyEndpoint, ProxyTestResult, RegistryPing};
use std::time::{Duration, Instant};

/// 探测参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub url: String,
    pub timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ProbeSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            url: config.probe_url.clone(),
            timeout: Duration::from_millis(config.probe_timeout_ms),
        }
    }
}

/// 经由 `proxy_url` 访问探测地址
pub async fn probe_through_proxy(proxy_url: &str, settings: &ProbeSettings) -> ProxyTestResult {
    let started = Instant::now();
    let failure = |error: String, started: Instant| ProxyTestResult {
        success: false,
        status: 0,
        url: None,
        error: Some(error),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    let endpoint = match ProxyEndpoint::parse(proxy_url) {
        Ok(endpoint) => endpoint,
        Err(e) => return failure(e.to_string(), started),
    };
    let client = match build_http_client(Some(&endpoint.to_url()), settings.timeout) {
        Ok(client) => client,
        Err(e) => return failure(e.to_string(), started),
    };

    tracing::debug!(
        proxy = %endpoint.redacted(),
        target = %settings.url,
        timeout_ms = settings.timeout.as_millis() as u64,
        "测试代理连通性"
    );

    match client.head(&settings.url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            tracing::info!(proxy = %endpoint.redacted(), status, "代理连通性测试成功");
            ProxyTestResult {
                success: true,
                status,
                url: Some(response.url().to_string()),
                error: None,
                elapsed_ms: started.elapsed().as_millis() as u64,
            }
        }
        Err(e) => {
            tracing::warn!(proxy = %endpoint.redacted(), error = %e, "代理连通性测试失败");
            failure(e.to_string(), started)
        }
    }
}

/// 镜像源测速使用的包名
pub const REGISTRY_TEST_PACKAGE: &str = "react";

/// 直连请求 `<registry>/react` 并计时，收到任何 HTTP 响应即视为可达
pub async fn time_registry_request(registry_url: &str, timeout: Duration) -> RegistryPing {
    let started = Instant::now();
    let target = format!(
        "{}/{REGISTRY_TEST_PACKAGE}",
        registry_url.trim().trim_end_matches('/')
    );
    let failure = |message: String| RegistryPing {
        registry: registry_url.to_string(),
        success: false,
        duration_ms: started.elapsed().as_millis() as u64,
        message,
    };

    let client = match build_http_client(None, timeout) {
        Ok(client) => client,
        Err(e) => return failure(e.to_string()),
    };

    tracing::debug!(target = %target, timeout_ms = timeout.as_millis() as u64, "测试镜像源响应时间");

    match client.head(&target).send().await {
        Ok(response) => {
            let duration_ms = started.elapsed().as_millis() as u64;
            tracing::info!(
                registry = %registry_url,
                status = response.status().as_u16(),
                duration_ms,
                "镜像源测速完成"
            );
            RegistryPing {
                registry: registry_url.to_string(),
                success: true,
                duration_ms,
                message: format!("响应时间: {duration_ms}ms"),
            }
        }
        Err(e) => {
            tracing::warn!(registry = %registry_url, error = %e, "镜像源测速失败");
            failure(e.to_string())
        }
    }
}
