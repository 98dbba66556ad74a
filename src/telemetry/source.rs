//! The proxy-statistics telemetry source contract (§6): an HTTP GET
//! against the configured endpoint, returning requests/sec, response
//! time, error rate, and bytes/sec. Non-200 or unparseable bodies are a
//! phase failure, never a crate-level error.

use crate::error::{Error, Result};
use crate::types::ProxyStats;
use async_trait::async_trait;
use std::time::Duration;

/// Abstraction over "fetch proxy statistics from a URL" so the
/// collection loop can be tested without a real HTTP server.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ProxyStats>;
}

/// `reqwest`-backed implementation with the 10s request deadline the
/// specification requires for external HTTP calls (§5).
pub struct ReqwestMetricsSource {
    client: reqwest::Client,
}

impl ReqwestMetricsSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestMetricsSource {
    fn default() -> Self {
        Self::new().expect("default HTTP client configuration is always valid")
    }
}

#[async_trait]
impl MetricsSource for ReqwestMetricsSource {
    async fn fetch(&self, url: &str) -> Result<ProxyStats> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::upstream(e.to_string(), "nginx_metrics_url"))?;

        if !response.status().is_success() {
            return Err(Error::upstream(
                format!("non-200 status: {}", response.status()),
                "nginx_metrics_url",
            ));
        }

        response
            .json::<ProxyStats>()
            .await
            .map_err(|e| Error::upstream(format!("malformed body: {e}"), "nginx_metrics_url"))
    }
}
