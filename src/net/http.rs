//! HTTP network backend built on ureq
//!
//! ureq is blocking, so every request runs on tokio's blocking pool.

use crate::config::schema::NetworkConfig;
use crate::error::{SwCacheError, SwCacheResult};
use crate::net::fetcher::Network;
use crate::net::message::{CacheMode, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

const BYTES_PER_MB: u64 = 1024 * 1024;
const USER_AGENT: &str = concat!("swcache/", env!("CARGO_PKG_VERSION"));

/// Network backend that talks to a real origin
#[derive(Clone)]
pub struct HttpNetwork {
    agent: Agent,
    max_body_bytes: u64,
}

impl HttpNetwork {
    /// Create a backend from network settings
    pub fn new(config: &NetworkConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            max_body_bytes: u64::from(config.max_body_mb) * BYTES_PER_MB,
        }
    }

    fn fetch_blocking(&self, request: &Request, cache: CacheMode) -> SwCacheResult<Response> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str())
            .header("User-Agent", USER_AGENT);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match cache {
            CacheMode::Default => {}
            CacheMode::NoStore => {
                builder = builder
                    .header("Cache-Control", "no-store")
                    .header("Pragma", "no-cache");
            }
        }

        // Body-less methods must not carry even an empty payload
        let sent = if request.body.is_empty() {
            builder
                .body(())
                .map(|req| self.agent.run(req))
        } else {
            builder
                .body(request.body.clone())
                .map(|req| self.agent.run(req))
        };
        let mut response = sent
            .map_err(|e| SwCacheError::network(&request.url, e))?
            .map_err(|e| SwCacheError::network(&request.url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| SwCacheError::network(&request.url, e))?;

        debug!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );

        Ok(Response {
            url: request.url.clone(),
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request, cache: CacheMode) -> SwCacheResult<Response> {
        let this = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || this.fetch_blocking(&request, cache))
            .await
            .map_err(|e| SwCacheError::Internal(format!("fetch task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
