//! HTTP client for the upstream event service
//!
//! Thin wrapper over a pooled `reqwest` client bound to the single configured
//! base URL. All failures are mapped into the crate error taxonomy here:
//! network-level problems become [`Error::Transport`], non-2xx responses
//! become [`Error::UpstreamStatus`]. Response bodies are decoded as JSON.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::UpstreamConfig;
use crate::{Error, Result};

/// Client for the upstream event service
#[derive(Clone)]
pub struct UpstreamClient {
    /// HTTP client (reused; connection pooling is reqwest's concern)
    client: Client,
    /// Base URL of the upstream service
    base_url: Url,
}

impl UpstreamClient {
    /// Create a new upstream client
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid upstream base URL: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// GET a relative path and decode the JSON body
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.join(path)?;
        debug!(%url, "GET upstream");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Self::decode(path, response).await
    }

    /// POST a JSON body to a relative path and decode the JSON response
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.join(path)?;
        debug!(%url, "POST upstream");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Self::decode(path, response).await
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Internal(format!("Invalid upstream path {path}: {e}")))
    }

    async fn decode(path: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Invalid JSON from upstream: {e}")))
    }
}
