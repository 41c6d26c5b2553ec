//! Mirror (read-only) transport: REST over HTTP with JSON bodies.
//!
//! Mirror endpoints serve estimation and history reads. They participate in
//! the same node pool and retry loop as consensus nodes; only the wire
//! format differs.

use crate::channel::{Channel, WireRequest, WireResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// REST channel to one mirror endpoint.
pub struct MirrorChannel {
    base_url: String,
    http: reqwest::Client,
}

impl MirrorChannel {
    /// Create a channel rooted at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }
}

#[async_trait]
impl Channel for MirrorChannel {
    async fn call(&self, request: WireRequest) -> Result<WireResponse> {
        let path = match request {
            WireRequest::Get(path) => path,
            WireRequest::Frame(_) => {
                return Err(Error::state(
                    "mirror channel cannot serve binary frames".to_string(),
                ))
            }
        };

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status();
        debug!(%url, code = status.as_u16(), "mirror response");

        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::transport(e.to_string()))?;
            return Ok(WireResponse {
                body,
                trailers: Default::default(),
            });
        }

        let code = status.as_u16();
        if code == 429 || status.is_server_error() {
            return Err(Error::MirrorUnavailable { code });
        }
        let message = response.text().await.unwrap_or_default();
        Err(Error::MirrorRejected { code, message })
    }

    async fn ping(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
