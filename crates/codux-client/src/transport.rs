//! HTTP transport for the execution service API.
//!
//! One call in, one JSON value (or one classified error) out. The transport
//! does not retry or cache.

use crate::classify::{classify_network, classify_status};
use crate::config::ClientConfig;
use crate::error::CoduxError;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// HTTP transport bound to one service base URL.
///
/// Holds only immutable configuration and a pooled `reqwest::Client`, so
/// clones are cheap and can be used from many tasks at once.
#[derive(Debug, Clone)]
pub struct Transport {
    base_url: String,
    default_headers: HeaderMap,
    timeout: Duration,
    http: reqwest::Client,
}

impl Transport {
    /// Create a transport from a validated configuration.
    ///
    /// Trailing slashes on the base URL are stripped here, once.
    pub fn new(config: &ClientConfig) -> Result<Self, CoduxError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoduxError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::debug!(
            base_url = %base_url,
            timeout_secs = config.timeout.as_secs(),
            default_headers = config.default_headers.len(),
            "Transport configured"
        );

        Ok(Self {
            base_url,
            default_headers: config.default_headers.clone(),
            timeout: config.timeout,
            http,
        })
    }

    /// Normalized base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL for `endpoint`, with its leading slashes stripped.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Default headers overlaid with `overlay`.
    ///
    /// Every value of an overlay header replaces all default values under the
    /// same name; defaults with other names are kept.
    pub fn merged_headers(&self, overlay: Option<&HeaderMap>) -> HeaderMap {
        let mut merged = self.default_headers.clone();
        if let Some(overlay) = overlay {
            for name in overlay.keys() {
                merged.remove(name);
            }
            for (name, value) in overlay {
                merged.append(name, value.clone());
            }
        }
        merged
    }

    /// Perform one call against `{base_url}/{endpoint}`.
    ///
    /// A 2xx response with an empty body yields an empty JSON object.
    ///
    /// # Errors
    ///
    /// Non-2xx statuses and network failures are classified per
    /// [`crate::classify`]. A 2xx body that is not JSON is a
    /// `TransportFailure`.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        headers: Option<&HeaderMap>,
        body: Option<&B>,
    ) -> Result<Value, CoduxError> {
        let url = self.url(endpoint);
        let start = Instant::now();
        tracing::debug!(method = %method, url = %url, "Sending request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(self.merged_headers(headers));
        if let Some(body) = body {
            // json() keeps a caller-supplied Content-Type
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let err = classify_network(&e);
            tracing::warn!(method = %method, url = %url, error = %e, "Request failed");
            err
        })?;

        let status = response.status();
        tracing::debug!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Response received"
        );

        if !status.is_success() {
            // The status alone is enough to classify, so a failed body read is not fatal here
            let body = response.bytes().await.unwrap_or_default();
            tracing::trace!(body = %String::from_utf8_lossy(&body), "Error response body");
            let err = classify_status(&method, endpoint, status, &body);
            tracing::warn!(method = %method, url = %url, error = %err, "Request rejected");
            return Err(err);
        }

        let body = response.bytes().await?;
        tracing::trace!(body = %String::from_utf8_lossy(&body), "Response body");

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_slice(&body).map_err(|e| CoduxError::TransportFailure {
            status: Some(status.as_u16()),
            message: format!("invalid JSON in response from {url}: {e}"),
        })
    }
}
