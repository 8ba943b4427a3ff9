//! Client configuration.
//!
//! Configuration can be built explicitly or loaded from environment
//! variables with sensible defaults.

use crate::error::CoduxError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use std::time::Duration;

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost/api/v2";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service API (e.g. `http://localhost/api/v2`).
    pub base_url: String,
    /// Timeout applied to every HTTP call and to the session handshake.
    pub timeout: Duration,
    /// Headers sent with every call. Per-call headers override these.
    pub default_headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_headers: HeaderMap::new(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `CODUX_BASE_URL` | `http://localhost/api/v2` |
    /// | `CODUX_TIMEOUT_SECS` | `30` |
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            base_url: std::env::var("CODUX_BASE_URL").unwrap_or(default.base_url),
            timeout: std::env::var("CODUX_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default.timeout),
            default_headers: default.default_headers,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), CoduxError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| CoduxError::InvalidConfig(format!("invalid base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoduxError::InvalidConfig(format!(
                "base_url scheme must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(CoduxError::InvalidConfig("timeout must be > 0".into()));
        }
        Ok(())
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
    headers: Vec<(String, String)>,
}

impl ClientConfigBuilder {
    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the request timeout in whole seconds.
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    /// Add a default header. Validated by [`build`](Self::build).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Build the configuration, validating all fields.
    pub fn build(mut self) -> Result<ClientConfig, CoduxError> {
        for (name, value) in self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                CoduxError::InvalidConfig(format!("invalid header name {name:?}: {e}"))
            })?;
            let value = HeaderValue::from_str(&value).map_err(|e| {
                CoduxError::InvalidConfig(format!("invalid value for header {name}: {e}"))
            })?;
            self.config.default_headers.insert(name, value);
        }
        self.config.validate()?;
        Ok(self.config)
    }
}
