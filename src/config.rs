//! Client configuration.
//!
//! Everything the controller and HTTP gateway need is held in one
//! [`ClientConfig`], built via [`ClientConfigBuilder`] so callers only set
//! what they care about and rely on the documented defaults for the rest.

use crate::error::TypeShiftError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default address of the conversion service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Configuration for the conversion client.
///
/// # Example
/// ```rust
/// use typeshift::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://converter.internal:8000")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.convert_url(), "http://converter.internal:8000/convert");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the conversion service. Default: `http://127.0.0.1:8000`.
    pub base_url: String,

    /// Whole-request timeout in seconds, upload and download included. Default: 120.
    ///
    /// Conversions of large PDFs run server-side before the first response
    /// byte, so this must cover the slowest expected conversion.
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Artificial latency of the simulation fallback in milliseconds. Default: 2000.
    pub simulation_delay_ms: u64,

    /// Fall back to simulation automatically when the service is unreachable.
    /// Default: false. Only consulted by front-ends; the controller itself
    /// never simulates unless asked.
    pub auto_simulate: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            simulation_delay_ms: 2000,
            auto_simulate: false,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the conversion endpoint.
    pub fn convert_url(&self) -> String {
        format!("{}/convert", self.base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn simulation_delay(&self) -> Duration {
        Duration::from_millis(self.simulation_delay_ms)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().to_string();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn simulation_delay_ms(mut self, ms: u64) -> Self {
        self.config.simulation_delay_ms = ms;
        self
    }

    pub fn auto_simulate(mut self, v: bool) -> Self {
        self.config.auto_simulate = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, TypeShiftError> {
        let c = &self.config;
        let url = reqwest::Url::parse(&c.base_url).map_err(|e| {
            TypeShiftError::InvalidConfig(format!("base URL '{}' is invalid: {}", c.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TypeShiftError::InvalidConfig(format!(
                "base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(TypeShiftError::InvalidConfig(
                "Request timeout must be ≥ 1s".into(),
            ));
        }
        if c.connect_timeout_secs == 0 {
            return Err(TypeShiftError::InvalidConfig(
                "Connect timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}
