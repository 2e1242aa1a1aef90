//! Client configuration.
//!
//! # Design
//! The base endpoint is set once at composition time and passed to whatever
//! needs it (`PostClient`, the transport, `PostApp`). There is no global:
//! tests and hosts build as many configurations as they like.

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const ENV_BASE_URL: &str = "POSTS_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "POSTS_API_TIMEOUT_SECS";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("unsupported URL scheme '{0}', expected http or https")]
    UnsupportedScheme(String),

    #[error("invalid POSTS_API_TIMEOUT_SECS value '{0}'")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    /// `None` leaves timeouts to the transport's own defaults.
    request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
        })
    }

    /// Read `POSTS_API_URL` and `POSTS_API_TIMEOUT_SECS`, falling back to the
    /// local development server.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = var(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let config = Self::new(&base_url)?;
        match var(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
                Ok(config.with_request_timeout(Duration::from_secs(secs)))
            }
            None => Ok(config),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}
