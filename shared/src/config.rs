//! Configuration management for the page handler.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backing API (no trailing slash)
    pub api_base_url: String,
    /// Per-request timeout for calls to the backing API
    pub api_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

        let api_timeout = match env::var("API_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| Error::Config(format!("API_TIMEOUT_SECS: {}", e)))?,
            Err(_) => Duration::from_secs(10),
        };

        Ok(Self::new(api_base_url).with_timeout(api_timeout))
    }

    /// Build a configuration pointing at the given API base URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            api_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }
}
