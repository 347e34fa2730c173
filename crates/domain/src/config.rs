//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_LOG_FILTER, DEFAULT_MARKER_PREFIX, DEFAULT_MARKER_SUFFIX, DEFAULT_REFRESH_BASE_DELAY_MS,
    DEFAULT_REFRESH_MAX_ATTEMPTS, DEFAULT_REFRESH_PATH, DEFAULT_REFRESH_TIMEOUT_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, LOCAL_DEV_COOKIE_DOMAIN,
};
use crate::{DealroomError, Result};

/// Session client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub retry: RetryConfig,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

/// Portal API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL for the portal API (e.g., "https://api.dealroom.app")
    pub base_url: String,
    pub timeout_ms: u64,
}

/// Session marker and identity-provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Refresh endpoint, relative to `api.base_url`
    pub refresh_path: String,
    /// Local sign-out endpoint; `None` disables the best-effort sign-out call
    pub sign_out_path: Option<String>,
    pub refresh_timeout_ms: u64,
    pub marker_prefix: String,
    pub marker_suffix: String,
    /// Overrides the cookie domain derived from the API host
    pub cookie_domain: Option<String>,
    pub production_domain: Option<String>,
    pub local_dev_domain: Option<String>,
}

/// Refresh retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt
    pub base_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            retry: RetryConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dealroom.app".to_string(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            sign_out_path: None,
            refresh_timeout_ms: DEFAULT_REFRESH_TIMEOUT_MS,
            marker_prefix: DEFAULT_MARKER_PREFIX.to_string(),
            marker_suffix: DEFAULT_MARKER_SUFFIX.to_string(),
            cookie_domain: None,
            production_domain: Some(".dealroom.app".to_string()),
            local_dev_domain: Some(LOCAL_DEV_COOKIE_DOMAIN.to_string()),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_REFRESH_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_REFRESH_BASE_DELAY_MS,
        }
    }
}

impl ClientConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `DealroomError::Config` if the base URL does not parse, the
    /// retry policy allows no attempts, or the marker prefix is empty.
    pub fn validate(&self) -> Result<()> {
        self.api_base_url()?;

        if self.retry.max_attempts == 0 {
            return Err(DealroomError::Config("retry.max_attempts must be greater than 0".into()));
        }

        if self.session.marker_prefix.is_empty() {
            return Err(DealroomError::Config("session.marker_prefix must not be empty".into()));
        }

        Ok(())
    }

    /// Parsed API base URL
    ///
    /// # Errors
    /// Returns `DealroomError::Config` if `api.base_url` is not a valid URL.
    pub fn api_base_url(&self) -> Result<Url> {
        Url::parse(&self.api.base_url).map_err(|e| {
            DealroomError::Config(format!("Invalid api.base_url '{}': {}", self.api.base_url, e))
        })
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl SessionConfig {
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_zero_attempts() {
        let mut config = ClientConfig::default();
        config.retry.max_attempts = 0;

        assert!(matches!(config.validate(), Err(DealroomError::Config(_))));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let mut config = ClientConfig::default();
        config.api.base_url = "not a url".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api.base_url"));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://localhost:4000"

            [retry]
            base_delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:4000");
        assert_eq!(config.api.timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(config.retry.max_attempts, DEFAULT_REFRESH_MAX_ATTEMPTS);
        assert_eq!(config.retry.base_delay_ms, 250);
        assert_eq!(config.session.marker_suffix, DEFAULT_MARKER_SUFFIX);
    }
}
