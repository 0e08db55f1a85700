//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Feed controller behavior
    #[serde(default)]
    pub feed: FeedConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// File locations, relative to the storage directory
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        let base = Url::parse(&self.api.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "api.base_url must be http(s), got '{}'",
                base.scheme()
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.retry.max_delay_ms < self.api.retry.min_delay_ms {
            return Err(AppError::validation(
                "api.retry.max_delay_ms must be >= api.retry.min_delay_ms",
            ));
        }
        if !(1..=100).contains(&self.feed.page_size) {
            return Err(AppError::validation("feed.page_size must be in 1..=100"));
        }
        if self.feed.scroll_threshold_px < 0.0 {
            return Err(AppError::validation(
                "feed.scroll_threshold_px must be >= 0",
            ));
        }
        Ok(())
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL all resource paths are joined onto
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Automatic retry policy for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retry: RetryConfig::default(),
        }
    }
}

/// Exponential backoff settings. `max_retries = 0` leaves retries to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub max_retries: usize,

    #[serde(default = "defaults::min_delay")]
    pub min_delay_ms: u64,

    #[serde(default = "defaults::max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            min_delay_ms: defaults::min_delay(),
            max_delay_ms: defaults::max_delay(),
        }
    }
}

/// How an optimistic toggle is undone when the backend rejects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Reload the whole collection from the backend
    #[default]
    Refetch,
    /// Put back the item exactly as it was before the toggle
    RestoreSnapshot,
}

/// Feed controller behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Items requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Distance from the bottom (px) at which more items are requested
    #[serde(default = "defaults::scroll_threshold")]
    pub scroll_threshold_px: f64,

    /// Quiet period before search input is acted upon
    #[serde(default = "defaults::debounce")]
    pub debounce_ms: u64,

    /// Failure handling for optimistic toggles
    #[serde(default)]
    pub reconcile: ReconcilePolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            scroll_threshold_px: defaults::scroll_threshold(),
            debounce_ms: defaults::debounce(),
            reconcile: ReconcilePolicy::default(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where the persisted session lives
    #[serde(default = "defaults::credentials_file")]
    pub credentials_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            credentials_file: defaults::credentials_file(),
        }
    }
}

mod defaults {
    // Api defaults
    pub fn base_url() -> String {
        "http://localhost:3000/api".to_string()
    }
    pub fn user_agent() -> String {
        concat!("bookfeed/", env!("CARGO_PKG_VERSION")).to_string()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn min_delay() -> u64 {
        500
    }
    pub fn max_delay() -> u64 {
        10_000
    }

    // Feed defaults
    pub fn page_size() -> u32 {
        10
    }
    pub fn scroll_threshold() -> f64 {
        200.0
    }
    pub fn debounce() -> u64 {
        300
    }

    pub fn log_level() -> String {
        "info".to_string()
    }
    pub fn credentials_file() -> String {
        "credentials.json".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feed.page_size, 10);
        assert_eq!(config.feed.scroll_threshold_px, 200.0);
        assert_eq!(config.api.retry.max_retries, 0);
        assert_eq!(config.feed.reconcile, ReconcilePolicy::Refetch);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://books.example.com/api"

            [feed]
            page_size = 25
            reconcile = "restore_snapshot"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://books.example.com/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.feed.page_size, 25);
        assert_eq!(config.feed.debounce_ms, 300);
        assert_eq!(config.feed.reconcile, ReconcilePolicy::RestoreSnapshot);
        assert_eq!(config.paths.credentials_file, "credentials.json");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.feed.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.retry.min_delay_ms = 5_000;
        config.api.retry.max_delay_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.api.base_url, "http://localhost:3000/api");
    }
}
