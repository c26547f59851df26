//! Runtime configuration.
//!
//! `RadarConfig` collects the settings of the HTTP client, the fetcher, the
//! query cache and the aggregator. Values start from defaults, can be
//! overridden by `RADAR_*` environment variables, and the CLI applies its
//! flags last.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default OpenAlex API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openalex.org";

/// Default page size requested from the works endpoint.
pub const DEFAULT_PER_PAGE: usize = 100;

/// Per-request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Delay between consecutive page requests, in milliseconds.
pub const DEFAULT_THROTTLE_MS: u64 = 100;

/// Cached result sets expire after this many seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 64;

/// Errors in configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    /// A setting is out of range
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for one radar instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// API root, without a trailing slash
    pub base_url: String,

    /// Page size requested per call (clamped to the endpoint maximum)
    pub per_page: usize,

    /// Timeout of each page request, in seconds
    pub request_timeout_secs: u64,

    /// Delay between page requests, in milliseconds
    pub throttle_ms: u64,

    /// Contact address sent as `mailto` to join the polite pool
    pub mailto: Option<String>,

    /// User-Agent header identifying this client
    pub user_agent: String,

    /// Lifetime of cached result sets, in seconds
    pub cache_ttl_secs: u64,

    /// Maximum number of cached result sets
    pub cache_max_entries: usize,

    /// Number of clusters in the chart view (`None` shows all)
    pub top_n: Option<usize>,

    /// Cap on impact-factor points drawn per cluster (`None` draws all)
    pub max_points_per_cluster: Option<usize>,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            throttle_ms: DEFAULT_THROTTLE_MS,
            mailto: None,
            user_agent: format!("scholar-radar/{}", env!("CARGO_PKG_VERSION")),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            top_n: None,
            max_points_per_cluster: None,
        }
    }
}

impl RadarConfig {
    /// Defaults with `RADAR_*` environment overrides applied.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidEnv` if a numeric variable does not parse
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().apply_env(|var| std::env::var(var).ok())
    }

    /// Apply overrides from a variable lookup function.
    ///
    /// Split out from `from_env` so tests can supply variables without
    /// touching the process environment.
    pub fn apply_env<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("RADAR_BASE_URL") {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(mailto) = lookup("RADAR_MAILTO").filter(|m| !m.trim().is_empty()) {
            self.mailto = Some(mailto.trim().to_string());
        }
        if let Some(value) = lookup("RADAR_PER_PAGE") {
            self.per_page = parse_env("RADAR_PER_PAGE", &value)?;
        }
        if let Some(value) = lookup("RADAR_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("RADAR_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("RADAR_THROTTLE_MS") {
            self.throttle_ms = parse_env("RADAR_THROTTLE_MS", &value)?;
        }
        if let Some(value) = lookup("RADAR_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_env("RADAR_CACHE_TTL_SECS", &value)?;
        }
        Ok(self)
    }

    /// Check that the settings are usable.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` for a zero page size, a zero timeout or
    /// an empty base URL
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.per_page == 0 {
            return Err(ConfigError::Invalid("per_page must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}
