//! Dashboard configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `TRAFFIC_STATS_*` environment variables, then command-line flags.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// API base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Dataset period used when nothing else is configured.
pub const DEFAULT_PERIOD: &str = "2023";

/// Environment variable overriding [`DashboardConfig::api_url`].
pub const API_URL_ENV: &str = "TRAFFIC_STATS_API_URL";

/// Environment variable overriding [`DashboardConfig::period`].
pub const PERIOD_ENV: &str = "TRAFFIC_STATS_PERIOD";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`DashboardConfig`].
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Where the dashboard gets its data from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the statistics API.
    pub api_url: String,
    /// Dataset period (year) the statistics cover. Part of every cache
    /// key.
    pub period: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            period: DEFAULT_PERIOD.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Loads the configuration from `path` (if given) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };

        Ok(config.with_vars(|name| std::env::var(name).ok()))
    }

    /// Applies `TRAFFIC_STATS_*` overrides looked up through `lookup`.
    /// Empty values are ignored.
    #[must_use]
    pub fn with_vars(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        self.with_overrides(non_empty(API_URL_ENV), non_empty(PERIOD_ENV))
    }

    /// Replaces each value that is `Some`.
    #[must_use]
    pub fn with_overrides(mut self, api_url: Option<String>, period: Option<String>) -> Self {
        if let Some(api_url) = api_url {
            self.api_url = api_url;
        }
        if let Some(period) = period {
            self.period = period;
        }
        self
    }
}
