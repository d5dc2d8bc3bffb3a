//! Service configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all service
//! settings. Configuration is loaded from a TOML file; the database path
//! can be overridden through the `SWITCHBOARD_DATABASE` environment
//! variable.
//!
//! # Example
//!
//! ```
//! use switchboard::infrastructure::config::Config;
//!
//! let config = Config::parse_toml(
//!     r#"
//!     database = "lookup.db"
//!
//!     [cache]
//!     ttl_secs = 30
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.database, "lookup.db");
//! assert_eq!(config.cache.ttl_secs, 30);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::error::{ConfigError, Result};

/// HTTP client settings applied to every remote oracle provider.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOracleConfig {
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for RemoteOracleConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Association cache settings for builtin oracle providers.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// How long a positive lookup stays valid.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Main service configuration.
///
/// Aggregates all settings. Load from a TOML file using [`Config::load`]
/// or parse directly with [`Config::parse_toml`].
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Path to the SQLite database file backing the registry and builtin
    /// oracles.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// HTTP client settings for remote oracles.
    #[serde(default)]
    pub remote_oracle: RemoteOracleConfig,

    /// Association cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            database: default_database_path(),
            remote_oracle: RemoteOracleConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation
    /// fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(database) = std::env::var("SWITCHBOARD_DATABASE") {
            config.database = database;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize the tracing subscriber from the logging section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        if self.remote_oracle.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.remote_oracle.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ttl_secs",
                reason: "must be greater than 0 while the cache is enabled".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn default_database_path() -> String {
    "switchboard.db".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    60
}
