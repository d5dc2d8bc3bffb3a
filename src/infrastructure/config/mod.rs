//! Configuration loading for the lookup service.

pub mod logging;
pub mod settings;

pub use logging::LoggingConfig;
pub use settings::{CacheConfig, Config, RemoteOracleConfig};
