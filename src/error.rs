use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::event::FailureKind;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("remote oracle error: {0}")]
    RemoteOracle(String),

    #[error("publish error: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Discriminant of the error event this failure surfaces as when it
    /// escapes event handling. Infrastructure failures without a domain
    /// meaning land on the generic unknown kind.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Domain(domain) => domain.failure_kind(),
            _ => FailureKind::Unknown,
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}
