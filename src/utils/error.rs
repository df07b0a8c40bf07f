//! Error handling for the supply monitor.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the supply monitor
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An external data source failed (network, status code or response shape).
    /// `stage` names the fetch that failed, e.g. `circulating_supply`.
    #[error("Data source error during {stage}: {message}")]
    DataSource { stage: &'static str, message: String },

    /// Data-related errors (e.g. missing or malformed market data)
    #[error("Data error: {0}")]
    DataError(String),

    /// Percentage change requested against a zero or non-finite baseline
    #[error("Invalid baseline {baseline} for percentage change")]
    InvalidBaseline { baseline: f64 },

    /// Writing the supply snapshot failed
    #[error("Failed to persist snapshot to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another run holds the run lock
    #[error("Run lock {} is held: {holder}", path.display())]
    Locked { path: PathBuf, holder: String },

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    NotifyError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// Request errors
    #[error("Request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Wrap any displayable failure as a data-source fault for `stage`.
    pub fn data_source(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Error::DataSource { stage, message: err.to_string() }
    }
}

/// Result type for the supply monitor
pub type Result<T> = std::result::Result<T, Error>;

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}
