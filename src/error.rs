//! Error types for the analysis service
//!
//! The scoring core never fails: degenerate input degrades to zero or neutral
//! scores. These errors belong to the layers around it (configuration, data
//! sources, snapshot files, CLI).

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the analysis service
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid threshold {name}: {reason}")]
    InvalidThreshold { name: String, reason: String },

    // Data source errors
    #[error("Market data request failed: {0}")]
    MarketData(String),

    #[error("Market data request timed out after {0}ms")]
    MarketDataTimeout(u64),

    #[error("Market data request rejected: {0}")]
    MarketDataRejected(String),

    #[error("Rate limited by market data provider")]
    RateLimited,

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::MarketData(_) | Error::MarketDataTimeout(_) | Error::RateLimited
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::MarketData(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
