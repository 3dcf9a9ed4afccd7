//! Error types for AuditChain

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// A record lacks a field the chain schema needs for serialization.
    #[error("Missing field '{field}' in record {row}")]
    MissingField { field: String, row: usize },
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// A supplied block sequence does not verify; `index` is the first bad block.
    #[error("Invalid chain: verification failed at block {index}")]
    InvalidChain { index: usize },
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("Model error: {0}")]
    Model(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
