//! Error types for the flag reader.

use thiserror::Error;

/// Main error type for flag reader operations.
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Executor is shut down")]
    ExecutorClosed,

    #[error("Invalid namespace: {0:?}")]
    InvalidNamespace(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for FlagError {
    fn from(e: serde_json::Error) -> Self {
        FlagError::Config(e.to_string())
    }
}

/// Result type for flag reader operations.
pub type Result<T> = std::result::Result<T, FlagError>;
