//! Error types for tact-api

use thiserror::Error;

/// tact-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] tact_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
