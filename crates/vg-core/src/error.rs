//! Error types for vg-core

use thiserror::Error;

/// Main error type for vg-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for vg-core
pub type Result<T> = std::result::Result<T, Error>;
