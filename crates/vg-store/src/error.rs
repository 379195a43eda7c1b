//! Error types for vg-store

use thiserror::Error;

/// vg-store error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
