//! Error types for vg-whatsapp

use thiserror::Error;

/// vg-whatsapp error type
#[derive(Error, Debug)]
pub enum WhatsAppError {
    #[error("Twilio API error: {0}")]
    Api(String),

    #[error("Media fetch failed: {0}")]
    MediaFetch(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for WhatsAppError {
    fn from(err: reqwest::Error) -> Self {
        WhatsAppError::Http(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WhatsAppError>;
