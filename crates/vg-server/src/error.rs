//! Pipeline stage errors
//!
//! One variant per pipeline stage. Every variant is caught at the
//! orchestrator boundary and converted into a best-effort text reply;
//! nothing propagates back through the webhook response.

use thiserror::Error;

/// Error raised by one stage of the inbound-message pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Media fetch failed: {0}")]
    Fetch(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Storage failed: {0}")]
    Storage(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}
