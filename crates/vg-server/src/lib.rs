//! vg-server: HTTP surface and pipeline orchestrator for voicegate
//!
//! Hosts the Twilio webhook, the read-once audio retrieval endpoint, and
//! the inbound-message pipeline that turns a webhook payload into one
//! delivered outbound message.

pub mod adapters;
pub mod audio;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod server;
pub mod webhook;

pub use error::PipelineError;
pub use event::{InboundEvent, MessageType};
pub use pipeline::{
    MediaFetcher, MessageSender, Pipeline, Responder, Synthesizer, Transcriber,
};
pub use server::{start_server, AppState};
