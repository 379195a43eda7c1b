//! LLM completion client and types
//!
//! Supports both OpenAI-compatible APIs and the Claude API.

mod client;
mod types;

pub use client::LlmClient;
pub use types::*;
