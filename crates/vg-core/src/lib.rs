//! vg-core: voicegate core library
//!
//! Configuration loading and the LLM completion client shared by the
//! rest of the workspace.

pub mod config;
pub mod error;
pub mod llm;

pub use config::{
    Config, ElevenLabsConfig, LlmConfig, LlmProvider, ServerConfig, StoreBackend, StoreConfig,
    TwilioConfig,
};
pub use error::{Error, Result};
pub use llm::LlmClient;
