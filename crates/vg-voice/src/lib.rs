//! vg-voice: speech processing for voicegate
//!
//! This crate provides the two ElevenLabs clients used by the pipeline:
//!
//! - **Speech recognition**: Scribe speech-to-text for inbound voice notes
//! - **Speech synthesis**: text-to-speech with a fixed voice, drained from
//!   the provider's chunked response into a single bounded buffer

pub mod error;
pub mod stt;
pub mod tts;

pub use error::{Result, VoiceError};
pub use stt::{SttClient, Transcription, EMPTY_TRANSCRIPT_PLACEHOLDER};
pub use tts::TtsClient;
