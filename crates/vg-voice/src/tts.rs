//! Speech synthesis using the ElevenLabs text-to-speech API
//!
//! The provider streams the encoded audio as binary chunks. The client
//! drains that stream to EOF into one contiguous buffer before handing it
//! to the caller; a stream that errors out mid-way never produces a
//! partial buffer.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{Result, VoiceError};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// TTS model used for all replies.
const TTS_MODEL_ID: &str = "eleven_multilingual_v2";

/// Compressed output encoding; the audio endpoint serves it as audio/ogg.
const OUTPUT_FORMAT: &str = "opus_48000_64";

/// ElevenLabs text-to-speech client
#[derive(Debug, Clone)]
pub struct TtsClient {
    client: Client,
    api_key: String,
    voice_id: String,
    base_url: String,
    /// Upper bound for one synthesized object; the provider imposes none.
    max_audio_bytes: usize,
}

impl TtsClient {
    /// Create a new text-to-speech client
    pub fn new(
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        max_audio_bytes: usize,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| VoiceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_audio_bytes,
        })
    }

    /// Override the API base URL (for testing or proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Synthesize speech for the given text and return the full encoded
    /// audio buffer.
    pub async fn synthesize(&self, text: &str) -> Result<Bytes> {
        let url = format!(
            "{}/text-to-speech/{}?output_format={}",
            self.base_url, self.voice_id, OUTPUT_FORMAT
        );

        info!("Synthesizing speech: {} chars", text.len());
        debug!("Model: {}, voice: {}", TTS_MODEL_ID, self.voice_id);

        let body = serde_json::json!({
            "text": text,
            "model_id": TTS_MODEL_ID,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
            }
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::Api(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VoiceError::Synthesis(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        // Drain the chunked response to EOF. The buffer is only valid once
        // the stream terminates cleanly.
        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| VoiceError::Synthesis(format!("Stream terminated early: {}", e)))?;

            if buffer.len() + chunk.len() > self.max_audio_bytes {
                return Err(VoiceError::Synthesis(format!(
                    "Audio exceeds maximum size of {} bytes",
                    self.max_audio_bytes
                )));
            }

            buffer.extend_from_slice(&chunk);
        }

        if buffer.is_empty() {
            return Err(VoiceError::Synthesis("Provider returned no audio".to_string()));
        }

        info!("Synthesis complete: {} bytes", buffer.len());

        Ok(buffer.freeze())
    }
}
