//! Speech recognition using the ElevenLabs Scribe API

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, VoiceError};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Scribe model used for all transcriptions.
const STT_MODEL_ID: &str = "scribe_v1";

/// Substituted when the provider returns no text. A voice note that could
/// not be understood still gets a reply instead of aborting the pipeline.
pub const EMPTY_TRANSCRIPT_PLACEHOLDER: &str = "Could not transcribe the message.";

/// Transcription of one inbound voice note
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Transcribed text (never empty; see [`EMPTY_TRANSCRIPT_PLACEHOLDER`])
    pub text: String,
    /// Detected language code (e.g., "en")
    pub language_code: String,
}

#[derive(Debug, Deserialize)]
struct SpeechToTextResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    language_code: String,
}

/// ElevenLabs speech-to-text client
#[derive(Debug, Clone)]
pub struct SttClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SttClient {
    /// Create a new speech-to-text client
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| VoiceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL (for testing or proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Transcribe audio bytes.
    ///
    /// Fails only on transport or auth failure. An empty result from the
    /// provider is substituted with a fixed placeholder so the caller can
    /// still produce a reply.
    pub async fn transcribe(&self, audio_data: &[u8]) -> Result<Transcription> {
        let url = format!("{}/speech-to-text", self.base_url);

        info!("Transcribing audio: {} bytes", audio_data.len());
        debug!("Using model: {}", STT_MODEL_ID);

        let form = reqwest::multipart::Form::new()
            .text("model_id", STT_MODEL_ID)
            .text("tag_audio_events", "true")
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio_data.to_vec())
                    .file_name("message.ogg")
                    .mime_str("audio/ogg")
                    .map_err(|e| VoiceError::Config(format!("Failed to set mime type: {}", e)))?,
            );

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::Api(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VoiceError::Transcription(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let result: SpeechToTextResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Transcription(format!("Failed to parse response: {}", e)))?;

        let text = if result.text.trim().is_empty() {
            EMPTY_TRANSCRIPT_PLACEHOLDER.to_string()
        } else {
            result.text
        };

        info!(
            "Transcription complete: {} characters, language: {}",
            text.len(),
            result.language_code
        );

        Ok(Transcription {
            text,
            language_code: result.language_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SttClient::new("test-key").unwrap();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_with_base_url() {
        let client = SttClient::new("test-key")
            .unwrap()
            .with_base_url("http://127.0.0.1:9999");
        assert_eq!(client.base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_response_parsing() {
        let response: SpeechToTextResponse =
            serde_json::from_str(r#"{"text":"hello there","language_code":"en"}"#).unwrap();
        assert_eq!(response.text, "hello there");
        assert_eq!(response.language_code, "en");
    }

    #[test]
    fn test_response_parsing_missing_fields() {
        let response: SpeechToTextResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.text.is_empty());
        assert!(response.language_code.is_empty());
    }
}
