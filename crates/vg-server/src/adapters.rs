//! Production adapters binding the pipeline seams to the concrete clients

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use vg_core::{Config, LlmClient};
use vg_store::ObjectStore;
use vg_voice::{SttClient, Transcription, TtsClient};
use vg_whatsapp::TwilioClient;

use crate::error::PipelineError;
use crate::pipeline::{
    MediaFetcher, MessageSender, Pipeline, Responder, Synthesizer, Transcriber,
};

/// Twilio-backed media fetch
pub struct TwilioMediaFetcher {
    client: Arc<TwilioClient>,
}

#[async_trait]
impl MediaFetcher for TwilioMediaFetcher {
    async fn fetch(&self, media_url: &str) -> Result<Bytes, PipelineError> {
        self.client
            .fetch_media(media_url)
            .await
            .map_err(|e| PipelineError::Fetch(e.to_string()))
    }
}

/// ElevenLabs Scribe transcription
pub struct SttTranscriber {
    client: SttClient,
}

#[async_trait]
impl Transcriber for SttTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription, PipelineError> {
        self.client
            .transcribe(audio)
            .await
            .map_err(|e| PipelineError::Transcription(e.to_string()))
    }
}

/// LLM completion
pub struct LlmResponder {
    client: LlmClient,
}

#[async_trait]
impl Responder for LlmResponder {
    async fn respond(&self, user_text: &str) -> Result<String, PipelineError> {
        self.client
            .complete(user_text)
            .await
            .map_err(|e| PipelineError::Completion(e.to_string()))
    }
}

/// ElevenLabs speech synthesis
pub struct TtsSynthesizer {
    client: TtsClient,
}

#[async_trait]
impl Synthesizer for TtsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes, PipelineError> {
        self.client
            .synthesize(text)
            .await
            .map_err(|e| PipelineError::Synthesis(e.to_string()))
    }
}

/// Twilio-backed outbound delivery
pub struct TwilioSender {
    client: Arc<TwilioClient>,
}

#[async_trait]
impl MessageSender for TwilioSender {
    async fn send(
        &self,
        to: &str,
        body: Option<&str>,
        media_url: Option<&str>,
    ) -> Result<String, PipelineError> {
        self.client
            .send_message(to, body, media_url)
            .await
            .map_err(|e| PipelineError::Delivery(e.to_string()))
    }
}

/// Build the production pipeline from configuration and a store.
pub fn build_pipeline(config: &Config, store: Arc<dyn ObjectStore>) -> anyhow::Result<Pipeline> {
    let twilio = Arc::new(TwilioClient::new(
        config.twilio.account_sid.clone(),
        config.twilio.auth_token.clone(),
        config.twilio.from_number.clone(),
    ));

    let stt = SttClient::new(config.elevenlabs.api_key.clone())
        .map_err(|e| anyhow::anyhow!("Failed to create STT client: {}", e))?;

    let tts = TtsClient::new(
        config.elevenlabs.api_key.clone(),
        config.elevenlabs.voice_id.clone(),
        config.store.max_audio_bytes,
    )
    .map_err(|e| anyhow::anyhow!("Failed to create TTS client: {}", e))?;

    let llm = LlmClient::new(&config.llm)
        .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?;

    Ok(Pipeline::new(
        Arc::new(TwilioMediaFetcher {
            client: twilio.clone(),
        }),
        Arc::new(SttTranscriber { client: stt }),
        Arc::new(LlmResponder { client: llm }),
        Arc::new(TtsSynthesizer { client: tts }),
        store,
        Arc::new(TwilioSender { client: twilio }),
        config.server.public_base_url.trim_end_matches('/'),
    ))
}
