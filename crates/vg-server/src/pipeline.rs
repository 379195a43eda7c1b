//! Inbound-message pipeline orchestrator
//!
//! Sequences fetch → transcribe → generate → synthesize → store → deliver
//! for one webhook event. This is the only component with branching logic:
//! every stage failure is absorbed here and converted into exactly one
//! best-effort text reply to the original sender. The sender never gets
//! silence, and never more than one message.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{error, info};

use vg_store::ObjectStore;
use vg_voice::Transcription;

use crate::error::PipelineError;
use crate::event::{InboundEvent, MessageType};

/// Reply for message types the pipeline does not handle.
pub const INVALID_TYPE_REPLY: &str =
    "Invalid message type. Send either text or a voice message!";

/// Reply when any stage before storage fails.
pub const GENERIC_FAILURE_REPLY: &str =
    "Sorry, something went wrong. Please try again later.";

/// Retrieves inbound audio attachment bytes from the gateway
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, media_url: &str) -> Result<Bytes, PipelineError>;
}

/// Converts audio bytes to text plus a detected language code
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription, PipelineError>;
}

/// Produces a reply string from user text
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, user_text: &str) -> Result<String, PipelineError>;
}

/// Converts a reply string to one encoded audio buffer
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Bytes, PipelineError>;
}

/// Sends one outbound message through the gateway
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(
        &self,
        to: &str,
        body: Option<&str>,
        media_url: Option<&str>,
    ) -> Result<String, PipelineError>;
}

/// The pipeline orchestrator.
///
/// One instance serves all events; each run borrows it from behind an
/// `Arc` and holds no state of its own beyond the event.
pub struct Pipeline {
    fetcher: Arc<dyn MediaFetcher>,
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn Responder>,
    synthesizer: Arc<dyn Synthesizer>,
    store: Arc<dyn ObjectStore>,
    sender: Arc<dyn MessageSender>,
    public_base_url: String,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn Responder>,
        synthesizer: Arc<dyn Synthesizer>,
        store: Arc<dyn ObjectStore>,
        sender: Arc<dyn MessageSender>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            transcriber,
            responder,
            synthesizer,
            store,
            sender,
            public_base_url: public_base_url.into(),
        }
    }

    /// Run the pipeline to completion for one inbound event.
    ///
    /// Never returns an error: failures terminate in a text reply to the
    /// sender, and a failed delivery is logged as the terminal outcome.
    pub async fn run(&self, event: InboundEvent) {
        info!(
            "Processing {:?} message {} from {}",
            event.message_type, event.message_sid, event.from
        );

        // Classify. Unsupported types short-circuit straight to delivery.
        let user_text = match event.message_type {
            MessageType::Other => {
                self.deliver_text(&event.from, INVALID_TYPE_REPLY).await;
                return;
            }
            MessageType::Audio => match self.transcribe_stage(&event).await {
                Ok(text) => text,
                Err(e) => {
                    error!("Pipeline failed for {}: {}", event.message_sid, e);
                    self.deliver_text(&event.from, GENERIC_FAILURE_REPLY).await;
                    return;
                }
            },
            MessageType::Text => event.body.clone().unwrap_or_default(),
        };

        // Generating
        let reply = match self.responder.respond(&user_text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Pipeline failed for {}: {}", event.message_sid, e);
                self.deliver_text(&event.from, GENERIC_FAILURE_REPLY).await;
                return;
            }
        };

        // Synthesizing
        let audio = match self.synthesizer.synthesize(&reply).await {
            Ok(audio) => audio,
            Err(e) => {
                error!("Pipeline failed for {}: {}", event.message_sid, e);
                self.deliver_text(&event.from, GENERIC_FAILURE_REPLY).await;
                return;
            }
        };

        // Storing. The reply text is valid even if persistence fails, so
        // this stage falls back to a plain-text delivery of the reply.
        let key = event.storage_key();
        if let Err(e) = self.store.put(&key, audio).await {
            error!("Failed to store audio for {}: {}", event.message_sid, e);
            self.deliver_text(&event.from, &reply).await;
            return;
        }

        // Delivering. The put has succeeded, so the media URL is live
        // before the gateway can come back for it.
        let media_url = format!("{}/audio/{}", self.public_base_url, key);
        match self.sender.send(&event.from, None, Some(&media_url)).await {
            Ok(sid) => info!("Delivered voice reply {} for {}", sid, event.message_sid),
            Err(e) => error!("Delivery failed for {}: {}", event.message_sid, e),
        }
    }

    /// Audio branch: fetch the attachment, then transcribe it.
    async fn transcribe_stage(&self, event: &InboundEvent) -> Result<String, PipelineError> {
        let media_url = event
            .media_url
            .as_deref()
            .ok_or_else(|| PipelineError::Fetch("Audio message without media URL".to_string()))?;

        let audio = self.fetcher.fetch(media_url).await?;
        let transcription = self.transcriber.transcribe(&audio).await?;

        info!(
            "Transcribed {} ({}): {} chars",
            event.message_sid,
            transcription.language_code,
            transcription.text.len()
        );

        Ok(transcription.text)
    }

    /// Terminal text delivery; a failure here is logged, never retried.
    async fn deliver_text(&self, to: &str, body: &str) {
        if let Err(e) = self.sender.send(to, Some(body), None).await {
            error!("Failed to send text reply to {}: {}", to, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use vg_store::MemoryStore;

    #[derive(Default)]
    struct MockFetcher {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl MediaFetcher for MockFetcher {
        async fn fetch(&self, _media_url: &str) -> Result<Bytes, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(PipelineError::Fetch("boom".to_string()));
            }
            Ok(Bytes::from_static(b"inbound-audio"))
        }
    }

    #[derive(Default)]
    struct MockTranscriber {
        calls: AtomicUsize,
        fail: AtomicBool,
        empty: AtomicBool,
    }

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(&self, _audio: &[u8]) -> Result<Transcription, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(PipelineError::Transcription("boom".to_string()));
            }
            // Mirrors the production adapter: an empty provider result is
            // substituted, not surfaced.
            let text = if self.empty.load(Ordering::SeqCst) {
                vg_voice::stt::EMPTY_TRANSCRIPT_PLACEHOLDER.to_string()
            } else {
                "transcribed words".to_string()
            };
            Ok(Transcription {
                text,
                language_code: "en".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MockResponder {
        calls: AtomicUsize,
        fail: AtomicBool,
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Responder for MockResponder {
        async fn respond(&self, user_text: &str) -> Result<String, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(user_text.to_string());
            if self.fail.load(Ordering::SeqCst) {
                return Err(PipelineError::Completion("boom".to_string()));
            }
            Ok(format!("reply to: {}", user_text))
        }
    }

    #[derive(Default)]
    struct MockSynthesizer {
        calls: AtomicUsize,
        fail: AtomicBool,
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Synthesizer for MockSynthesizer {
        async fn synthesize(&self, text: &str) -> Result<Bytes, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(text.to_string());
            if self.fail.load(Ordering::SeqCst) {
                return Err(PipelineError::Synthesis("boom".to_string()));
            }
            Ok(Bytes::from_static(b"opus-bytes"))
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct SentMessage {
        to: String,
        body: Option<String>,
        media_url: Option<String>,
    }

    #[derive(Default)]
    struct MockSender {
        sent: Mutex<Vec<SentMessage>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl MessageSender for MockSender {
        async fn send(
            &self,
            to: &str,
            body: Option<&str>,
            media_url: Option<&str>,
        ) -> Result<String, PipelineError> {
            self.sent.lock().unwrap().push(SentMessage {
                to: to.to_string(),
                body: body.map(|s| s.to_string()),
                media_url: media_url.map(|s| s.to_string()),
            });
            if self.fail.load(Ordering::SeqCst) {
                return Err(PipelineError::Delivery("boom".to_string()));
            }
            Ok("SMout".to_string())
        }
    }

    /// A store whose writes are always rejected.
    struct RejectingStore;

    #[async_trait]
    impl ObjectStore for RejectingStore {
        async fn put(&self, key: &str, _bytes: Bytes) -> vg_store::Result<()> {
            Err(vg_store::StoreError::WriteRejected(key.to_string()))
        }

        async fn take(&self, _key: &str) -> vg_store::Result<Option<Bytes>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> vg_store::Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        fetcher: Arc<MockFetcher>,
        transcriber: Arc<MockTranscriber>,
        responder: Arc<MockResponder>,
        synthesizer: Arc<MockSynthesizer>,
        store: Arc<MemoryStore>,
        sender: Arc<MockSender>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                fetcher: Arc::new(MockFetcher::default()),
                transcriber: Arc::new(MockTranscriber::default()),
                responder: Arc::new(MockResponder::default()),
                synthesizer: Arc::new(MockSynthesizer::default()),
                store: Arc::new(MemoryStore::new()),
                sender: Arc::new(MockSender::default()),
            }
        }

        fn pipeline(&self) -> Pipeline {
            self.pipeline_with_store(self.store.clone())
        }

        fn pipeline_with_store(&self, store: Arc<dyn ObjectStore>) -> Pipeline {
            Pipeline::new(
                self.fetcher.clone(),
                self.transcriber.clone(),
                self.responder.clone(),
                self.synthesizer.clone(),
                store,
                self.sender.clone(),
                "https://voice.example.com",
            )
        }

        fn sent(&self) -> Vec<SentMessage> {
            self.sender.sent.lock().unwrap().clone()
        }
    }

    fn text_event(body: &str) -> InboundEvent {
        serde_urlencoded::from_str(&format!(
            "MessageType=text&From=whatsapp%3A%2B14155550100&MessageSid=SM1&Body={}",
            body
        ))
        .unwrap()
    }

    fn audio_event() -> InboundEvent {
        serde_urlencoded::from_str(
            "MessageType=audio&From=whatsapp%3A%2B14155550100&MessageSid=SM2&MediaUrl0=https%3A%2F%2Fmedia",
        )
        .unwrap()
    }

    fn other_event() -> InboundEvent {
        serde_urlencoded::from_str("MessageType=image&From=whatsapp%3A%2B14155550100&MessageSid=SM3")
            .unwrap()
    }

    #[tokio::test]
    async fn test_text_message_full_pipeline() {
        let fx = Fixture::new();
        fx.pipeline().run(text_event("Hi")).await;

        // Responder saw the raw body; synthesizer saw the responder output.
        assert_eq!(fx.responder.inputs.lock().unwrap().as_slice(), ["Hi"]);
        assert_eq!(
            fx.synthesizer.inputs.lock().unwrap().as_slice(),
            ["reply to: Hi"]
        );

        // Stored under the sid-derived key, delivered as a media URL.
        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "whatsapp:+14155550100");
        assert_eq!(sent[0].body, None);
        assert_eq!(
            sent[0].media_url.as_deref(),
            Some("https://voice.example.com/audio/SM1.ogg")
        );
        assert_eq!(fx.store.len(), 1);
    }

    #[tokio::test]
    async fn test_text_message_never_touches_audio_ingest() {
        let fx = Fixture::new();
        fx.pipeline().run(text_event("Hi")).await;

        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_audio_message_full_pipeline() {
        let fx = Fixture::new();
        fx.pipeline().run(audio_event()).await;

        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            fx.responder.inputs.lock().unwrap().as_slice(),
            ["transcribed words"]
        );

        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].media_url.as_deref(),
            Some("https://voice.example.com/audio/SM2.ogg")
        );
    }

    #[tokio::test]
    async fn test_unsupported_type_short_circuits() {
        let fx = Fixture::new();
        fx.pipeline().run(other_event()).await;

        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body.as_deref(), Some(INVALID_TYPE_REPLY));
        assert_eq!(sent[0].media_url, None);

        // No other stage ran.
        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.transcriber.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.responder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.synthesizer.calls.load(Ordering::SeqCst), 0);
        assert!(fx.store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_transcription_uses_placeholder() {
        let fx = Fixture::new();
        fx.transcriber.empty.store(true, Ordering::SeqCst);
        fx.pipeline().run(audio_event()).await;

        assert_eq!(
            fx.responder.inputs.lock().unwrap().as_slice(),
            [vg_voice::stt::EMPTY_TRANSCRIPT_PLACEHOLDER]
        );

        // Pipeline proceeded normally to a voice reply.
        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].media_url.is_some());
    }

    #[tokio::test]
    async fn test_fetch_failure_sends_generic_reply() {
        let fx = Fixture::new();
        fx.fetcher.fail.store(true, Ordering::SeqCst);
        fx.pipeline().run(audio_event()).await;

        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body.as_deref(), Some(GENERIC_FAILURE_REPLY));
        assert_eq!(sent[0].media_url, None);
        assert_eq!(fx.transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transcription_failure_sends_generic_reply() {
        let fx = Fixture::new();
        fx.transcriber.fail.store(true, Ordering::SeqCst);
        fx.pipeline().run(audio_event()).await;

        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body.as_deref(), Some(GENERIC_FAILURE_REPLY));
        assert_eq!(sent[0].media_url, None);
        assert_eq!(fx.responder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_completion_failure_sends_generic_reply() {
        let fx = Fixture::new();
        fx.responder.fail.store(true, Ordering::SeqCst);
        fx.pipeline().run(text_event("Hi")).await;

        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body.as_deref(), Some(GENERIC_FAILURE_REPLY));
        assert_eq!(sent[0].media_url, None);
        assert_eq!(fx.synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_sends_generic_reply() {
        let fx = Fixture::new();
        fx.synthesizer.fail.store(true, Ordering::SeqCst);
        fx.pipeline().run(text_event("Hi")).await;

        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body.as_deref(), Some(GENERIC_FAILURE_REPLY));
        assert_eq!(sent[0].media_url, None);
        assert!(fx.store.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_falls_back_to_reply_text() {
        let fx = Fixture::new();
        let pipeline = fx.pipeline_with_store(Arc::new(RejectingStore));
        pipeline.run(text_event("Hi")).await;

        // The reply itself is still valid, so it goes out as plain text.
        let sent = fx.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body.as_deref(), Some("reply to: Hi"));
        assert_eq!(sent[0].media_url, None);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_terminal() {
        let fx = Fixture::new();
        fx.sender.fail.store(true, Ordering::SeqCst);
        fx.pipeline().run(text_event("Hi")).await;

        // One attempt, no retry, no second message.
        assert_eq!(fx.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_stored_audio_round_trips_through_store() {
        let fx = Fixture::new();
        fx.pipeline().run(text_event("Hi")).await;

        let bytes = fx.store.take("SM1.ogg").await.unwrap();
        assert_eq!(bytes, Some(Bytes::from_static(b"opus-bytes")));
        assert!(fx.store.take("SM1.ogg").await.unwrap().is_none());
    }
}
