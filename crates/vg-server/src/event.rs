//! Inbound webhook event

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Classifier of an inbound message.
///
/// Anything the gateway reports that is not plain text or a single audio
/// attachment maps to `Other` and gets the fixed invalid-input reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Audio,
    Other,
}

impl From<&str> for MessageType {
    fn from(value: &str) -> Self {
        match value {
            "text" => MessageType::Text,
            "audio" => MessageType::Audio,
            _ => MessageType::Other,
        }
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(MessageType::from(raw.as_str()))
    }
}

/// One webhook delivery, immutable for the duration of its pipeline run.
///
/// Field names follow Twilio's form-encoded webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "MessageType", default = "default_message_type")]
    pub message_type: MessageType,

    /// Sender address, `whatsapp:`-prefixed
    #[serde(rename = "From", default)]
    pub from: String,

    /// Provider message identifier; seeds the storage key
    #[serde(rename = "MessageSid", default)]
    pub message_sid: String,

    /// Text body, present for text messages
    #[serde(rename = "Body", default)]
    pub body: Option<String>,

    /// First media attachment URL, present for audio messages
    #[serde(rename = "MediaUrl0", default)]
    pub media_url: Option<String>,
}

fn default_message_type() -> MessageType {
    MessageType::Other
}

impl InboundEvent {
    /// Storage key for this event's synthesized reply.
    ///
    /// Derived from the message sid; a random identifier stands in when
    /// the gateway supplied none.
    pub fn storage_key(&self) -> String {
        if self.message_sid.is_empty() {
            format!("{}.ogg", Uuid::new_v4())
        } else {
            format!("{}.ogg", self.message_sid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_mapping() {
        assert_eq!(MessageType::from("text"), MessageType::Text);
        assert_eq!(MessageType::from("audio"), MessageType::Audio);
        assert_eq!(MessageType::from("video"), MessageType::Other);
        assert_eq!(MessageType::from(""), MessageType::Other);
    }

    #[test]
    fn test_form_decoding_text() {
        let event: InboundEvent = serde_urlencoded_from(
            "MessageType=text&From=whatsapp%3A%2B14155550100&MessageSid=SM123&Body=Hi",
        );
        assert_eq!(event.message_type, MessageType::Text);
        assert_eq!(event.from, "whatsapp:+14155550100");
        assert_eq!(event.message_sid, "SM123");
        assert_eq!(event.body.as_deref(), Some("Hi"));
        assert!(event.media_url.is_none());
    }

    #[test]
    fn test_form_decoding_audio() {
        let event: InboundEvent = serde_urlencoded_from(
            "MessageType=audio&From=whatsapp%3A%2B14155550100&MessageSid=SM9&MediaUrl0=https%3A%2F%2Fapi.twilio.com%2Fmedia%2F1",
        );
        assert_eq!(event.message_type, MessageType::Audio);
        assert_eq!(
            event.media_url.as_deref(),
            Some("https://api.twilio.com/media/1")
        );
    }

    #[test]
    fn test_form_decoding_unknown_type() {
        let event: InboundEvent =
            serde_urlencoded_from("MessageType=image&From=whatsapp%3A%2B1&MessageSid=SM1");
        assert_eq!(event.message_type, MessageType::Other);
    }

    #[test]
    fn test_storage_key_from_sid() {
        let event: InboundEvent =
            serde_urlencoded_from("MessageType=text&From=f&MessageSid=SM123&Body=x");
        assert_eq!(event.storage_key(), "SM123.ogg");
    }

    #[test]
    fn test_storage_key_fallback_is_random() {
        let event: InboundEvent = serde_urlencoded_from("MessageType=text&From=f&Body=x");
        let a = event.storage_key();
        let b = event.storage_key();
        assert!(a.ends_with(".ogg"));
        assert_ne!(a, b);
    }

    fn serde_urlencoded_from(query: &str) -> InboundEvent {
        serde_urlencoded::from_str(query).unwrap()
    }
}
