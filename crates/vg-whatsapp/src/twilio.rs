//! Twilio API client for WhatsApp

use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, WhatsAppError};

/// Twilio API client
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    phone_number: String,
    base_url: String,
}

/// Outgoing message payload
#[derive(Debug, Serialize)]
struct SendMessagePayload {
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "To")]
    to: String,
    #[serde(rename = "Body")]
    body: String,
    #[serde(rename = "MediaUrl", skip_serializing_if = "Option::is_none")]
    media_url: Option<String>,
}

impl TwilioClient {
    /// Create a new Twilio client
    pub fn new(account_sid: String, auth_token: String, phone_number: String) -> Self {
        Self {
            client: Client::new(),
            account_sid,
            auth_token,
            phone_number,
            base_url: "https://api.twilio.com".to_string(),
        }
    }

    /// Override the API base URL (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send a WhatsApp message with an optional body and at most one
    /// media URL. Returns the provider-assigned message sid.
    ///
    /// `to` is used exactly as received from the webhook; inbound senders
    /// already carry the `whatsapp:` scheme.
    pub async fn send_message(
        &self,
        to: &str,
        body: Option<&str>,
        media_url: Option<&str>,
    ) -> Result<String> {
        info!("Sending WhatsApp message to {}", to);

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let payload = SendMessagePayload {
            from: format!("whatsapp:{}", self.phone_number),
            to: to.to_string(),
            body: body.unwrap_or_default().to_string(),
            media_url: media_url.map(|u| u.to_string()),
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api(format!(
                "Failed to send message: {} - {}",
                status, text
            )));
        }

        #[derive(Deserialize)]
        struct SendMessageResponse {
            sid: String,
        }

        let result: SendMessageResponse = response.json().await?;
        Ok(result.sid)
    }

    /// Fetch an inbound media attachment from its Twilio media URL.
    ///
    /// Media URLs require HTTP Basic auth with the account credentials.
    pub async fn fetch_media(&self, media_url: &str) -> Result<Bytes> {
        info!("Fetching inbound media from {}", media_url);

        let response = self
            .client
            .get(media_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| WhatsAppError::MediaFetch(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WhatsAppError::MediaFetch(format!(
                "Media URL returned {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WhatsAppError::MediaFetch(format!("Failed to read body: {}", e)))?;

        info!("Fetched {} bytes of inbound media", bytes.len());

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = TwilioClient::new(
            "AC123".to_string(),
            "token123".to_string(),
            "+1234567890".to_string(),
        );
        assert_eq!(client.account_sid, "AC123");
        assert_eq!(client.base_url, "https://api.twilio.com");
    }

    #[test]
    fn test_with_base_url() {
        let client = TwilioClient::new(
            "AC123".to_string(),
            "token123".to_string(),
            "+1234567890".to_string(),
        )
        .with_base_url("http://127.0.0.1:9999");
        assert_eq!(client.base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_payload_omits_absent_media_url() {
        let payload = SendMessagePayload {
            from: "whatsapp:+1234567890".to_string(),
            to: "whatsapp:+19876543210".to_string(),
            body: "hello".to_string(),
            media_url: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["Body"], "hello");
        assert!(value.get("MediaUrl").is_none());
    }

    #[test]
    fn test_payload_includes_media_url() {
        let payload = SendMessagePayload {
            from: "whatsapp:+1234567890".to_string(),
            to: "whatsapp:+19876543210".to_string(),
            body: String::new(),
            media_url: Some("https://example.com/audio/SM1.ogg".to_string()),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["MediaUrl"], "https://example.com/audio/SM1.ogg");
        assert_eq!(value["From"], "whatsapp:+1234567890");
    }
}
