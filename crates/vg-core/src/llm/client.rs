//! LLM API HTTP client
//!
//! Produces a single, non-streaming completion for each user message.
//! Supports the Claude API and OpenAI-compatible APIs.

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};

use super::types::*;

/// Fixed system instruction for every reply.
const SYSTEM_PROMPT: &str = "You are a helpful assistant. \
You are given a message from a user. \
You need to respond to the user's message in a brief manner.";

const MAX_TOKENS: u32 = 1024;

/// LLM completion client
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: LlmProvider,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(Error::Http)?;

        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => match config.provider {
                LlmProvider::Claude => "https://api.anthropic.com/v1".to_string(),
                LlmProvider::OpenAi => "https://api.openai.com/v1".to_string(),
            },
        };

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url,
            provider: config.provider.clone(),
        })
    }

    /// Create with custom base URL (for testing or custom endpoints)
    pub fn with_base_url(config: &LlmConfig, base_url: String) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.base_url = base_url;
        Ok(client)
    }

    /// Generate a reply for the given user text.
    ///
    /// An empty completion is an error: the pipeline has nothing to
    /// synthesize from it.
    pub async fn complete(&self, user_text: &str) -> Result<String> {
        let text = match self.provider {
            LlmProvider::Claude => self.complete_claude(user_text).await?,
            LlmProvider::OpenAi => self.complete_openai(user_text).await?,
        };

        if text.trim().is_empty() {
            return Err(Error::Completion("Empty completion".to_string()));
        }

        Ok(text)
    }

    async fn complete_claude(&self, user_text: &str) -> Result<String> {
        let url = format!("{}/messages", self.base_url);

        debug!("Sending request to Claude API: {}", url);

        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: Some(SYSTEM_PROMPT.to_string()),
            messages: vec![ChatMessage::user(user_text)],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("Claude API error: {} - {}", status, body);
            return Err(Error::Completion(format!("{}: {}", status, body)));
        }

        let parsed: ClaudeResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Completion(format!("Failed to parse response: {} - {}", e, body)))?;

        info!(
            "Claude API response: stop_reason={:?}, {} chars",
            parsed.stop_reason,
            parsed.text().len()
        );

        Ok(parsed.text())
    }

    async fn complete_openai(&self, user_text: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!("Sending request to OpenAI-compatible API: {}", url);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(user_text),
            ],
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(Error::Completion(format!("{}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Completion(format!("Failed to parse response: {} - {}", e, body)))?;

        info!("OpenAI API response: {} chars", parsed.text().len());

        Ok(parsed.text())
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }
}
