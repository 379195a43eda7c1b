//! Configuration management
//!
//! Settings are resolved in the following priority order:
//! 1. Environment variables
//! 2. voicegate.toml configuration file
//! 3. Default values
//!
//! Inside the config file, `${VAR_NAME}` expands to the value of the
//! corresponding environment variable.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

/// LLM provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible API (chat completions)
    #[default]
    OpenAi,
    /// Anthropic Claude API (messages)
    Claude,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API provider
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::OpenAi,
            base_url: None,
        }
    }
}

fn default_model() -> String {
    // Small, low-latency tier; replies are a sentence or two.
    "gpt-4o-mini".to_string()
}

/// Twilio gateway credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwilioConfig {
    /// Account SID
    pub account_sid: String,

    /// Auth token
    pub auth_token: String,

    /// Sending WhatsApp number (without the `whatsapp:` prefix)
    pub from_number: String,
}

/// ElevenLabs speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    /// API key
    pub api_key: String,

    /// Voice identity used for all synthesized replies
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: default_voice_id(),
        }
    }
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL used to construct media links
    /// (e.g., "https://voicegate.example.com", no trailing slash)
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_base_url: String::new(),
        }
    }
}

fn default_port() -> u16 {
    8787
}

/// Audio store backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map (default; the audio endpoint shares the process)
    #[default]
    Memory,
    /// Spool directory on disk
    Disk,
}

/// Audio store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: StoreBackend,

    /// Spool directory for the disk backend
    #[serde(default = "default_store_dir")]
    pub dir: String,

    /// Maximum accepted size for one synthesized audio object, in bytes.
    /// The TTS provider imposes no cap of its own.
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            dir: default_store_dir(),
            max_audio_bytes: default_max_audio_bytes(),
        }
    }
}

fn default_store_dir() -> String {
    "data/audio".to_string()
}

fn default_max_audio_bytes() -> usize {
    8 * 1024 * 1024
}

/// Main configuration for voicegate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Twilio gateway credentials
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// ElevenLabs speech configuration
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Audio store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Expand `${VAR_NAME}` references to environment variable values.
    ///
    /// Unset variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file.
    ///
    /// `${VAR_NAME}` references in the file are expanded first; existing
    /// environment variables then override the file's values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let toml_content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let mut config: Config = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from the default locations.
    ///
    /// Tries `./voicegate.toml` first, then falls back to environment
    /// variables only.
    pub fn load() -> crate::Result<Self> {
        if Path::new("voicegate.toml").exists() {
            return Self::from_toml_file("voicegate.toml");
        }

        Self::from_env()
    }

    /// Override file-derived settings with environment variables.
    fn apply_env_overrides(&mut self) {
        if let Ok(sid) = std::env::var("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = sid;
        }
        if let Ok(token) = std::env::var("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = token;
        }
        if let Ok(number) = std::env::var("TWILIO_FROM_NUMBER") {
            self.twilio.from_number = number;
        }

        if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
            self.elevenlabs.api_key = key;
        }
        if let Ok(voice) = std::env::var("ELEVENLABS_VOICE_ID") {
            if !voice.is_empty() {
                self.elevenlabs.voice_id = voice;
            }
        }

        if let Ok(key) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = key;
        } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            if !provider.is_empty() {
                self.llm.provider = match provider.to_lowercase().as_str() {
                    "claude" | "anthropic" => LlmProvider::Claude,
                    _ => LlmProvider::OpenAi,
                };
            }
        }
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            if !base_url.is_empty() {
                self.llm.base_url = Some(base_url);
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
            self.server.public_base_url = url;
        }

        if let Ok(backend) = std::env::var("STORE_BACKEND") {
            if backend.to_lowercase() == "disk" {
                self.store.backend = StoreBackend::Disk;
            }
        }
        if let Ok(dir) = std::env::var("STORE_DIR") {
            self.store.dir = dir;
        }
        if let Ok(max) = std::env::var("MAX_AUDIO_BYTES") {
            if let Ok(m) = max.parse() {
                self.store.max_audio_bytes = m;
            }
        }
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check that required settings are present.
    pub fn validate(&self) -> crate::Result<()> {
        if self.twilio.account_sid.is_empty() {
            return Err(Error::Config("TWILIO_ACCOUNT_SID not set".to_string()));
        }
        if self.twilio.auth_token.is_empty() {
            return Err(Error::Config("TWILIO_AUTH_TOKEN not set".to_string()));
        }
        if self.twilio.from_number.is_empty() {
            return Err(Error::Config("TWILIO_FROM_NUMBER not set".to_string()));
        }
        if self.elevenlabs.api_key.is_empty() {
            return Err(Error::Config("ELEVENLABS_API_KEY not set".to_string()));
        }
        if self.llm.api_key.is_empty() {
            return Err(Error::Config(
                "LLM_API_KEY or OPENAI_API_KEY not set".to_string(),
            ));
        }
        if self.server.public_base_url.is_empty() {
            return Err(Error::Config("PUBLIC_BASE_URL not set".to_string()));
        }
        Ok(())
    }
}
