//! voicegate: WhatsApp voice-assistant relay
//!
//! Main entry point. Receives Twilio webhook deliveries, runs the
//! voice/text reply pipeline, and serves synthesized audio back to the
//! gateway through the read-once audio endpoint.
//!
//! Usage:
//!   voicegate            - Start the server
//!   voicegate --help     - Show help

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vg_core::{Config, StoreBackend};
use vg_store::{DiskStore, MemoryStore, ObjectStore};

/// Run mode
enum RunMode {
    /// Server mode
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("voicegate {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting voicegate...");
    tracing::info!("Model: {}", config.llm.model);
    tracing::info!("Public base URL: {}", config.server.public_base_url);

    let store: Arc<dyn ObjectStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Disk => Arc::new(
            DiskStore::open(&config.store.dir)
                .map_err(|e| anyhow::anyhow!("Failed to open audio store: {}", e))?,
        ),
    };

    let pipeline = Arc::new(
        vg_server::adapters::build_pipeline(&config, store.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build pipeline: {}", e))?,
    );

    let port = config.server.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = vg_server::start_server(port, pipeline, store).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!("voicegate initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    server_handle.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("voicegate - WhatsApp voice-assistant relay");
    println!();
    println!("Usage:");
    println!("  voicegate            Start the server");
    println!("  voicegate --help     Show this help message");
    println!("  voicegate --version  Show version");
    println!();
    println!("Environment Variables:");
    println!("  TWILIO_ACCOUNT_SID   Twilio account SID (required)");
    println!("  TWILIO_AUTH_TOKEN    Twilio auth token (required)");
    println!("  TWILIO_FROM_NUMBER   Sending WhatsApp number (required)");
    println!("  ELEVENLABS_API_KEY   ElevenLabs API key (required)");
    println!("  ELEVENLABS_VOICE_ID  Voice identity for replies");
    println!("  LLM_API_KEY          LLM API key (required; or OPENAI_API_KEY)");
    println!("  LLM_MODEL            Model name (default: gpt-4o-mini)");
    println!("  LLM_PROVIDER         Provider: openai or claude (default: openai)");
    println!("  LLM_BASE_URL         Custom API endpoint");
    println!("  PUBLIC_BASE_URL      Externally reachable base URL (required)");
    println!("  PORT                 Listen port (default: 8787)");
    println!("  STORE_BACKEND        Audio store: memory or disk (default: memory)");
    println!("  STORE_DIR            Spool directory for the disk store");
    println!("  MAX_AUDIO_BYTES      Cap for one synthesized object");
}
