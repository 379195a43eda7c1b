//! HTTP server
//!
//! Wires the webhook, the audio retrieval endpoint, and the liveness route
//! into one axum router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use vg_store::ObjectStore;

use crate::audio::serve_audio;
use crate::pipeline::Pipeline;
use crate::webhook::{handle_webhook, root};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn ObjectStore>,
}

/// Build the router.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/webhook", post(handle_webhook))
        .route("/audio/{key}", get(serve_audio))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and serve until the process exits.
pub async fn start_server(
    port: u16,
    pipeline: Arc<Pipeline>,
    store: Arc<dyn ObjectStore>,
) -> anyhow::Result<()> {
    let app = routes(AppState { pipeline, store });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("voicegate listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
