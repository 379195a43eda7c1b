//! Inbound webhook handler
//!
//! The handler acknowledges the gateway immediately; the pipeline runs as
//! a detached task. The acknowledgment means "accepted for processing",
//! not "processed" — tokio keeps the spawned task alive after the HTTP
//! response completes.

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::event::InboundEvent;
use crate::server::AppState;

/// Synchronous acknowledgment body for every webhook delivery.
pub const WEBHOOK_ACK: &str = "Received. Thinking...";

/// Handle one inbound webhook delivery.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Form(event): Form<InboundEvent>,
) -> impl IntoResponse {
    info!(
        "Webhook: {:?} message {} from {}",
        event.message_type, event.message_sid, event.from
    );

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        pipeline.run(event).await;
    });

    (StatusCode::OK, WEBHOOK_ACK)
}

/// Liveness probe.
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "Server up and running!")
}
