//! Read-once audio retrieval endpoint
//!
//! The gateway fetches the media URL advertised by delivery exactly once;
//! serving the object claims it, so a second fetch of the same key is a
//! 404. That 404 is the expected terminal state of every served key.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::server::AppState;

/// Body of the 404 response for consumed or unknown keys.
pub const NOT_FOUND_BODY: &str = "Object Not Found";

/// Serve one stored audio object and consume its key.
pub async fn serve_audio(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.store.take(&key).await {
        Ok(Some(bytes)) => {
            info!("Serving audio object {} ({} bytes)", key, bytes.len());

            let etag = format!("\"{}\"", hex::encode(Sha256::digest(&bytes)));

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "audio/ogg".to_string()),
                    (header::ETAG, etag),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
        Err(e) => {
            warn!("Audio retrieval failed for {}: {}", key, e);
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
        }
    }
}
