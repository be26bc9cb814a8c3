//! # Pub/Sub Push Consumer
//!
//! Pub/Sub delivers each `process-document` message here. The pipeline runs to
//! completion before the response, which acknowledges the message. Pipeline
//! failures are recorded on the file record, never returned, so they do not
//! trigger redelivery.

use super::AppState;
use crate::worker::log_outcome;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use sigmascholar::providers::queue::PushEnvelope;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Default)]
pub struct PushParams {
    pub token: Option<String>,
}

/// Compares the delivered `?token=` with the configured one in constant time.
fn push_token_matches(given: Option<&str>, expected: &str) -> bool {
    given.is_some_and(|given| bool::from(given.as_bytes().ct_eq(expected.as_bytes())))
}

/// Handler for `POST /pubsub/process-document`.
pub async fn pubsub_push_handler(
    State(app_state): State<AppState>,
    Query(params): Query<PushParams>,
    Json(payload): Json<Value>,
) -> StatusCode {
    if let Some(expected) = &app_state.push_token {
        if !push_token_matches(params.token.as_deref(), expected) {
            warn!("Rejected push delivery with a missing or wrong token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    // Malformed messages can never succeed; acknowledge them so they are not redelivered.
    let envelope: PushEnvelope = match serde_json::from_value(payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Dropping push delivery with an unexpected shape: {e}");
            return StatusCode::NO_CONTENT;
        }
    };
    let request = match envelope.decode() {
        Ok(request) => request,
        Err(e) => {
            warn!(message_id = %envelope.message.message_id, "Dropping undecodable message: {e}");
            return StatusCode::NO_CONTENT;
        }
    };

    info!(message_id = %envelope.message.message_id, file_id = %request.file_id, "Received processing request");
    let outcome = app_state.executor.execute(&request).await;
    log_outcome(&request, &outcome);
    StatusCode::NO_CONTENT
}
