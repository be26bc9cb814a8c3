//! # Ingestion Trigger
//!
//! The callable entry point the extension hits after an upload. It only
//! validates and enqueues; processing happens on the queue consumer side.

use super::{AppError, AppState};
use crate::{
    auth::AuthenticatedUser,
    types::{CallableResult, ProcessDocumentPayload, ProcessDocumentResponse, TriggerBody},
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use sigmascholar::IngestionRequest;
use tracing::info;

/// Builds the queue message, using the verified caller as the owner.
pub fn build_request(
    user_id: &str,
    payload: ProcessDocumentPayload,
) -> Result<IngestionRequest, AppError> {
    let blank = [
        ("fileId", &payload.file_id),
        ("storagePath", &payload.storage_path),
        ("fileName", &payload.file_name),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect::<Vec<_>>();

    if !blank.is_empty() {
        return Err(AppError::invalid_argument(format!(
            "Missing required field(s): {}",
            blank.join(", ")
        )));
    }

    Ok(IngestionRequest {
        user_id: user_id.to_string(),
        file_id: payload.file_id,
        storage_path: payload.storage_path,
        file_name: payload.file_name,
    })
}

/// Handler for `POST /process-document`.
///
/// Errors mirror the request: a callable `{"data": ...}` request gets the
/// callable error envelope, a bare request gets `{"error": "..."}`.
pub async fn process_document_handler(
    State(app_state): State<AppState>,
    caller: Result<AuthenticatedUser, AppError>,
    Json(payload): Json<Value>,
) -> Response {
    let callable = payload
        .as_object()
        .is_some_and(|body| body.contains_key("data"));

    match enqueue(&app_state, caller, payload).await {
        Ok(response) if callable => Json(CallableResult { result: response }).into_response(),
        Ok(response) => Json(response).into_response(),
        Err(err) if callable => err.into_callable_response(),
        Err(err) => err.into_response(),
    }
}

async fn enqueue(
    app_state: &AppState,
    caller: Result<AuthenticatedUser, AppError>,
    payload: Value,
) -> Result<ProcessDocumentResponse, AppError> {
    let AuthenticatedUser(user_id) = caller?;
    let body: TriggerBody = serde_json::from_value(payload)
        .map_err(|e| AppError::invalid_argument(format!("Malformed request body: {e}")))?;
    let payload = match body {
        TriggerBody::Callable { data } => data,
        TriggerBody::Direct(payload) => payload,
    };

    let request = build_request(&user_id, payload)?;
    let message_id = app_state.publisher.publish(&request).await?;
    info!(%user_id, file_id = %request.file_id, %message_id, "Document processing queued");

    Ok(ProcessDocumentResponse {
        success: true,
        message: "Document processing started".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ProcessDocumentPayload {
        ProcessDocumentPayload {
            file_id: "f1".into(),
            storage_path: "u1/f.pdf".into(),
            file_name: "f.pdf".into(),
        }
    }

    #[test]
    fn request_owner_comes_from_the_caller() {
        let request = build_request("u1", payload()).unwrap();
        assert_eq!(request.user_id, "u1");
        assert_eq!(request.storage_path, "u1/f.pdf");
    }

    #[test]
    fn blank_fields_are_named_in_the_error() {
        let err = build_request(
            "u1",
            ProcessDocumentPayload {
                file_name: "  ".into(),
                ..payload()
            },
        )
        .unwrap_err();
        let AppError::Ingest(sigmascholar::IngestError::InvalidArgument(message)) = err else {
            panic!("expected an invalid argument error");
        };
        assert!(message.contains("fileName"));
    }
}
