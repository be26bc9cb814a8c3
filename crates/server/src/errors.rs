use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sigmascholar::IngestError;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the server,
/// allowing them to be converted into appropriate HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors originating from the `sigmascholar` pipeline and its providers.
    Ingest(IngestError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::Ingest(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl AppError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        AppError::Ingest(IngestError::Authentication(message.into()))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AppError::Ingest(IngestError::InvalidArgument(message.into()))
    }
}

impl AppError {
    /// Logs the error and resolves its HTTP status, callable status name and
    /// client-facing message.
    fn resolve(self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Ingest(err) => {
                let (status, callable_status) = match &err {
                    IngestError::Authentication(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
                    IngestError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
                    IngestError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    IngestError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UNAVAILABLE"),
                    IngestError::Operation(_)
                    | IngestError::Database(_)
                    | IngestError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
                };
                if status.is_server_error() {
                    error!("IngestError: {:?}", err);
                } else {
                    warn!("Rejected request: {}", err);
                }
                (status, callable_status, err.to_string())
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal server error occurred.".to_string(),
                )
            }
        }
    }

    /// The Firebase callable error envelope:
    /// `{"error": {"status": "UNAUTHENTICATED", "message": "..."}}`.
    pub fn into_callable_response(self) -> Response {
        let (status_code, callable_status, message) = self.resolve();
        let body = Json(json!({
            "error": {
                "status": callable_status,
                "message": message,
            },
        }));
        (status_code, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, _, error_message) = self.resolve();

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
