use super::{handlers, state::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/process-document", post(handlers::process_document_handler))
        .route(
            "/pubsub/process-document",
            post(handlers::pubsub_push_handler),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
