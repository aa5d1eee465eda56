//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Room for multipart framing and the `paperText` field on top of the file.
pub const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes + FORM_OVERHEAD_BYTES;

    let api = Router::new()
        .route("/summarize", post(handlers::summarize))
        .route("/literature-review", post(handlers::literature_review))
        .route("/test", get(handlers::api_test));

    Router::new()
        .nest("/api/paper-summarizer", api)
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
