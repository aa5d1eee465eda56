//! Liveness endpoints and the JSON 404.

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use super::super::AppState;

/// Smoke test for the summarizer API.
pub async fn api_test() -> impl IntoResponse {
    Json(json!({
        "message": "Paper Summarizer API is working!",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Health check endpoint for container orchestration.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let selector = state.summarizer.selector();
    let api_key = if state.settings.llm.has_api_key() {
        "Configured"
    } else {
        "Not configured"
    };

    Json(json!({
        "status": "UP",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "environment": {
            "geminiApiKey": api_key,
            "models": {
                "candidates": selector.candidates(),
                "selected": selector.selected(),
            },
        },
    }))
}

/// Fallback for unknown routes.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found",
            "path": uri.path(),
        })),
    )
}
