//! Liveness and readiness probes. No authentication.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use super::extract::Json;
use crate::state::AppState;

/// Pure liveness: the process is up and serving.
pub async fn live() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Readiness: the store answers.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.gateway.health_check().await {
        (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        )
    } else {
        tracing::warn!("Readiness check failed: database down");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "database": "down" })),
        )
    }
}
