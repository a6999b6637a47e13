//! HTTP handlers for enhance-service.

pub mod enhance;

use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "enhance-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness probe: not ready until a usable API key is configured.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.enhancer.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "reason": "api key not configured" })),
        )
    }
}
