//! Liveness, readiness and runtime counters.
//!
//! - `GET /health`       static liveness; touches no dependency
//! - `GET /health/ready` pings the session store
//! - `GET /metrics`      JSON counters

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": VERSION,
    }))
}

pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.store.backend();
    let (status, store) = match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            serde_json::json!({ "backend": backend, "status": "up" }),
        ),
        Err(e) => {
            tracing::warn!(backend, error = %e, "readiness check: store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "backend": backend, "status": "down", "error": e.to_string() }),
            )
        }
    };

    let overall = if status.is_success() { "healthy" } else { "unhealthy" };
    (
        status,
        Json(serde_json::json!({
            "status": overall,
            "version": VERSION,
            "components": {
                "store": store,
                "generator": {
                    "provider": state.generator.provider_id(),
                    "model": state.generator.model(),
                },
            },
        })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot(state.store.backend()))
}
