use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::api::headers::SessionHeader;
use crate::state::AppState;

/// `POST /reset-session`: drop all history for the session.  Resetting a
/// session that has no history succeeds.
pub async fn reset_session(
    State(state): State<AppState>,
    header: SessionHeader,
) -> impl IntoResponse {
    match state.store.reset_session(&header.session_id).await {
        Ok(()) => {
            state.metrics.record_reset();
            Json(serde_json::json!({
                "status": "reset",
                "session_id": header.session_id,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!(session_id = %header.session_id, error = %e, "session reset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "detail": e.to_string(),
                    "kind": "store",
                })),
            )
                .into_response()
        }
    }
}
