pub mod chat;
pub mod headers;
pub mod health;
pub mod sessions;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router.  No route requires authentication.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(health::metrics))
        .route("/chat", post(chat::chat))
        .route("/reset-session", post(sessions::reset_session))
}
