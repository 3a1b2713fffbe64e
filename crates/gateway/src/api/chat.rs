//! `POST /chat`: run one conversational turn.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::api::headers::ChatHeaders;
use crate::runtime::{run_chat_turn, TurnError, TurnInput};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / response shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Originating channel, free-form (`voice`, `telegram`, `api`, ...).
    #[serde(default = "d_interface")]
    pub interface: String,
    #[serde(default = "d_language")]
    pub language: String,
}

fn d_interface() -> String {
    "api".into()
}
fn d_language() -> String {
    "en".into()
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// Reserved; always empty.
    pub actions: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error mapping
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl IntoResponse for TurnError {
    fn into_response(self) -> Response {
        let status = match self {
            TurnError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            TurnError::Store(_) | TurnError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({
                "detail": self.to_string(),
                "kind": self.kind(),
            })),
        )
            .into_response()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(
    State(state): State<AppState>,
    headers: ChatHeaders,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, TurnError> {
    tracing::debug!(
        session_id = %headers.session_id,
        user_id = %headers.user_id,
        interface = %body.interface,
        language = %body.language,
        "chat turn"
    );

    let input = TurnInput {
        user_id: headers.user_id,
        session_id: headers.session_id.clone(),
        message: body.message,
        interface: body.interface,
        language: body.language,
    };

    match run_chat_turn(&state, input).await {
        Ok(response) => Ok(Json(ChatResponse {
            response,
            actions: Vec::new(),
        })),
        Err(e) => {
            tracing::error!(
                session_id = %headers.session_id,
                kind = e.kind(),
                error = %e,
                "chat turn failed"
            );
            Err(e)
        }
    }
}
