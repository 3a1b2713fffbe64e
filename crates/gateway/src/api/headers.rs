//! Routing identifiers carried in request headers.
//!
//! Clients send `user_id` / `session_id`; the hyphenated spellings
//! `user-id` / `session-id` are accepted too, since some proxies drop
//! header names containing underscores.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};

const USER_ID: [&str; 2] = ["user_id", "user-id"];
const SESSION_ID: [&str; 2] = ["session_id", "session-id"];

/// Rejection for a required header that is absent or blank.
#[derive(Debug)]
pub struct MissingHeader(pub &'static str);

impl IntoResponse for MissingHeader {
    fn into_response(self) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "detail": format!("missing required header: {}", self.0),
            })),
        )
            .into_response()
    }
}

fn lookup(headers: &HeaderMap, names: &[&'static str; 2]) -> Result<String, MissingHeader> {
    names
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(MissingHeader(names[0]))
}

/// `user_id` + `session_id`, both required.
#[derive(Debug, Clone)]
pub struct ChatHeaders {
    pub user_id: String,
    pub session_id: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ChatHeaders {
    type Rejection = MissingHeader;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            user_id: lookup(&parts.headers, &USER_ID)?,
            session_id: lookup(&parts.headers, &SESSION_ID)?,
        })
    }
}

/// `session_id` only.
#[derive(Debug, Clone)]
pub struct SessionHeader {
    pub session_id: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionHeader {
    type Rejection = MissingHeader;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            session_id: lookup(&parts.headers, &SESSION_ID)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn accepts_either_spelling() {
        let mut headers = HeaderMap::new();
        headers.insert("session-id", HeaderValue::from_static("s1"));
        assert_eq!(lookup(&headers, &SESSION_ID).unwrap(), "s1");

        headers.insert("session_id", HeaderValue::from_static("s2"));
        assert_eq!(lookup(&headers, &SESSION_ID).unwrap(), "s2");
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert("user_id", HeaderValue::from_static("  "));
        let err = lookup(&headers, &USER_ID).unwrap_err();
        assert_eq!(err.0, "user_id");
    }
}
