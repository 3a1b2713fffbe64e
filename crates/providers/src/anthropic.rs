//! Anthropic-native adapter.
//!
//! Uses the Anthropic Messages API, where the system prompt goes in a
//! separate top-level `system` field rather than in the message list.

use std::time::Instant;

use brain_domain::config::GenerationConfig;
use brain_domain::error::Result;
use brain_domain::message::Message;
use brain_domain::retry::RetryPolicy;
use brain_domain::trace::TraceEvent;
use serde_json::Value;

use crate::prompt::{build_system_prompt, EMPTY_COMPLETION_FALLBACK};
use crate::traits::{GenerationRequest, Generator};
use crate::util::{from_reqwest, http_client, resolve_api_key, status_error};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER_ID: &str = "anthropic";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A generator backed by the Anthropic Messages API.
pub struct AnthropicGenerator {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    /// Create a generator from config, reading the API key from the
    /// configured environment variable.
    pub fn from_config(cfg: &GenerationConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.effective_api_key_env())?;
        Self::with_api_key(cfg, api_key)
    }

    pub fn with_api_key(cfg: &GenerationConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            base_url: cfg.effective_base_url(),
            api_key,
            model: cfg.effective_model(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            retry: cfg.retry.policy(),
            client: http_client(cfg.request_timeout_secs)?,
        })
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
    }

    fn build_body(&self, req: &GenerationRequest) -> Value {
        let mut messages: Vec<Value> = req.history.iter().map(msg_to_anthropic).collect();
        messages.push(serde_json::json!({ "role": "user", "content": req.message }));

        serde_json::json!({
            "model": self.model,
            "system": build_system_prompt(&req.interface, &req.language),
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        })
    }

    async fn send_once(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = self
            .authed_post(url)
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(status_error(PROVIDER_ID, status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire format
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn msg_to_anthropic(msg: &Message) -> Value {
    serde_json::json!({
        "role": msg.role.as_str(),
        "content": msg.content,
    })
}

/// Concatenate all `text` content blocks of a Messages API response.
fn parse_text(v: &Value) -> String {
    v.get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

fn parse_usage(v: &Value) -> (Option<u32>, Option<u32>) {
    let usage = v.get("usage");
    let field = |name: &str| {
        usage
            .and_then(|u| u.get(name))
            .and_then(|n| n.as_u64())
            .map(|n| n as u32)
    };
    (field("input_tokens"), field("output_tokens"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait impl
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl Generator for AnthropicGenerator {
    async fn generate(&self, req: GenerationRequest) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_body(&req);

        tracing::debug!(
            provider = PROVIDER_ID,
            url = %url,
            session_id = %req.session_id,
            history = req.history.len(),
            "anthropic messages request"
        );

        let started = Instant::now();
        let resp = self
            .retry
            .run("anthropic.messages", || self.send_once(&url, &body))
            .await?;

        let (input_tokens, output_tokens) = parse_usage(&resp);
        TraceEvent::LlmRequest {
            provider: PROVIDER_ID.into(),
            model: self.model.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            input_tokens,
            output_tokens,
        }
        .emit();

        let text = parse_text(&resp);
        if text.is_empty() {
            tracing::warn!(provider = PROVIDER_ID, "empty completion");
            return Ok(EMPTY_COMPLETION_FALLBACK.to_string());
        }
        Ok(text)
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> AnthropicGenerator {
        AnthropicGenerator::with_api_key(&GenerationConfig::default(), "sk-test".into()).unwrap()
    }

    #[test]
    fn body_places_system_prompt_at_top_level() {
        let req = GenerationRequest {
            message: "How are you?".into(),
            history: vec![Message::user("Hello"), Message::assistant("Hi there")],
            interface: "voice".into(),
            language: "en".into(),
            ..Default::default()
        };
        let body = generator().build_body(&req);

        assert_eq!(body["model"], "claude-sonnet-4-5-20250929");
        assert_eq!(body["max_tokens"], 4096);
        assert!(body["system"].as_str().unwrap().contains("via voice"));

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "How are you?");
    }

    #[test]
    fn parses_text_blocks_and_ignores_others() {
        let v = serde_json::json!({
            "content": [
                { "type": "text", "text": "Hi " },
                { "type": "tool_use", "id": "x", "name": "n", "input": {} },
                { "type": "text", "text": "there" }
            ],
            "usage": { "input_tokens": 12, "output_tokens": 3 }
        });
        assert_eq!(parse_text(&v), "Hi there");
        assert_eq!(parse_usage(&v), (Some(12), Some(3)));
    }

    #[test]
    fn missing_content_parses_as_empty() {
        let v = serde_json::json!({ "id": "msg_1" });
        assert_eq!(parse_text(&v), "");
        assert_eq!(parse_usage(&v), (None, None));
    }

    #[test]
    fn base_url_is_normalised() {
        let cfg = GenerationConfig {
            base_url: Some("http://localhost:9999/".into()),
            ..Default::default()
        };
        let g = AnthropicGenerator::with_api_key(&cfg, "k".into()).unwrap();
        assert_eq!(g.base_url, "http://localhost:9999");
    }
}
