//! OpenAI-compatible adapter.
//!
//! Works with OpenAI, Ollama, vLLM, LM Studio, Together, and any other
//! endpoint that follows the OpenAI chat completions contract.

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

const PROVIDER_ID: &str = "openai_compat";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatGenerator {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl OpenAiCompatGenerator {
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

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    fn build_body(&self, req: &GenerationRequest) -> Value {
        let mut messages = Vec::with_capacity(req.history.len() + 2);
        messages.push(serde_json::json!({
            "role": "system",
            "content": build_system_prompt(&req.interface, &req.language),
        }));
        messages.extend(req.history.iter().map(msg_to_openai));
        messages.push(serde_json::json!({ "role": "user", "content": req.message }));

        serde_json::json!({
            "model": self.model,
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

fn msg_to_openai(msg: &Message) -> Value {
    serde_json::json!({
        "role": msg.role.as_str(),
        "content": msg.content,
    })
}

fn parse_chat_response(v: &Value) -> String {
    v.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string()
}

fn parse_usage(v: &Value) -> (Option<u32>, Option<u32>) {
    let usage = v.get("usage");
    let field = |name: &str| {
        usage
            .and_then(|u| u.get(name))
            .and_then(|n| n.as_u64())
            .map(|n| n as u32)
    };
    (field("prompt_tokens"), field("completion_tokens"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait impl
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl Generator for OpenAiCompatGenerator {
    async fn generate(&self, req: GenerationRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&req);

        tracing::debug!(
            provider = PROVIDER_ID,
            url = %url,
            session_id = %req.session_id,
            history = req.history.len(),
            "openai_compat chat request"
        );

        let started = Instant::now();
        let resp = self
            .retry
            .run("openai_compat.chat", || self.send_once(&url, &body))
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

        let text = parse_chat_response(&resp);
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
