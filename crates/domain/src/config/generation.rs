use serde::{Deserialize, Serialize};

use crate::retry::{RetryConfig, RetryPolicy};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation capability (LLM backend)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Anthropic Messages API.
    #[default]
    Anthropic,
    /// Any endpoint following the OpenAI chat completions contract
    /// (OpenAI, Ollama, vLLM, LM Studio, ...).
    OpenaiCompat,
}

/// Controls how the gateway handles a generator that fails to initialize
/// (typically a missing API key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartupPolicy {
    /// Boot anyway; `/chat` fails until credentials are configured.
    #[default]
    AllowNone,
    /// Abort startup.
    RequireOne,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub kind: GeneratorKind,
    /// API root.  Defaults depend on `kind`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key.  Defaults depend on `kind`.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Model identifier.  Defaults depend on `kind`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "d_4096")]
    pub max_tokens: u32,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    /// Per-HTTP-request timeout.
    #[serde(default = "d_120")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub startup_policy: StartupPolicy,
    #[serde(default)]
    pub retry: GenerationRetryConfig,
}

/// Retry settings for generation calls.
///
/// Separate from the store's [`RetryConfig`] so that fields missing from a
/// partial `[generation.retry]` table fall back to the generation defaults
/// (2 s initial wait, 30 s cap) rather than the store's.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRetryConfig {
    #[serde(default = "d_3")]
    pub max_attempts: u32,
    #[serde(default = "d_2000")]
    pub min_wait_ms: u64,
    #[serde(default = "d_30000")]
    pub max_wait_ms: u64,
}

impl Default for GenerationRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: d_3(),
            min_wait_ms: d_2000(),
            max_wait_ms: d_30000(),
        }
    }
}

impl GenerationRetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryConfig {
            max_attempts: self.max_attempts,
            min_wait_ms: self.min_wait_ms,
            max_wait_ms: self.max_wait_ms,
        }
        .policy()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            kind: GeneratorKind::default(),
            base_url: None,
            api_key_env: None,
            model: None,
            max_tokens: d_4096(),
            temperature: d_temperature(),
            request_timeout_secs: d_120(),
            startup_policy: StartupPolicy::default(),
            retry: GenerationRetryConfig::default(),
        }
    }
}

impl GenerationConfig {
    pub fn effective_base_url(&self) -> String {
        let url = self.base_url.clone().unwrap_or_else(|| match self.kind {
            GeneratorKind::Anthropic => "https://api.anthropic.com".into(),
            GeneratorKind::OpenaiCompat => "https://api.openai.com/v1".into(),
        });
        url.trim_end_matches('/').to_string()
    }

    pub fn effective_api_key_env(&self) -> String {
        self.api_key_env.clone().unwrap_or_else(|| match self.kind {
            GeneratorKind::Anthropic => "ANTHROPIC_API_KEY".into(),
            GeneratorKind::OpenaiCompat => "OPENAI_API_KEY".into(),
        })
    }

    pub fn effective_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.kind {
            GeneratorKind::Anthropic => "claude-sonnet-4-5-20250929".into(),
            GeneratorKind::OpenaiCompat => "gpt-4o".into(),
        })
    }
}

fn d_4096() -> u32 {
    4096
}
fn d_temperature() -> f32 {
    0.7
}
fn d_120() -> u64 {
    120
}
fn d_3() -> u32 {
    3
}
fn d_2000() -> u64 {
    2_000
}
fn d_30000() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_defaults() {
        let cfg: GenerationConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.kind, GeneratorKind::Anthropic);
        assert_eq!(cfg.effective_base_url(), "https://api.anthropic.com");
        assert_eq!(cfg.effective_api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(cfg.max_tokens, 4096);
        assert!((cfg.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.retry.min_wait_ms, 2_000);
        assert_eq!(cfg.retry.max_wait_ms, 30_000);
        assert_eq!(cfg.startup_policy, StartupPolicy::AllowNone);
    }

    #[test]
    fn openai_compat_overrides() {
        let cfg: GenerationConfig = toml::from_str(
            r#"
            kind = "openai_compat"
            base_url = "http://localhost:11434/v1/"
            model = "llama3.1"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.effective_base_url(), "http://localhost:11434/v1");
        assert_eq!(cfg.effective_model(), "llama3.1");
        assert_eq!(cfg.effective_api_key_env(), "OPENAI_API_KEY");
    }

    #[test]
    fn partial_retry_table_keeps_generation_defaults() {
        let cfg: GenerationConfig = toml::from_str("[retry]\nmax_attempts = 5").unwrap();
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.min_wait_ms, 2_000);
        assert_eq!(cfg.retry.max_wait_ms, 30_000);

        let policy = cfg.retry.policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay, std::time::Duration::from_secs(2));
        assert_eq!(policy.max_delay, std::time::Duration::from_secs(30));
    }
}
