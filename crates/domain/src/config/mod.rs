mod chat;
mod generation;
mod observability;
mod server;
mod store;

pub use chat::*;
pub use generation::*;
pub use observability::*;
pub use server::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Environment overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl Config {
    /// Apply deployment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides using `lookup` to resolve variable names.
    ///
    /// Recognized: `BRAIN_HOST`, `BRAIN_PORT`, `REDIS_URL`, `REDIS_HOST`,
    /// `REDIS_PORT`, `REDIS_DB`.  Unparseable numbers are ignored with a
    /// warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BRAIN_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_var(&lookup, "BRAIN_PORT") {
            self.server.port = port;
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.store.redis_url = Some(url);
        }
        if let Some(host) = lookup("REDIS_HOST") {
            self.store.redis_host = host;
        }
        if let Some(port) = parse_var(&lookup, "REDIS_PORT") {
            self.store.redis_port = port;
        }
        if let Some(db) = parse_var(&lookup, "REDIS_DB") {
            self.store.redis_db = db;
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |severity, field: &str, message: &str| {
            errors.push(ConfigError {
                severity,
                field: field.into(),
                message: message.into(),
            });
        };

        if self.server.port == 0 {
            push(ConfigSeverity::Error, "server.port", "port must be greater than 0");
        }
        if self.server.host.is_empty() {
            push(ConfigSeverity::Error, "server.host", "host must not be empty");
        }
        if self.server.max_concurrent_requests == 0 {
            push(
                ConfigSeverity::Error,
                "server.max_concurrent_requests",
                "must be greater than 0",
            );
        }
        if let Some(rl) = &self.server.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                push(
                    ConfigSeverity::Error,
                    "server.rate_limit",
                    "requests_per_second and burst_size must be greater than 0",
                );
            }
        }

        if self.store.max_messages == 0 {
            push(ConfigSeverity::Error, "store.max_messages", "must be greater than 0");
        }
        if self.store.key_prefix.is_empty() {
            push(ConfigSeverity::Error, "store.key_prefix", "must not be empty");
        }
        if self.store.backend == StoreBackend::Memory {
            push(
                ConfigSeverity::Warning,
                "store.backend",
                "memory backend loses all history on restart",
            );
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            push(
                ConfigSeverity::Error,
                "generation.temperature",
                "temperature must be between 0.0 and 2.0",
            );
        }
        if self.generation.max_tokens == 0 {
            push(ConfigSeverity::Error, "generation.max_tokens", "must be greater than 0");
        }
        if self.generation.request_timeout_secs == 0 {
            push(
                ConfigSeverity::Error,
                "generation.request_timeout_secs",
                "must be greater than 0: a zero timeout fails every provider call",
            );
        }

        if self.chat.generation_timeout_secs == 0 {
            push(
                ConfigSeverity::Warning,
                "chat.generation_timeout_secs",
                "no deadline: a hung generation call holds its request open indefinitely",
            );
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            push(
                ConfigSeverity::Error,
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            );
        }

        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            push(
                ConfigSeverity::Warning,
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            );
        }

        errors
    }
}
