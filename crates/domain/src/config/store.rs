use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Retention cap applied to every session's message list.
pub const DEFAULT_MAX_MESSAGES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local map.  History is lost on restart; intended for tests
    /// and single-process development.
    Memory,
    /// External Redis list per session.
    #[default]
    Redis,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Redis => "redis",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Full connection URL.  When set, takes precedence over the
    /// host/port/db triple.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "d_redis_host")]
    pub redis_host: String,
    #[serde(default = "d_6379")]
    pub redis_port: u16,
    #[serde(default)]
    pub redis_db: u32,
    /// Namespace prepended to every session key.
    #[serde(default = "d_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "d_max_messages")]
    pub max_messages: usize,
    /// Back-off for idempotent store operations (reads, deletes, pings).
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: None,
            redis_host: d_redis_host(),
            redis_port: d_6379(),
            redis_db: 0,
            key_prefix: d_key_prefix(),
            max_messages: d_max_messages(),
            retry: RetryConfig::default(),
        }
    }
}

impl StoreConfig {
    /// The effective Redis connection URL.
    pub fn connection_url(&self) -> String {
        match &self.redis_url {
            Some(url) => url.clone(),
            None => format!(
                "redis://{}:{}/{}",
                self.redis_host, self.redis_port, self.redis_db
            ),
        }
    }
}

fn d_redis_host() -> String {
    "localhost".into()
}
fn d_6379() -> u16 {
    6379
}
fn d_key_prefix() -> String {
    "session".into()
}
fn d_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}
