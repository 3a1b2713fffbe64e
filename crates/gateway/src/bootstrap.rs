//! Build the shared [`AppState`] from configuration.

use std::sync::Arc;

use anyhow::Context;
use brain_domain::config::{Config, StoreBackend, StoreConfig};
use brain_providers::build_generator;
use brain_sessions::{ConversationStore, MemoryStore, RedisStore, RetryingStore, SessionKeys};

use crate::state::AppState;

pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let store = build_store(&config.store).context("initializing session store")?;
    let generator = build_generator(&config.generation).context("initializing generator")?;
    Ok(AppState::new(config, store, generator))
}

/// Construct the configured store backend.  Redis is wrapped in the
/// retrying decorator; the connection itself is made on first use.
pub fn build_store(cfg: &StoreConfig) -> brain_domain::Result<Arc<dyn ConversationStore>> {
    let keys = SessionKeys::new(cfg.key_prefix.clone());

    let store: Arc<dyn ConversationStore> = match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(keys, cfg.max_messages)),
        StoreBackend::Redis => {
            let redis = RedisStore::open(&cfg.connection_url(), keys, cfg.max_messages)?;
            Arc::new(RetryingStore::new(redis, cfg.retry.policy()))
        }
    };

    tracing::info!(
        backend = store.backend(),
        key_prefix = %cfg.key_prefix,
        max_messages = cfg.max_messages,
        "session store ready"
    );
    Ok(store)
}
