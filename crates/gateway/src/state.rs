use std::sync::Arc;

use brain_domain::config::Config;
use brain_providers::Generator;
use brain_sessions::ConversationStore;

use crate::runtime::metrics::Metrics;

/// Shared application state passed to all API handlers.
///
/// The store and generator are trait objects so tests can inject the
/// in-memory backend and a scripted generator.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ConversationStore>,
    pub generator: Arc<dyn Generator>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ConversationStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config,
            store,
            generator,
            metrics: Arc::new(Metrics::default()),
        }
    }
}
