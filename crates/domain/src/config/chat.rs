use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Chat turn orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Deadline for one generation call.  `0` waits indefinitely.
    #[serde(default = "d_120")]
    pub generation_timeout_secs: u64,
    /// Remove the already-appended user message when generation fails or
    /// times out.  Off by default: history keeps the orphaned user turn.
    #[serde(default)]
    pub rollback_on_failure: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: d_120(),
            rollback_on_failure: false,
        }
    }
}

impl ChatConfig {
    pub fn generation_timeout(&self) -> Option<Duration> {
        (self.generation_timeout_secs > 0)
            .then(|| Duration::from_secs(self.generation_timeout_secs))
    }
}

fn d_120() -> u64 {
    120
}
