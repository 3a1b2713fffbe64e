//! Storage key namespacing.
//!
//! Key template: `<prefix>:<session_id>:messages`.  The session identifier
//! is used verbatim: it is opaque to the store and never validated or
//! escaped, so two callers that agree on an identifier share a history
//! regardless of which interface they arrive from.

/// Builds namespaced storage keys for session histories.
#[derive(Debug, Clone)]
pub struct SessionKeys {
    prefix: String,
}

impl Default for SessionKeys {
    fn default() -> Self {
        Self::new("session")
    }
}

impl SessionKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key of the ordered message list for `session_id`.
    pub fn messages(&self, session_id: &str) -> String {
        format!("{}:{session_id}:messages", self.prefix)
    }
}
