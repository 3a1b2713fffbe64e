//! Process-local conversation store.
//!
//! Backs tests and single-process development.  Keys are spread over a
//! fixed set of independently locked shards: a session's append+trim runs
//! under its shard's write lock, and sessions in other shards never wait
//! on it.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use parking_lot::RwLock;

use brain_domain::config::DEFAULT_MAX_MESSAGES;
use brain_domain::error::Result;
use brain_domain::message::{Message, Role};
use brain_domain::trace::TraceEvent;

use crate::session_key::SessionKeys;
use crate::store::ConversationStore;

const SHARD_COUNT: usize = 16;

type Shard = RwLock<HashMap<String, VecDeque<Message>>>;

/// In-memory conversation store keyed by namespaced session key.
pub struct MemoryStore {
    keys: SessionKeys,
    max_messages: usize,
    shards: Box<[Shard]>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(SessionKeys::default(), DEFAULT_MAX_MESSAGES)
    }
}

impl MemoryStore {
    pub fn new(keys: SessionKeys, max_messages: usize) -> Self {
        Self {
            keys,
            max_messages: max_messages.max(1),
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    /// Whether any history is stored under `session_id`.
    pub fn contains(&self, session_id: &str) -> bool {
        let key = self.keys.messages(session_id);
        self.shard(&key).read().contains_key(&key)
    }

    /// Number of sessions with stored history.
    pub fn session_count(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    fn shard_index(key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % SHARD_COUNT
    }

    fn shard(&self, key: &str) -> &Shard {
        &self.shards[Self::shard_index(key)]
    }
}

#[async_trait::async_trait]
impl ConversationStore for MemoryStore {
    async fn get_conversation(&self, session_id: &str) -> Result<Vec<Message>> {
        let key = self.keys.messages(session_id);
        Ok(self
            .shard(&key)
            .read()
            .get(&key)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let key = self.keys.messages(session_id);
        {
            let mut shard = self.shard(&key).write();
            let log = shard.entry(key).or_default();
            log.push_back(Message::new(role, content));
            while log.len() > self.max_messages {
                log.pop_front();
            }
        }

        TraceEvent::MessageAppended {
            session_id: session_id.to_owned(),
            role: role.to_string(),
            content_chars: content.chars().count(),
        }
        .emit();
        Ok(())
    }

    async fn reset_session(&self, session_id: &str) -> Result<()> {
        let key = self.keys.messages(session_id);
        self.shard(&key).write().remove(&key);

        TraceEvent::SessionReset {
            session_id: session_id.to_owned(),
        }
        .emit();
        Ok(())
    }

    async fn retract_message(&self, session_id: &str, role: Role, content: &str) -> Result<bool> {
        let key = self.keys.messages(session_id);
        let removed = {
            let mut shard = self.shard(&key).write();
            match shard.get_mut(&key) {
                Some(log) => {
                    let pos = log
                        .iter()
                        .rposition(|m| m.role == role && m.content == content);
                    if let Some(pos) = pos {
                        log.remove(pos);
                    }
                    if log.is_empty() {
                        shard.remove(&key);
                    }
                    pos.is_some()
                }
                None => false,
            }
        };

        TraceEvent::MessageRetracted {
            session_id: session_id.to_owned(),
            role: role.to_string(),
            removed,
        }
        .emit();
        Ok(removed)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
