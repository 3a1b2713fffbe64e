//! Redis-backed conversation store.
//!
//! Layout: one list per session at `<prefix>:<session_id>:messages`, each
//! element a JSON `{"role","content"}` record, oldest at the head.  Appends
//! run `RPUSH` + `LTRIM -cap -1` inside a single `MULTI/EXEC` so readers
//! never observe the untrimmed list.
//!
//! The connection is established lazily on first use and then managed by
//! [`ConnectionManager`], which reconnects on its own after a drop.  The
//! service can therefore boot while Redis is still unavailable.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use brain_domain::error::{Error, Result};
use brain_domain::message::{Message, Role};
use brain_domain::trace::TraceEvent;

use crate::session_key::SessionKeys;
use crate::store::ConversationStore;

pub struct RedisStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    keys: SessionKeys,
    max_messages: usize,
}

impl RedisStore {
    /// Validate `url` and prepare a store.  No network I/O happens here.
    pub fn open(url: &str, keys: SessionKeys, max_messages: usize) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Config(format!("redis url: {e}")))?;

        tracing::info!(
            addr = %client.get_connection_info().addr,
            db = client.get_connection_info().redis.db,
            max_messages,
            "redis session store configured"
        );

        Ok(Self {
            client,
            conn: OnceCell::new(),
            keys,
            max_messages: max_messages.max(1),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = self
                    .client
                    .get_connection_manager()
                    .await
                    .map_err(from_redis)?;
                tracing::info!("connected to redis");
                Ok::<_, Error>(conn)
            })
            .await?;
        Ok(conn.clone())
    }

    fn encode(role: Role, content: &str) -> Result<String> {
        Ok(serde_json::to_string(&Message::new(role, content))?)
    }
}

/// Map a Redis error onto the domain taxonomy: connectivity problems are
/// [`Error::StoreUnavailable`] (retryable), everything else [`Error::Store`].
pub fn from_redis(e: redis::RedisError) -> Error {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        Error::StoreUnavailable(e.to_string())
    } else {
        Error::Store(e.to_string())
    }
}

/// Decode stored list elements, skipping entries that are not valid
/// message records.
fn decode_all(session_id: &str, raw: Vec<String>) -> Vec<Message> {
    raw.into_iter()
        .filter_map(|entry| match serde_json::from_str::<Message>(&entry) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "skipping malformed history entry"
                );
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl ConversationStore for RedisStore {
    async fn get_conversation(&self, session_id: &str) -> Result<Vec<Message>> {
        let key = self.keys.messages(session_id);
        let mut conn = self.connection().await?;
        let raw: Vec<String> = conn.lrange(&key, 0, -1).await.map_err(from_redis)?;
        Ok(decode_all(session_id, raw))
    }

    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let key = self.keys.messages(session_id);
        let payload = Self::encode(role, content)?;
        let cap = self.max_messages as isize;

        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .rpush(&key, payload)
            .ignore()
            .ltrim(&key, -cap, -1)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(from_redis)?;

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
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(&key).await.map_err(from_redis)?;

        TraceEvent::SessionReset {
            session_id: session_id.to_owned(),
        }
        .emit();
        Ok(())
    }

    async fn retract_message(&self, session_id: &str, role: Role, content: &str) -> Result<bool> {
        let key = self.keys.messages(session_id);
        let payload = Self::encode(role, content)?;
        let mut conn = self.connection().await?;
        // Negative count scans from the tail: removes the newest match only.
        let removed: i64 = conn.lrem(&key, -1, payload).await.map_err(from_redis)?;

        TraceEvent::MessageRetracted {
            session_id: session_id.to_owned(),
            role: role.to_string(),
            removed: removed > 0,
        }
        .emit();
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(from_redis)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
