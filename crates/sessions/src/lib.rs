//! Session-scoped conversation storage for the brain service.
//!
//! Each session is an opaque caller-supplied identifier mapped to one
//! bounded, ordered message list.  Sessions have no metadata record: a
//! session exists as soon as a message is written under its key and
//! disappears when the key is reset.

pub mod memory;
pub mod redis_store;
pub mod retrying;
pub mod session_key;
pub mod store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use retrying::RetryingStore;
pub use session_key::SessionKeys;
pub use store::ConversationStore;
