//! The conversation store contract.

use brain_domain::error::Result;
use brain_domain::message::{Message, Role};

/// A bounded, ordered, per-session message log.
///
/// Implementations must guarantee, per session key:
/// - `add_message` appends and trims to the retention cap as one step, so no
///   reader observes more than the cap or misses a completed append;
/// - operations on different keys never block each other for longer than a
///   single short critical section;
/// - `reset_session` is idempotent and never creates a key.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// All retained messages for the session, oldest first.  A session with
    /// no history yields an empty vec, not an error.
    async fn get_conversation(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Append one message and discard the oldest entries beyond the cap.
    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()>;

    /// Delete all history for the session.
    async fn reset_session(&self, session_id: &str) -> Result<()>;

    /// Remove the newest message equal to `(role, content)`, if any.
    ///
    /// Returns whether a message was removed.  Used to undo an append whose
    /// follow-up failed; other concurrent appends are left untouched.
    async fn retract_message(&self, session_id: &str, role: Role, content: &str) -> Result<bool>;

    /// Round-trip to the backing service.
    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and metrics.
    fn backend(&self) -> &'static str;
}
