//! Bounded retry around a [`ConversationStore`].
//!
//! Only idempotent operations are retried: reads, deletes and pings.
//! `add_message` and `retract_message` run exactly once, because a reply
//! lost after the server applied the write would turn a retry into a
//! duplicate (or a second removal).  Their failures surface to the caller.

use brain_domain::error::Result;
use brain_domain::message::{Message, Role};
use brain_domain::retry::RetryPolicy;

use crate::store::ConversationStore;

pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ConversationStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<S: ConversationStore> ConversationStore for RetryingStore<S> {
    async fn get_conversation(&self, session_id: &str) -> Result<Vec<Message>> {
        self.policy
            .run("store.get_conversation", || self.inner.get_conversation(session_id))
            .await
    }

    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        self.inner.add_message(session_id, role, content).await
    }

    async fn reset_session(&self, session_id: &str) -> Result<()> {
        self.policy
            .run("store.reset_session", || self.inner.reset_session(session_id))
            .await
    }

    async fn retract_message(&self, session_id: &str, role: Role, content: &str) -> Result<bool> {
        self.inner.retract_message(session_id, role, content).await
    }

    async fn ping(&self) -> Result<()> {
        self.policy.run("store.ping", || self.inner.ping()).await
    }

    fn backend(&self) -> &'static str {
        self.inner.backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use brain_domain::error::Error;

    use crate::memory::MemoryStore;

    /// Fails the first `failures` calls of every operation with a
    /// connectivity error, then delegates to an in-memory store.
    struct FlakyStore {
        failures: u32,
        calls: AtomicU32,
        inner: MemoryStore,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                inner: MemoryStore::default(),
            }
        }

        fn trip(&self) -> Result<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(Error::StoreUnavailable("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl ConversationStore for FlakyStore {
        async fn get_conversation(&self, session_id: &str) -> Result<Vec<Message>> {
            self.trip()?;
            self.inner.get_conversation(session_id).await
        }
        async fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
            self.trip()?;
            self.inner.add_message(session_id, role, content).await
        }
        async fn reset_session(&self, session_id: &str) -> Result<()> {
            self.trip()?;
            self.inner.reset_session(session_id).await
        }
        async fn retract_message(&self, session_id: &str, role: Role, content: &str) -> Result<bool> {
            self.trip()?;
            self.inner.retract_message(session_id, role, content).await
        }
        async fn ping(&self) -> Result<()> {
            self.trip()
        }
        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_factor: 2.0,
        }
    }

    #[tokio::test]
    async fn reads_recover_from_transient_failures() {
        let store = RetryingStore::new(FlakyStore::new(2), fast_policy());
        let messages = store.get_conversation("s").await.unwrap();
        assert!(messages.is_empty());
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reads_give_up_after_budget() {
        let store = RetryingStore::new(FlakyStore::new(10), fast_policy());
        let err = store.get_conversation("s").await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reset_is_retried() {
        let store = RetryingStore::new(FlakyStore::new(1), fast_policy());
        store.reset_session("s").await.unwrap();
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn appends_are_never_retried() {
        let store = RetryingStore::new(FlakyStore::new(1), fast_policy());
        let err = store.add_message("s", Role::User, "hi").await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 1);
        assert!(store.inner().inner.get_conversation("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_name_passes_through() {
        let store = RetryingStore::new(MemoryStore::default(), RetryPolicy::none());
        assert_eq!(store.backend(), "memory");
        store.ping().await.unwrap();
    }
}
