//! Command-level behavior of [`RedisStore`] against a real server.
//!
//! Run with `REDIS_URL=redis://127.0.0.1:6379/0 cargo test -p brain-sessions -- --ignored`.

use std::time::{SystemTime, UNIX_EPOCH};

use brain_domain::message::{Message, Role};
use brain_sessions::{ConversationStore, RedisStore, SessionKeys};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".into())
}

/// A key prefix no other test run shares.
fn unique_prefix(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("brain-test-{tag}-{}-{nanos}", std::process::id())
}

fn store(prefix: &str) -> RedisStore {
    RedisStore::open(&redis_url(), SessionKeys::new(prefix.to_string()), 50).unwrap()
}

async fn raw_connection() -> redis::aio::MultiplexedConnection {
    redis::Client::open(redis_url())
        .unwrap()
        .get_multiplexed_async_connection()
        .await
        .unwrap()
}

async fn key_exists(key: &str) -> bool {
    let mut conn = raw_connection().await;
    redis::cmd("EXISTS")
        .arg(key)
        .query_async::<_, i64>(&mut conn)
        .await
        .unwrap()
        == 1
}

#[tokio::test]
#[ignore] // Requires a running Redis (REDIS_URL)
async fn append_trims_to_the_newest_fifty() {
    let prefix = unique_prefix("trim");
    let store = store(&prefix);

    for n in [1usize, 49, 50, 51, 120] {
        let session = format!("n{n}");
        for i in 0..n {
            store
                .add_message(&session, Role::User, &format!("m{i}"))
                .await
                .unwrap();
        }
        let history = store.get_conversation(&session).await.unwrap();
        let expected: Vec<Message> = (n.saturating_sub(50)..n)
            .map(|i| Message::user(format!("m{i}")))
            .collect();
        assert_eq!(history, expected, "n = {n}");
        store.reset_session(&session).await.unwrap();
    }
}

#[tokio::test]
#[ignore] // Requires a running Redis (REDIS_URL)
async fn reset_is_idempotent_and_creates_no_key() {
    let prefix = unique_prefix("reset");
    let store = store(&prefix);
    let key = SessionKeys::new(prefix.clone()).messages("s1");

    store.add_message("s1", Role::User, "hi").await.unwrap();
    assert!(key_exists(&key).await);

    store.reset_session("s1").await.unwrap();
    assert!(!key_exists(&key).await);
    store.reset_session("s1").await.unwrap();
    assert!(!key_exists(&key).await);

    store.reset_session("never-written").await.unwrap();
    assert!(!key_exists(&SessionKeys::new(prefix).messages("never-written")).await);
    assert!(store.get_conversation("s1").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires a running Redis (REDIS_URL)
async fn retract_removes_only_the_newest_match() {
    let prefix = unique_prefix("retract");
    let store = store(&prefix);

    store.add_message("s1", Role::User, "again").await.unwrap();
    store.add_message("s1", Role::Assistant, "ok").await.unwrap();
    store.add_message("s1", Role::User, "again").await.unwrap();

    assert!(store.retract_message("s1", Role::User, "again").await.unwrap());
    assert_eq!(
        store.get_conversation("s1").await.unwrap(),
        vec![Message::user("again"), Message::assistant("ok")]
    );

    assert!(!store.retract_message("s1", Role::User, "missing").await.unwrap());
    store.reset_session("s1").await.unwrap();
}

#[tokio::test]
#[ignore] // Requires a running Redis (REDIS_URL)
async fn ping_reaches_the_server() {
    let store = store(&unique_prefix("ping"));
    store.ping().await.unwrap();
    assert_eq!(store.backend(), "redis");
}
