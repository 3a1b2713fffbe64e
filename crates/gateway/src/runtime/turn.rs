//! One chat turn: read history, record the user message, generate, record
//! the reply.
//!
//! Writes are at-least-once: the user message is appended before
//! generation and stays in history when generation fails, unless
//! `chat.rollback_on_failure` is set.

use std::time::{Duration, Instant};

use brain_domain::error::Error;
use brain_domain::message::Role;
use brain_domain::trace::TraceEvent;
use brain_providers::GenerationRequest;

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Input / error types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct TurnInput {
    pub user_id: String,
    pub session_id: String,
    pub message: String,
    pub interface: String,
    pub language: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("{0}")]
    Store(#[source] Error),
    #[error("{0}")]
    Generation(#[source] Error),
    #[error("{0}")]
    Timeout(String),
}

impl TurnError {
    pub fn kind(&self) -> &'static str {
        match self {
            TurnError::Store(_) => "store",
            TurnError::Generation(_) => "generation",
            TurnError::Timeout(_) => "timeout",
        }
    }

    fn from_generation(e: Error) -> Self {
        match e {
            Error::Timeout(msg) => TurnError::Timeout(format!("generation timed out: {msg}")),
            other => TurnError::Generation(other),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn execution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run one chat turn and return the generated reply.
pub async fn run_chat_turn(state: &AppState, input: TurnInput) -> Result<String, TurnError> {
    state.metrics.record_chat(&input.interface, &input.language);

    let result = execute(state, &input).await;
    if let Err(e) = &result {
        state.metrics.record_error(e.kind());
    }
    result
}

async fn execute(state: &AppState, input: &TurnInput) -> Result<String, TurnError> {
    let session_id = input.session_id.as_str();

    let history = state
        .store
        .get_conversation(session_id)
        .await
        .map_err(TurnError::Store)?;

    state
        .store
        .add_message(session_id, Role::User, &input.message)
        .await
        .map_err(TurnError::Store)?;

    let req = GenerationRequest {
        message: input.message.clone(),
        history,
        user_id: input.user_id.clone(),
        session_id: input.session_id.clone(),
        interface: input.interface.clone(),
        language: input.language.clone(),
    };

    let started = Instant::now();
    let outcome = generate_with_deadline(state, req, state.config.chat.generation_timeout()).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    let response = match outcome {
        Ok(text) => text,
        Err(e) => {
            TraceEvent::GenerationFailed {
                session_id: input.session_id.clone(),
                interface: input.interface.clone(),
                kind: e.kind().into(),
                error: e.to_string(),
            }
            .emit_warn();

            if state.config.chat.rollback_on_failure {
                rollback_user_message(state, session_id, &input.message).await;
            }
            return Err(e);
        }
    };

    state.metrics.record_generation(duration_ms);
    TraceEvent::GenerationCompleted {
        session_id: input.session_id.clone(),
        interface: input.interface.clone(),
        language: input.language.clone(),
        duration_ms,
        response_chars: response.chars().count(),
    }
    .emit();

    state
        .store
        .add_message(session_id, Role::Assistant, &response)
        .await
        .map_err(TurnError::Store)?;

    Ok(response)
}

async fn generate_with_deadline(
    state: &AppState,
    req: GenerationRequest,
    deadline: Option<Duration>,
) -> Result<String, TurnError> {
    let call = state.generator.generate(req);
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(TurnError::from_generation),
            Err(_) => Err(TurnError::Timeout(format!(
                "generation exceeded the {}s deadline",
                limit.as_secs()
            ))),
        },
        None => call.await.map_err(TurnError::from_generation),
    }
}

/// Best effort: a failed retraction is logged and otherwise ignored.
async fn rollback_user_message(state: &AppState, session_id: &str, message: &str) {
    match state.store.retract_message(session_id, Role::User, message).await {
        Ok(removed) => {
            tracing::info!(session_id = %session_id, removed, "rolled back user message");
        }
        Err(e) => {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "rollback of user message failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use brain_domain::config::Config;
    use brain_domain::message::Message;
    use brain_providers::Generator;
    use brain_sessions::{ConversationStore, MemoryStore};
    use parking_lot::Mutex;

    /// Echoes the message and records every request it sees.
    #[derive(Default)]
    struct RecordingGenerator {
        seen: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait::async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, req: GenerationRequest) -> brain_domain::Result<String> {
            let reply = format!("echo: {}", req.message);
            self.seen.lock().push(req);
            Ok(reply)
        }
        fn provider_id(&self) -> &str {
            "recording"
        }
        fn model(&self) -> &str {
            "test"
        }
    }

    struct FailingGenerator(fn() -> Error);

    #[async_trait::async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _req: GenerationRequest) -> brain_domain::Result<String> {
            Err((self.0)())
        }
        fn provider_id(&self) -> &str {
            "failing"
        }
        fn model(&self) -> &str {
            "test"
        }
    }

    fn state_with(generator: Arc<dyn Generator>, config: Config) -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let state = AppState::new(Arc::new(config), store.clone(), generator);
        (state, store)
    }

    fn input(session_id: &str, message: &str) -> TurnInput {
        TurnInput {
            user_id: "u1".into(),
            session_id: session_id.into(),
            message: message.into(),
            interface: "api".into(),
            language: "en".into(),
        }
    }

    #[tokio::test]
    async fn generator_sees_prior_history_only() {
        let generator = Arc::new(RecordingGenerator::default());
        let (state, _store) = state_with(generator.clone(), Config::default());

        run_chat_turn(&state, input("s1", "first")).await.unwrap();
        run_chat_turn(&state, input("s1", "second")).await.unwrap();

        let seen = generator.seen.lock();
        assert!(seen[0].history.is_empty());
        assert_eq!(
            seen[1].history,
            vec![Message::user("first"), Message::assistant("echo: first")]
        );
        assert_eq!(seen[1].user_id, "u1");
    }

    #[tokio::test]
    async fn provider_timeout_maps_to_timeout_kind() {
        let generator = Arc::new(FailingGenerator(|| Error::Timeout("read timed out".into())));
        let (state, _store) = state_with(generator, Config::default());

        let err = run_chat_turn(&state, input("s1", "hi")).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn failure_is_counted_and_keeps_user_message() {
        let generator = Arc::new(FailingGenerator(|| Error::Http("connection reset".into())));
        let (state, store) = state_with(generator, Config::default());

        let err = run_chat_turn(&state, input("s1", "hi")).await.unwrap_err();
        assert_eq!(err.kind(), "generation");
        assert_eq!(store.get_conversation("s1").await.unwrap(), vec![Message::user("hi")]);

        let snap = state.metrics.snapshot("memory");
        assert_eq!(snap.chat_requests, 1);
        assert_eq!(snap.chat_errors.generation, 1);
    }

    #[tokio::test]
    async fn rollback_leaves_earlier_turns_intact() {
        let mut config = Config::default();
        config.chat.rollback_on_failure = true;
        let generator = Arc::new(FailingGenerator(|| Error::Http("boom".into())));
        let (state, store) = state_with(generator, config);

        store.add_message("s1", Role::User, "hi").await.unwrap();
        store.add_message("s1", Role::Assistant, "hello").await.unwrap();

        run_chat_turn(&state, input("s1", "hi")).await.unwrap_err();
        assert_eq!(
            store.get_conversation("s1").await.unwrap(),
            vec![Message::user("hi"), Message::assistant("hello")]
        );
    }
}
