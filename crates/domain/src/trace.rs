use serde::Serialize;

/// Structured trace events emitted across all brain crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    MessageAppended {
        session_id: String,
        role: String,
        content_chars: usize,
    },
    MessageRetracted {
        session_id: String,
        role: String,
        removed: bool,
    },
    SessionReset {
        session_id: String,
    },
    GenerationCompleted {
        session_id: String,
        interface: String,
        language: String,
        duration_ms: u64,
        response_chars: usize,
    },
    GenerationFailed {
        session_id: String,
        interface: String,
        kind: String,
        error: String,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
    },
    RetryScheduled {
        operation: String,
        attempt: u32,
        delay_ms: u64,
        error: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "brain_event");
    }

    pub fn emit_warn(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::warn!(trace_event = %json, "brain_event");
    }
}
