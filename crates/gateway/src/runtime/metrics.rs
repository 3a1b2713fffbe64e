//! In-process runtime counters exposed at `GET /metrics`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

/// Interface tags counted under their own label.
const KNOWN_INTERFACES: &[&str] = &["voice", "telegram", "api"];
/// Language tags counted under their own label.
const KNOWN_LANGUAGES: &[&str] = &["en", "pl"];
/// Label for any tag outside the known set.
const OTHER: &str = "other";

/// Map a caller-supplied tag onto a fixed label set so the breakdown maps
/// stay bounded no matter what clients send.
fn bucket(tag: &str, known: &[&'static str]) -> &'static str {
    known.iter().copied().find(|k| *k == tag).unwrap_or(OTHER)
}

#[derive(Default)]
pub struct Metrics {
    chat_requests: AtomicU64,
    chat_by_labels: Mutex<BTreeMap<(&'static str, &'static str), u64>>,
    errors_store: AtomicU64,
    errors_generation: AtomicU64,
    errors_timeout: AtomicU64,
    generations: AtomicU64,
    generation_ms_total: AtomicU64,
    generation_ms_max: AtomicU64,
    resets: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub chat_requests: u64,
    pub chat_requests_by_interface: BTreeMap<String, u64>,
    pub chat_requests_by_language: BTreeMap<String, u64>,
    /// Keyed `<interface>/<language>`.
    pub chat_requests_by_interface_language: BTreeMap<String, u64>,
    pub chat_errors: ErrorCounts,
    pub generation: GenerationStats,
    pub session_resets: u64,
    pub store_backend: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorCounts {
    pub store: u64,
    pub generation: u64,
    pub timeout: u64,
}

#[derive(Debug, Serialize)]
pub struct GenerationStats {
    pub completed: u64,
    pub total_ms: u64,
    pub max_ms: u64,
    pub avg_ms: u64,
}

impl Metrics {
    pub fn record_chat(&self, interface: &str, language: &str) {
        self.chat_requests.fetch_add(1, Ordering::Relaxed);
        let labels = (
            bucket(interface, KNOWN_INTERFACES),
            bucket(language, KNOWN_LANGUAGES),
        );
        *self.chat_by_labels.lock().entry(labels).or_insert(0) += 1;
    }

    /// `kind` is one of `store`, `generation`, `timeout`.
    pub fn record_error(&self, kind: &str) {
        let counter = match kind {
            "store" => &self.errors_store,
            "timeout" => &self.errors_timeout,
            _ => &self.errors_generation,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generation(&self, duration_ms: u64) {
        self.generations.fetch_add(1, Ordering::Relaxed);
        self.generation_ms_total.fetch_add(duration_ms, Ordering::Relaxed);
        self.generation_ms_max.fetch_max(duration_ms, Ordering::Relaxed);
    }

    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, store_backend: &str) -> MetricsSnapshot {
        let completed = self.generations.load(Ordering::Relaxed);
        let total_ms = self.generation_ms_total.load(Ordering::Relaxed);

        let mut by_interface = BTreeMap::new();
        let mut by_language = BTreeMap::new();
        let mut by_pair = BTreeMap::new();
        for (&(interface, language), &count) in self.chat_by_labels.lock().iter() {
            *by_interface.entry(interface.to_owned()).or_insert(0) += count;
            *by_language.entry(language.to_owned()).or_insert(0) += count;
            by_pair.insert(format!("{interface}/{language}"), count);
        }

        MetricsSnapshot {
            chat_requests: self.chat_requests.load(Ordering::Relaxed),
            chat_requests_by_interface: by_interface,
            chat_requests_by_language: by_language,
            chat_requests_by_interface_language: by_pair,
            chat_errors: ErrorCounts {
                store: self.errors_store.load(Ordering::Relaxed),
                generation: self.errors_generation.load(Ordering::Relaxed),
                timeout: self.errors_timeout.load(Ordering::Relaxed),
            },
            generation: GenerationStats {
                completed,
                total_ms,
                max_ms: self.generation_ms_max.load(Ordering::Relaxed),
                avg_ms: if completed == 0 { 0 } else { total_ms / completed },
            },
            session_resets: self.resets.load(Ordering::Relaxed),
            store_backend: store_backend.to_owned(),
        }
    }
}
