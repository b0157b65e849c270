//! Diagnostic sink for per-query conditions that do not abort evaluation

use std::sync::Mutex;

/// Receives warning-level diagnostics raised while scoring queries.
///
/// Calls are fire-and-forget: a sink never influences the score of the
/// query that triggered it. Sinks are shared across worker threads.
pub trait DiagnosticSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Prefixes every diagnostic with the position of the query being scored.
pub struct QueryScopedSink<'a> {
    inner: &'a dyn DiagnosticSink,
    query: usize,
}

impl<'a> QueryScopedSink<'a> {
    pub fn new(inner: &'a dyn DiagnosticSink, query: usize) -> Self {
        Self { inner, query }
    }
}

impl DiagnosticSink for QueryScopedSink<'_> {
    fn warn(&self, message: &str) {
        self.inner.warn(&format!("query #{}: {}", self.query, message));
    }
}

/// Keeps every diagnostic in memory so callers can inspect them afterwards.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded messages, in arrival order
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }
}
