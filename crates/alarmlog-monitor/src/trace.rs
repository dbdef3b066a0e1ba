//! Trace types for a single pipeline run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a trace entry. Ordered `Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Info,
    Warn,
    Error,
}

impl TraceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceLevel::Info => "info",
            TraceLevel::Warn => "warn",
            TraceLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record of a pipeline stage's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Stage label.
    pub stage: String,
    /// Severity.
    pub level: TraceLevel,
    /// Unix timestamp (milliseconds) when the entry was appended.
    pub timestamp: i64,
    /// Snapshot of the stage output, or of the trigger input for the first entry.
    pub payload: Value,
    /// Additional data, e.g. the rejected value behind a warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux: Option<Value>,
}

/// The finalized, ordered trace of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Unique identifier of the run.
    pub invocation_id: String,
    /// Terminal level: the highest severity recorded.
    pub level: TraceLevel,
    /// Entries in append order.
    pub trace: Vec<TraceEntry>,
}

impl ExecutionTrace {
    /// Returns the entries recorded at `level`.
    pub fn entries_at(&self, level: TraceLevel) -> impl Iterator<Item = &TraceEntry> {
        self.trace.iter().filter(move |e| e.level == level)
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }
}
