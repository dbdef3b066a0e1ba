//! Append-only tracer owned by a single pipeline run.

use chrono::Utc;
use serde_json::Value;

use crate::failure::FailureDescriptor;
use crate::trace::{ExecutionTrace, TraceEntry, TraceLevel};

/// Records the stages of one run and computes its terminal level.
///
/// Once an error entry is appended the trace is closed: later appends are
/// dropped and reported with `tracing::warn!`.
pub struct ExecutionTracer {
    invocation_id: String,
    entries: Vec<TraceEntry>,
    level: TraceLevel,
    closed: bool,
}

impl ExecutionTracer {
    /// Creates an empty tracer with a fresh invocation id.
    pub fn new() -> Self {
        Self::with_invocation_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_invocation_id(invocation_id: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            entries: Vec::new(),
            level: TraceLevel::Info,
            closed: false,
        }
    }

    /// Returns the invocation ID.
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// Highest severity recorded so far.
    pub fn level(&self) -> TraceLevel {
        self.level
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// True once an error entry has been recorded.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn info(&mut self, stage: &str, payload: Value) -> bool {
        self.append(stage, TraceLevel::Info, payload, None)
    }

    pub fn warn(&mut self, stage: &str, payload: Value, aux: Option<Value>) -> bool {
        self.append(stage, TraceLevel::Warn, payload, aux)
    }

    /// Records the run's single failure and closes the trace.
    pub fn error(&mut self, failure: &FailureDescriptor) -> bool {
        self.append(&failure.stage, TraceLevel::Error, failure.to_payload(), None)
    }

    fn append(&mut self, stage: &str, level: TraceLevel, payload: Value, aux: Option<Value>) -> bool {
        if self.closed {
            tracing::warn!(
                invocation_id = %self.invocation_id,
                stage,
                level = %level,
                "Trace already closed, dropping entry"
            );
            return false;
        }

        self.entries.push(TraceEntry {
            stage: stage.to_string(),
            level,
            timestamp: Utc::now().timestamp_millis(),
            payload,
            aux,
        });
        self.level = self.level.max(level);
        self.closed = level == TraceLevel::Error;
        true
    }

    /// Consumes the tracer, logging every entry at its own level.
    pub fn finalize(self) -> ExecutionTrace {
        for entry in &self.entries {
            match entry.level {
                TraceLevel::Info => tracing::info!(
                    invocation_id = %self.invocation_id,
                    stage = %entry.stage,
                    payload = %entry.payload,
                    "trace"
                ),
                TraceLevel::Warn => tracing::warn!(
                    invocation_id = %self.invocation_id,
                    stage = %entry.stage,
                    payload = %entry.payload,
                    "trace"
                ),
                TraceLevel::Error => tracing::error!(
                    invocation_id = %self.invocation_id,
                    stage = %entry.stage,
                    payload = %entry.payload,
                    "trace"
                ),
            }
        }

        ExecutionTrace {
            invocation_id: self.invocation_id,
            level: self.level,
            trace: self.entries,
        }
    }
}

impl Default for ExecutionTracer {
    fn default() -> Self {
        Self::new()
    }
}
