//! Failure descriptors handed to the completion surface.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// The single fatal outcome of a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} in {stage}: {message}")]
pub struct FailureDescriptor {
    /// Run that failed.
    pub invocation_id: String,
    /// Stage that raised the failure.
    pub stage: String,
    /// Classification name of the error.
    pub kind: String,
    /// String form of the error.
    pub message: String,
    /// Normalized origin trace: the failing stage, then one line per error source.
    pub trace: Vec<String>,
}

impl FailureDescriptor {
    pub fn from_error(
        invocation_id: impl Into<String>,
        stage: impl Into<String>,
        kind: impl Into<String>,
        err: &(dyn std::error::Error + 'static),
    ) -> Self {
        let stage = stage.into();
        Self {
            invocation_id: invocation_id.into(),
            trace: origin_trace(&stage, err),
            stage,
            kind: kind.into(),
            message: err.to_string(),
        }
    }

    /// Payload of the trace's error entry.
    pub fn to_payload(&self) -> Value {
        json!({
            "kind": self.kind,
            "error": self.message,
            "trace": self.trace,
        })
    }
}

/// Renders the failing stage and the error's source chain as trimmed frame lines.
pub fn origin_trace(stage: &str, err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut lines = vec![format!("stage {stage}")];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.extend(cause.to_string().lines().filter_map(normalize_frame));
        source = cause.source();
    }
    lines
}

fn normalize_frame(line: &str) -> Option<String> {
    let line = line.trim();
    let line = line.strip_prefix("at ").unwrap_or(line).trim();
    (!line.is_empty()).then(|| line.to_string())
}
