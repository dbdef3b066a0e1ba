//! Sequential stage driver.
//!
//! A [`Pipeline`] owns an ordered list of named [`Stage`]s. Running it feeds
//! each stage the previous stage's context, records one `info` trace entry per
//! completed stage (preceded by any warnings the stage reported) and halts at
//! the first failure, recording exactly one `error` entry.

use alarmlog_core::{ErrorKind, NotifierError};
use alarmlog_monitor::{ExecutionTracer, FailureDescriptor};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Stage Types
// ─────────────────────────────────────────────────────────────────────────────

/// A recoverable problem reported by a stage that still completed.
#[derive(Debug, Clone, PartialEq)]
pub struct StageWarning {
    pub kind: ErrorKind,
    pub message: String,
    /// Extra data written to the entry's aux slot, such as the offending input.
    pub aux: Option<Value>,
}

impl StageWarning {
    pub fn from_error(err: &NotifierError, aux: Option<Value>) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            aux,
        }
    }

    fn payload(&self) -> Value {
        json!({ "kind": self.kind.as_str(), "warning": self.message })
    }
}

/// What a completed stage hands to the driver.
#[derive(Debug)]
pub struct StageOutput<C> {
    /// Input for the next stage.
    pub context: C,
    /// Recorded as the stage's `info` entry payload.
    pub snapshot: Value,
    pub warnings: Vec<StageWarning>,
}

impl<C> StageOutput<C> {
    pub fn new(context: C, snapshot: Value) -> Self {
        Self {
            context,
            snapshot,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<StageWarning>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

#[async_trait]
pub trait Stage<C: Send + 'static>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, context: C) -> Result<StageOutput<C>, NotifierError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Running(&'static str),
    Complete,
    Failed(&'static str),
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct PipelineRun<C> {
    /// Terminal state: `Complete` or `Failed`.
    pub state: PipelineState,
    pub outcome: Result<C, FailureDescriptor>,
    /// Every state the run passed through, starting at `Init`.
    pub transitions: Vec<PipelineState>,
}

pub struct Pipeline<C: Send + 'static> {
    stages: Vec<Box<dyn Stage<C>>>,
}

impl<C: Send + 'static> Pipeline<C> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage.
    pub fn stage(mut self, stage: impl Stage<C> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs every stage in order, stopping at the first failure.
    pub async fn run(&self, initial: C, tracer: &mut ExecutionTracer) -> PipelineRun<C> {
        let mut transitions = vec![PipelineState::Init];
        let mut context = initial;

        for stage in &self.stages {
            let name = stage.name();
            transitions.push(PipelineState::Running(name));

            match stage.run(context).await {
                Ok(output) => {
                    for warning in &output.warnings {
                        warn!(stage = name, kind = %warning.kind, "{}", warning.message);
                        tracer.warn(name, warning.payload(), warning.aux.clone());
                    }
                    tracer.info(name, output.snapshot);
                    debug!(stage = name, "Stage complete");
                    context = output.context;
                }
                Err(e) => {
                    let failure =
                        FailureDescriptor::from_error(tracer.invocation_id(), name, e.kind().as_str(), &e);
                    error!(stage = name, kind = %failure.kind, "Stage failed: {}", failure.message);
                    tracer.error(&failure);

                    let state = PipelineState::Failed(name);
                    transitions.push(state);
                    return PipelineRun {
                        state,
                        outcome: Err(failure),
                        transitions,
                    };
                }
            }
        }

        transitions.push(PipelineState::Complete);
        PipelineRun {
            state: PipelineState::Complete,
            outcome: Ok(context),
            transitions,
        }
    }
}

impl<C: Send + 'static> Default for Pipeline<C> {
    fn default() -> Self {
        Self::new()
    }
}
