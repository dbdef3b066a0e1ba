//! Execution tracing for alarmlog pipeline runs.
//!
//! A run owns one [`ExecutionTracer`]; finalizing it yields the
//! [`ExecutionTrace`] handed to the completion surface on success. Failed runs
//! complete with a [`FailureDescriptor`] instead.

mod failure;
mod trace;
mod tracer;

pub use failure::{origin_trace, FailureDescriptor};
pub use trace::{ExecutionTrace, TraceEntry, TraceLevel};
pub use tracer::ExecutionTracer;

/// Outcome of one run: the trace on success, the fatal descriptor on failure.
pub type Completion = Result<ExecutionTrace, FailureDescriptor>;
