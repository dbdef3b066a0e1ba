//! Pipeline execution engine for alarmlog.
//!
//! [`Notifier`] turns one alarm trigger payload into one delivered email:
//!
//! 1. `resolve-context`: decode the alarm and its [`TimeWindow`](alarmlog_core::TimeWindow)
//! 2. `fetch-filters`: find the metric filter feeding the alarm's metric
//! 3. `fetch-logs`: page through the matching log events
//! 4. `resolve-recipients`: literal address or topic subscriber discovery
//! 5. `compose-email`: run the [`TransformChain`] and build the report
//! 6. `send-email`: hand the report to the transport
//!
//! Each run owns its own [`ExecutionTracer`](alarmlog_monitor::ExecutionTracer)
//! and completes with an [`alarmlog_monitor::Completion`].

mod compose;
mod context;
mod html;
mod notifier;
mod pagination;
mod pipeline;
mod recipients;
mod transform;

#[cfg(test)]
mod fakes;

pub use compose::{subject, Composition, EmailComposer};
pub use context::resolve_context;
pub use html::encode_html;
pub use notifier::{Collaborators, Notifier, RunContext, TRIGGER_STAGE};
pub use pagination::paginate;
pub use pipeline::{Pipeline, PipelineRun, PipelineState, Stage, StageOutput, StageWarning};
pub use recipients::resolve_recipients;
pub use transform::{
    Geolocate, HtmlEncode, JsonDecode, LogLine, PrettyPrint, TransformChain, Transformer,
    PRIMARY_IP_KEY, SECONDARY_IP_KEY,
};
