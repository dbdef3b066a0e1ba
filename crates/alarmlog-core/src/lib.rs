//! Core domain types and error definitions for alarmlog.
//!
//! This crate provides the fundamental types shared across the notifier:
//!
//! - [`NotifierError`] and [`ErrorKind`]: Failure classification for a pipeline run
//! - [`AlarmEvent`], [`TimeWindow`], [`MetricFilter`], [`LogRecord`]: Alarm and log data
//! - [`ComposedEmail`] and [`Sender`]: The outgoing message
//! - [`Page`] and [`Cursor`]: Cursor-based paging shapes
//! - Collaborator traits ([`MetricFilterDirectory`], [`LogQueryService`],
//!   [`SubscriptionDirectory`], [`Geolocator`], [`EmailTransport`])
//!
//! # Example
//!
//! ```rust
//! use alarmlog_core::{ErrorKind, NotifierError};
//!
//! let err = NotifierError::EmptyFilterResult {
//!     metric_name: "errors".to_string(),
//!     namespace: "LogMetrics".to_string(),
//! };
//! assert_eq!(err.kind(), ErrorKind::EmptyFilterResult);
//! assert_eq!(err.kind().as_str(), "EmptyFilterResult");
//! ```

mod model;
mod page;
mod ports;

pub use model::{
    AlarmEvent, ComposedEmail, DeliveryReceipt, LogQuery, LogRecord, MetricFilter, RecipientList,
    Sender, Subscription, SubscriptionQuery, TimeWindow,
};
pub use page::{Cursor, Page};
pub use ports::{EmailTransport, Geolocator, LogQueryService, MetricFilterDirectory, SubscriptionDirectory};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error returned by upstream collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during a notifier pipeline run.
#[derive(Error, Debug)]
pub enum NotifierError {
    /// The trigger payload is missing a required field or holds an unparseable value.
    #[error("Malformed alarm payload: {0}")]
    MalformedPayload(String),

    /// The metric-filter directory returned no filters for the alarm's metric.
    #[error("No metric filters found for metric {metric_name:?} in namespace {namespace:?}")]
    EmptyFilterResult { metric_name: String, namespace: String },

    /// A metric-filter, log or subscription query failed. Displays the upstream error as is.
    #[error("{source}")]
    UpstreamFetch {
        #[source]
        source: BoxError,
    },

    /// The email could not be assembled.
    #[error("Cannot compose email: {0}")]
    Compose(String),

    /// The email transport rejected the message.
    #[error("Email transport failed: {source}")]
    Transport {
        #[source]
        source: BoxError,
    },

    /// The configured custom metadata is not a JSON object.
    #[error("Invalid custom metadata: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A stage was handed a context produced by the wrong predecessor.
    #[error("Stage {stage} cannot run after {found}")]
    PipelineState {
        stage: &'static str,
        found: &'static str,
    },
}

impl NotifierError {
    /// Wraps a collaborator error as an upstream fetch failure.
    pub fn upstream(err: impl Into<BoxError>) -> Self {
        NotifierError::UpstreamFetch { source: err.into() }
    }

    /// Wraps a transport error.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        NotifierError::Transport { source: err.into() }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotifierError::MalformedPayload(_) => ErrorKind::MalformedPayload,
            NotifierError::EmptyFilterResult { .. } => ErrorKind::EmptyFilterResult,
            NotifierError::UpstreamFetch { .. } => ErrorKind::UpstreamFetchFailure,
            NotifierError::Compose(_) => ErrorKind::ComposeFailure,
            NotifierError::Transport { .. } => ErrorKind::TransportFailure,
            NotifierError::ConfigParse(_) => ErrorKind::ConfigParseWarning,
            NotifierError::PipelineState { .. } => ErrorKind::PipelineState,
        }
    }

    /// Returns true if the pipeline may continue after recording this error as a warning.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::ConfigParseWarning
    }
}

/// Classification of a [`NotifierError`], written into failure descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MalformedPayload,
    EmptyFilterResult,
    UpstreamFetchFailure,
    ComposeFailure,
    TransportFailure,
    ConfigParseWarning,
    PipelineState,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedPayload => "MalformedPayload",
            ErrorKind::EmptyFilterResult => "EmptyFilterResult",
            ErrorKind::UpstreamFetchFailure => "UpstreamFetchFailure",
            ErrorKind::ComposeFailure => "ComposeFailure",
            ErrorKind::TransportFailure => "TransportFailure",
            ErrorKind::ConfigParseWarning => "ConfigParseWarning",
            ErrorKind::PipelineState => "PipelineState",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_upstream_error_displays_unchanged() {
        let err = NotifierError::upstream("ThrottlingException: Rate exceeded");
        assert_eq!(err.to_string(), "ThrottlingException: Rate exceeded");
        assert_eq!(err.kind(), ErrorKind::UpstreamFetchFailure);
        assert_eq!(
            err.source().map(|s| s.to_string()).as_deref(),
            Some("ThrottlingException: Rate exceeded")
        );
    }

    #[test]
    fn test_only_config_parse_is_recoverable() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(NotifierError::from(parse_err).is_recoverable());
        assert!(!NotifierError::MalformedPayload("AlarmName".into()).is_recoverable());
        assert!(!NotifierError::transport("403 Forbidden").is_recoverable());
    }

    #[test]
    fn test_error_kind_names() {
        assert_eq!(ErrorKind::TransportFailure.to_string(), "TransportFailure");
        assert_eq!(
            NotifierError::Compose("no recipients".into()).kind().as_str(),
            "ComposeFailure"
        );
    }
}
