//! Alarm, log and message types for a single notifier run.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::page::Cursor;

/// A decoded alarm state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmEvent {
    /// Alarm name, used in the subject and body.
    pub alarm_name: String,
    /// When the alarm changed state.
    pub state_change_time: DateTime<Utc>,
    /// Metric that triggered the alarm.
    pub metric_name: String,
    /// Namespace of the triggering metric.
    pub namespace: String,
    /// Evaluation period length in seconds.
    pub period_secs: u64,
    /// Number of periods evaluated.
    pub evaluation_periods: u64,
    /// Topic that delivered the notification.
    pub topic_arn: String,
}

/// The log query window covering the alarm's evaluation periods.
///
/// `start <= end` always holds: the constructor only subtracts a non-negative span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Builds the window ending at `end` and spanning `period_secs * evaluation_periods`.
    ///
    /// Returns `None` when the span overflows.
    pub fn ending_at(end: DateTime<Utc>, period_secs: u64, evaluation_periods: u64) -> Option<Self> {
        let span = period_secs.checked_mul(evaluation_periods)?;
        let span = TimeDelta::try_seconds(i64::try_from(span).ok()?)?;
        let start = end.checked_sub_signed(span)?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

/// A metric filter linking a metric to the log group that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFilter {
    pub log_group_name: String,
    /// Filter pattern; empty when the directory reported none.
    pub filter_pattern: String,
}

/// A single retrieved log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub message: String,
}

impl LogRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Request descriptor for a filtered log query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    pub log_group_name: String,
    pub filter_pattern: String,
    /// Window start, epoch milliseconds.
    pub start_time: i64,
    /// Window end, epoch milliseconds.
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl LogQuery {
    pub fn new(filter: &MetricFilter, window: &TimeWindow) -> Self {
        Self {
            log_group_name: filter.log_group_name.clone(),
            filter_pattern: filter.filter_pattern.clone(),
            start_time: window.start_millis(),
            end_time: window.end_millis(),
            next_token: None,
        }
    }
}

impl Cursor for LogQuery {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

/// Request descriptor for a topic subscription listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionQuery {
    pub topic_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl SubscriptionQuery {
    pub fn new(topic_arn: impl Into<String>) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            next_token: None,
        }
    }
}

impl Cursor for SubscriptionQuery {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

/// A topic subscription as reported by the subscription directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub protocol: String,
    pub endpoint: String,
}

/// Destination addresses in resolution order. Duplicates are kept.
pub type RecipientList = Vec<String>;

/// The sender identity of an outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub name: String,
    #[serde(rename = "email")]
    pub address: String,
}

/// A fully assembled email, ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedEmail {
    pub from: Sender,
    pub to: RecipientList,
    pub subject: String,
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_args: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Acknowledgement returned by the email transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}
