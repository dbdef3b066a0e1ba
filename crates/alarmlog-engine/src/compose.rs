//! Assembles the alarm report email.

use alarmlog_config::NotifierConfig;
use alarmlog_core::{
    AlarmEvent, ComposedEmail, LogQuery, NotifierError, RecipientList, Sender, TimeWindow,
};
use askama::Template;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::warn;

/// Report body. Interpolated values are escaped with
/// [`HexEntities`](crate::html::HexEntities) except `logs`, whose records
/// arrive already escaped.
#[derive(Template)]
#[template(path = "alarm_email.html", escape = "he")]
struct AlarmEmailTemplate<'a> {
    alarm_name: &'a str,
    time: String,
    logs: String,
    link: String,
}

/// An assembled email plus the recoverable problems met while building it.
#[derive(Debug)]
pub struct Composition {
    pub email: ComposedEmail,
    pub warnings: Vec<NotifierError>,
}

#[derive(Debug, Clone)]
pub struct EmailComposer {
    sender: Sender,
    custom_args: Option<String>,
    log_viewer_url: String,
}

impl EmailComposer {
    pub fn new(sender: Sender, custom_args: Option<String>, log_viewer_url: impl Into<String>) -> Self {
        Self {
            sender,
            custom_args,
            log_viewer_url: log_viewer_url.into(),
        }
    }

    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(
            Sender {
                name: config.sender_name.clone(),
                address: config.from_email.clone(),
            },
            config.custom_args.clone(),
            config.log_viewer_url.clone(),
        )
    }

    /// Raw custom metadata as configured.
    pub fn custom_args(&self) -> Option<&str> {
        self.custom_args.as_deref()
    }

    /// Builds the report for `alarm` from already transformed and escaped records.
    ///
    /// Unparseable custom metadata is replaced by an empty object and reported
    /// in [`Composition::warnings`]. An empty recipient list is fatal.
    pub fn compose(
        &self,
        alarm: &AlarmEvent,
        window: &TimeWindow,
        query: &LogQuery,
        recipients: RecipientList,
        records: &[String],
    ) -> Result<Composition, NotifierError> {
        if recipients.is_empty() {
            return Err(NotifierError::Compose(format!(
                "no recipients resolved for topic {}",
                alarm.topic_arn
            )));
        }

        let mut warnings = Vec::new();
        let custom_args = self.custom_args.as_deref().map(|raw| {
            serde_json::from_str::<Map<String, Value>>(raw).unwrap_or_else(|e| {
                warn!(error = %e, "Custom metadata is not a JSON object, sending without it");
                warnings.push(NotifierError::from(e));
                Map::new()
            })
        });

        let html = AlarmEmailTemplate {
            alarm_name: &alarm.alarm_name,
            time: window.end().to_rfc2822(),
            logs: records.join("<hr>"),
            link: self.log_viewer_link(query, window),
        }
        .render()
        .map_err(|e| NotifierError::Compose(format!("template rendering failed: {e}")))?;

        Ok(Composition {
            email: ComposedEmail {
                from: self.sender.clone(),
                to: recipients,
                subject: subject(&alarm.alarm_name),
                html,
                custom_args,
            },
            warnings,
        })
    }

    /// Deep link into the log viewer for the queried group, pattern and window.
    pub fn log_viewer_link(&self, query: &LogQuery, window: &TimeWindow) -> String {
        format!(
            "{}#logEventViewer:group={};filter={};start={};end={}",
            self.log_viewer_url,
            urlencoding::encode(&query.log_group_name),
            urlencoding::encode(&query.filter_pattern),
            urlencoding::encode(&iso_millis(window.start())),
            urlencoding::encode(&iso_millis(window.end())),
        )
    }
}

pub fn subject(alarm_name: &str) -> String {
    format!("ALARM: \"{alarm_name}\"")
}

fn iso_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
