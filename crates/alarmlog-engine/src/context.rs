//! Derives the alarm and its query window from a trigger payload.

use alarmlog_core::{AlarmEvent, NotifierError, TimeWindow};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlarmMessage {
    alarm_name: String,
    state_change_time: String,
    trigger: AlarmTrigger,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlarmTrigger {
    metric_name: String,
    namespace: String,
    period: u64,
    evaluation_periods: u64,
}

/// Decodes the alarm carried by a trigger payload and computes its window.
///
/// Accepts a notification-record envelope (`Records[0].Sns`) or a bare topic
/// notification. `TopicArn` may be absent, leaving the topic empty; it only
/// matters for subscriber discovery. The window ends at `StateChangeTime`
/// and starts `Period * EvaluationPeriods` seconds earlier.
pub fn resolve_context(payload: &Value) -> Result<(AlarmEvent, TimeWindow), NotifierError> {
    let notification = match payload.get("Records") {
        Some(records) => records
            .pointer("/0/Sns")
            .ok_or_else(|| malformed("Records[0].Sns is missing"))?,
        None => payload,
    };

    let topic_arn = notification
        .get("TopicArn")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let message = notification
        .get("Message")
        .ok_or_else(|| malformed("Message is missing"))?;
    let message: AlarmMessage = match message {
        Value::String(raw) => serde_json::from_str(raw),
        other => AlarmMessage::deserialize(other),
    }
    .map_err(|e| malformed(format!("alarm message: {e}")))?;

    let state_change_time = parse_state_change_time(&message.state_change_time)?;
    let trigger = message.trigger;
    let window = TimeWindow::ending_at(state_change_time, trigger.period, trigger.evaluation_periods)
        .ok_or_else(|| {
            malformed(format!(
                "window of {} x {}s is out of range",
                trigger.evaluation_periods, trigger.period
            ))
        })?;

    let alarm = AlarmEvent {
        alarm_name: message.alarm_name,
        state_change_time,
        metric_name: trigger.metric_name,
        namespace: trigger.namespace,
        period_secs: trigger.period,
        evaluation_periods: trigger.evaluation_periods,
        topic_arn: topic_arn.to_string(),
    };

    Ok((alarm, window))
}

/// Parses RFC 3339 or the alarm service's `+hhmm` offset form.
fn parse_state_change_time(raw: &str) -> Result<DateTime<Utc>, NotifierError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| malformed(format!("StateChangeTime {raw:?}: {e}")))
}

fn malformed(detail: impl Into<String>) -> NotifierError {
    NotifierError::MalformedPayload(detail.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarmlog_core::ErrorKind;
    use chrono::TimeZone;
    use serde_json::json;

    fn message() -> Value {
        json!({
            "AlarmName": "test alarm",
            "StateChangeTime": "2017-01-12T16:30:42.236+0000",
            "Trigger": {
                "MetricName": "test metric",
                "Namespace": "LogMetricsError",
                "Period": 60,
                "EvaluationPeriods": 5
            }
        })
    }

    fn envelope(message: Value) -> Value {
        json!({
            "Records": [{
                "Sns": {
                    "TopicArn": "arn:aws:sns:us-east-1:123456789012:alarms",
                    "Message": message.to_string()
                }
            }]
        })
    }

    #[test]
    fn test_window_matches_evaluation_periods() {
        let (alarm, window) = resolve_context(&envelope(message())).unwrap();
        let end = Utc.with_ymd_and_hms(2017, 1, 12, 16, 30, 42).unwrap()
            + chrono::TimeDelta::milliseconds(236);

        assert_eq!(alarm.alarm_name, "test alarm");
        assert_eq!(alarm.metric_name, "test metric");
        assert_eq!(alarm.namespace, "LogMetricsError");
        assert_eq!(alarm.topic_arn, "arn:aws:sns:us-east-1:123456789012:alarms");
        assert_eq!(window.end(), end);
        assert_eq!(window.end_millis() - window.start_millis(), 60 * 5 * 1000);
    }

    #[test]
    fn test_accepts_bare_notification_with_object_message() {
        let payload = json!({
            "Type": "Notification",
            "TopicArn": "arn:aws:sns:eu-west-1:1:alarms",
            "Message": message()
        });
        let (alarm, window) = resolve_context(&payload).unwrap();
        assert_eq!(alarm.topic_arn, "arn:aws:sns:eu-west-1:1:alarms");
        assert_eq!(window.end(), alarm.state_change_time);
    }

    #[test]
    fn test_accepts_rfc3339_time() {
        let mut msg = message();
        msg["StateChangeTime"] = json!("2026-03-01T12:00:00Z");
        let (_, window) = resolve_context(&envelope(msg)).unwrap();
        assert_eq!(window.end(), Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let mut no_name = message();
        no_name.as_object_mut().unwrap().remove("AlarmName");

        let mut bad_time = message();
        bad_time["StateChangeTime"] = json!("yesterday");

        let mut negative_period = message();
        negative_period["Trigger"]["Period"] = json!(-60);

        let cases = vec![
            envelope(no_name),
            envelope(bad_time),
            envelope(negative_period),
            json!({"Records": []}),
            json!({"Records": [{"Sns": {"TopicArn": "t"}}]}),
            json!({"Records": [{"Sns": {"TopicArn": "t", "Message": "not json"}}]}),
        ];

        for payload in cases {
            let err = resolve_context(&payload).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedPayload, "{payload}");
        }
    }

    #[test]
    fn test_topic_is_optional() {
        let payload = json!({"Records": [{"Sns": {"Message": message().to_string()}}]});
        let (alarm, _) = resolve_context(&payload).unwrap();
        assert_eq!(alarm.topic_arn, "");
        assert_eq!(alarm.alarm_name, "test alarm");
    }

    #[test]
    fn test_overflowing_window_is_malformed() {
        let mut msg = message();
        msg["Trigger"]["Period"] = json!(u64::MAX);
        let err = resolve_context(&envelope(msg)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
    }
}
