//! In-memory collaborators for engine tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alarmlog_config::NotifierConfig;
use alarmlog_core::{
    ComposedEmail, DeliveryReceipt, EmailTransport, Geolocator, LogQuery, LogQueryService,
    LogRecord, MetricFilter, MetricFilterDirectory, NotifierError, Page, Subscription,
    SubscriptionDirectory, SubscriptionQuery,
};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::notifier::{Collaborators, Notifier};

/// Serves scripted pages in call order. Every page but the last carries the
/// cursor `page-<n>`.
struct Script<T, Q> {
    pages: Vec<Vec<T>>,
    failure: Option<String>,
    calls: Mutex<Vec<Q>>,
}

impl<T: Clone, Q: Clone> Script<T, Q> {
    fn new(pages: Vec<Vec<T>>) -> Self {
        Self {
            pages,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            pages: Vec::new(),
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn serve(&self, query: Q) -> Result<Page<T>, NotifierError> {
        let round = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(query);
            calls.len()
        };
        if let Some(message) = &self.failure {
            return Err(NotifierError::upstream(message.clone()));
        }

        let items = self.pages.get(round - 1).cloned().unwrap_or_default();
        Ok(if round < self.pages.len() {
            Page::more(items, format!("page-{round}"))
        } else {
            Page::last(items)
        })
    }

    fn calls(&self) -> Vec<Q> {
        self.calls.lock().unwrap().clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directories
// ─────────────────────────────────────────────────────────────────────────────

pub struct FakeFilters {
    filters: Vec<MetricFilter>,
    failure: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeFilters {
    pub fn new(filters: Vec<MetricFilter>) -> Self {
        Self {
            filters,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricFilterDirectory for FakeFilters {
    async fn describe_metric_filters(
        &self,
        metric_name: &str,
        namespace: &str,
    ) -> Result<Vec<MetricFilter>, NotifierError> {
        self.calls
            .lock()
            .unwrap()
            .push((metric_name.to_string(), namespace.to_string()));
        match &self.failure {
            Some(message) => Err(NotifierError::upstream(message.clone())),
            None => Ok(self.filters.clone()),
        }
    }
}

pub struct FakeLogs(Script<LogRecord, LogQuery>);

impl FakeLogs {
    pub fn new(pages: Vec<Vec<&str>>) -> Self {
        Self(Script::new(
            pages
                .into_iter()
                .map(|page| page.into_iter().map(LogRecord::new).collect())
                .collect(),
        ))
    }

    pub fn failing(message: &str) -> Self {
        Self(Script::failing(message))
    }

    pub fn calls(&self) -> Vec<LogQuery> {
        self.0.calls()
    }
}

#[async_trait]
impl LogQueryService for FakeLogs {
    async fn filter_log_events(&self, query: LogQuery) -> Result<Page<LogRecord>, NotifierError> {
        self.0.serve(query)
    }
}

pub struct FakeSubscriptions(Script<Subscription, SubscriptionQuery>);

impl FakeSubscriptions {
    pub fn new(pages: Vec<Vec<Subscription>>) -> Self {
        Self(Script::new(pages))
    }

    pub fn failing(message: &str) -> Self {
        Self(Script::failing(message))
    }

    pub fn calls(&self) -> Vec<SubscriptionQuery> {
        self.0.calls()
    }
}

#[async_trait]
impl SubscriptionDirectory for FakeSubscriptions {
    async fn list_subscriptions(
        &self,
        query: SubscriptionQuery,
    ) -> Result<Page<Subscription>, NotifierError> {
        self.0.serve(query)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport & Geolocation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeTransport {
    failure: Option<String>,
    sent: Mutex<Vec<ComposedEmail>>,
}

impl FakeTransport {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<ComposedEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for FakeTransport {
    async fn send(&self, email: &ComposedEmail) -> Result<DeliveryReceipt, NotifierError> {
        if let Some(message) = &self.failure {
            return Err(NotifierError::transport(message.clone()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(DeliveryReceipt {
            status: 202,
            message_id: Some("msg-1".into()),
        })
    }
}

#[derive(Default)]
pub struct FakeGeolocator {
    table: HashMap<String, Value>,
    lookups: Mutex<Vec<String>>,
}

impl FakeGeolocator {
    pub fn with(entries: &[(&str, Value)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(address, location)| (address.to_string(), location.clone()))
                .collect(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl Geolocator for FakeGeolocator {
    fn lookup(&self, address: &str) -> Option<Value> {
        self.lookups.lock().unwrap().push(address.to_string());
        self.table.get(address).cloned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

pub const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:alarms";

/// Alarm message as delivered inside the notification envelope.
pub fn alarm_message() -> Value {
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

pub fn alarm_payload() -> Value {
    json!({
        "Records": [{
            "Sns": {
                "TopicArn": TOPIC_ARN,
                "Message": alarm_message().to_string()
            }
        }]
    })
}

pub fn metric_filter() -> MetricFilter {
    MetricFilter {
        log_group_name: "test group".into(),
        filter_pattern: "test pattern".into(),
    }
}

pub fn config(pairs: &[(&str, &str)]) -> NotifierConfig {
    let mut env: HashMap<String, String> = [
        ("FROM_EMAIL", "alerts@example.com"),
        ("TO_EMAIL", "oncall@example.com"),
        ("SENDGRID_API_KEY", "SG.test"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    env.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    NotifierConfig::from_lookup(|key: &str| env.get(key).cloned()).unwrap()
}

/// A notifier wired to fakes, keeping handles for assertions.
pub struct Harness {
    pub filters: Arc<FakeFilters>,
    pub logs: Arc<FakeLogs>,
    pub subscriptions: Arc<FakeSubscriptions>,
    pub transport: Arc<FakeTransport>,
    pub geolocator: Arc<FakeGeolocator>,
}

impl Harness {
    /// One filter, two log pages, no subscriptions, a working transport.
    pub fn new() -> Self {
        Self {
            filters: Arc::new(FakeFilters::new(vec![metric_filter()])),
            logs: Arc::new(FakeLogs::new(vec![
                vec![r#"{"ip":"1.1.1.1","msg":"boom"}"#],
                vec!["<div>test</div>"],
            ])),
            subscriptions: Arc::new(FakeSubscriptions::new(vec![])),
            transport: Arc::new(FakeTransport::default()),
            geolocator: Arc::new(FakeGeolocator::with(&[("1.1.1.1", json!({"country": "AU"}))])),
        }
    }

    pub fn notifier(&self, config: &NotifierConfig) -> Notifier {
        Notifier::new(
            config,
            Collaborators {
                filters: self.filters.clone(),
                logs: self.logs.clone(),
                subscriptions: self.subscriptions.clone(),
                transport: self.transport.clone(),
                geolocator: Some(self.geolocator.clone()),
            },
        )
    }
}
