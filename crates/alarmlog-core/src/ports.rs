//! Traits for the external services a notifier run talks to.

use async_trait::async_trait;
use serde_json::Value;

use crate::model::{
    ComposedEmail, DeliveryReceipt, LogQuery, LogRecord, MetricFilter, Subscription,
    SubscriptionQuery,
};
use crate::page::Page;
use crate::NotifierError;

/// Looks up the metric filters that produce a metric.
#[async_trait]
pub trait MetricFilterDirectory: Send + Sync {
    async fn describe_metric_filters(
        &self,
        metric_name: &str,
        namespace: &str,
    ) -> Result<Vec<MetricFilter>, NotifierError>;
}

/// Serves one page of filtered log events per call.
#[async_trait]
pub trait LogQueryService: Send + Sync {
    async fn filter_log_events(&self, query: LogQuery) -> Result<Page<LogRecord>, NotifierError>;
}

/// Serves one page of topic subscriptions per call.
#[async_trait]
pub trait SubscriptionDirectory: Send + Sync {
    async fn list_subscriptions(
        &self,
        query: SubscriptionQuery,
    ) -> Result<Page<Subscription>, NotifierError>;
}

/// Resolves an IP address to a location descriptor.
pub trait Geolocator: Send + Sync {
    fn lookup(&self, address: &str) -> Option<Value>;
}

/// Delivers a composed email.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: &ComposedEmail) -> Result<DeliveryReceipt, NotifierError>;
}
