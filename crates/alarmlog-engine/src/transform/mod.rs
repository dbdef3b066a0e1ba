//! Per-record transformation of fetched log messages.
//!
//! Every record runs independently through an ordered list of
//! [`Transformer`]s. Transformers never fail: one that cannot apply hands its
//! input back unchanged. Records may finish in any order but
//! [`TransformChain::transform_all`] always returns them in input order.

mod stages;

use std::sync::Arc;

use alarmlog_core::{Geolocator, LogRecord};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

pub use stages::{Geolocate, HtmlEncode, JsonDecode, PrettyPrint, PRIMARY_IP_KEY, SECONDARY_IP_KEY};

/// A log message part way through the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum LogLine {
    Text(String),
    Structured(Value),
}

impl LogLine {
    /// Final textual form. Structured values that were never rendered come out as compact JSON.
    pub fn into_text(self) -> String {
        match self {
            LogLine::Text(text) => text,
            LogLine::Structured(value) => value.to_string(),
        }
    }
}

#[async_trait]
pub trait Transformer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, line: LogLine) -> LogLine;
}

/// Ordered list of transformers applied to each record.
#[derive(Clone)]
pub struct TransformChain {
    stages: Vec<Arc<dyn Transformer>>,
}

impl TransformChain {
    pub fn new(stages: Vec<Arc<dyn Transformer>>) -> Self {
        Self { stages }
    }

    /// Decode, optionally geolocate, render, then escape.
    pub fn standard(geolocator: Option<Arc<dyn Geolocator>>) -> Self {
        let mut stages: Vec<Arc<dyn Transformer>> = vec![Arc::new(JsonDecode)];
        if let Some(geolocator) = geolocator {
            stages.push(Arc::new(Geolocate::new(geolocator)));
        }
        stages.push(Arc::new(PrettyPrint));
        stages.push(Arc::new(HtmlEncode));
        Self::new(stages)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs one message through every stage.
    pub async fn transform(&self, message: &str) -> String {
        let mut line = LogLine::Text(message.to_string());
        for stage in &self.stages {
            line = stage.apply(line).await;
        }
        line.into_text()
    }

    /// Transforms all records concurrently, returning results in input order.
    pub async fn transform_all(&self, records: &[LogRecord]) -> Vec<String> {
        join_all(records.iter().map(|r| self.transform(&r.message))).await
    }
}
