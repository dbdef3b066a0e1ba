//! CloudWatch Logs: metric filter lookup and filtered log queries.

use alarmlog_core::{
    LogQuery, LogQueryService, LogRecord, MetricFilter, MetricFilterDirectory, NotifierError, Page,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::Client;
use tracing::debug;

use crate::aws::cursor;

pub struct CloudWatchLogsClient {
    client: Client,
}

impl CloudWatchLogsClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self::from_client(Client::new(config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricFilterDirectory for CloudWatchLogsClient {
    async fn describe_metric_filters(
        &self,
        metric_name: &str,
        namespace: &str,
    ) -> Result<Vec<MetricFilter>, NotifierError> {
        let output = self
            .client
            .describe_metric_filters()
            .metric_name(metric_name)
            .metric_namespace(namespace)
            .send()
            .await
            .map_err(|e| NotifierError::upstream(DisplayErrorContext(&e).to_string()))?;

        let filters: Vec<MetricFilter> = output
            .metric_filters()
            .iter()
            .filter_map(|f| {
                Some(MetricFilter {
                    log_group_name: f.log_group_name()?.to_string(),
                    filter_pattern: f.filter_pattern().unwrap_or_default().to_string(),
                })
            })
            .collect();

        debug!(metric_name, namespace, count = filters.len(), "Described metric filters");
        Ok(filters)
    }
}

#[async_trait]
impl LogQueryService for CloudWatchLogsClient {
    async fn filter_log_events(&self, query: LogQuery) -> Result<Page<LogRecord>, NotifierError> {
        let output = self
            .client
            .filter_log_events()
            .log_group_name(&query.log_group_name)
            .filter_pattern(&query.filter_pattern)
            .start_time(query.start_time)
            .end_time(query.end_time)
            .set_next_token(query.next_token)
            .send()
            .await
            .map_err(|e| NotifierError::upstream(DisplayErrorContext(&e).to_string()))?;

        let records = output
            .events()
            .iter()
            .map(|e| LogRecord::new(e.message().unwrap_or_default()))
            .collect();

        Ok(Page {
            items: records,
            cursor: cursor(output.next_token()),
        })
    }
}
