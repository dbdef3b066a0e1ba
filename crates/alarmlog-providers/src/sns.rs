//! SNS topic subscription listing.

use alarmlog_core::{NotifierError, Page, Subscription, SubscriptionDirectory, SubscriptionQuery};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client;

use crate::aws::cursor;

pub struct SnsClient {
    client: Client,
}

impl SnsClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self::from_client(Client::new(config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SubscriptionDirectory for SnsClient {
    async fn list_subscriptions(
        &self,
        query: SubscriptionQuery,
    ) -> Result<Page<Subscription>, NotifierError> {
        let output = self
            .client
            .list_subscriptions_by_topic()
            .topic_arn(&query.topic_arn)
            .set_next_token(query.next_token)
            .send()
            .await
            .map_err(|e| NotifierError::upstream(DisplayErrorContext(&e).to_string()))?;

        let subscriptions = output
            .subscriptions()
            .iter()
            .map(|s| Subscription {
                protocol: s.protocol().unwrap_or_default().to_string(),
                endpoint: s.endpoint().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(Page {
            items: subscriptions,
            cursor: cursor(output.next_token()),
        })
    }
}
