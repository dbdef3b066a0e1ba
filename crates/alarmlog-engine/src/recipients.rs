//! Resolves who receives the alarm report.

use alarmlog_config::RecipientSetting;
use alarmlog_core::{NotifierError, RecipientList, SubscriptionDirectory, SubscriptionQuery};
use tracing::debug;

use crate::pagination::paginate;

const EMAIL_PROTOCOL: &str = "email";

/// Turns the configured recipient setting into concrete addresses.
///
/// A literal address is returned as is. Discovery lists every subscription of
/// `topic_arn` and keeps the endpoints of email-protocol subscribers in the
/// order the directory returned them. Duplicates are kept. Discovery without
/// a topic is a malformed payload.
pub async fn resolve_recipients(
    setting: &RecipientSetting,
    topic_arn: &str,
    directory: &dyn SubscriptionDirectory,
) -> Result<RecipientList, NotifierError> {
    if let RecipientSetting::Address(address) = setting {
        return Ok(vec![address.clone()]);
    }
    if topic_arn.is_empty() {
        return Err(NotifierError::MalformedPayload(
            "TopicArn is required for subscriber discovery".to_string(),
        ));
    }

    let (_, subscriptions) = paginate(SubscriptionQuery::new(topic_arn), |query| {
        directory.list_subscriptions(query)
    })
    .await?;

    let total = subscriptions.len();
    let recipients: RecipientList = subscriptions
        .into_iter()
        .filter(|s| s.protocol == EMAIL_PROTOCOL)
        .map(|s| s.endpoint)
        .collect();

    debug!(topic_arn, total, count = recipients.len(), "Discovered recipients");
    Ok(recipients)
}
