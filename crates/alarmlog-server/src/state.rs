//! Server state wiring the notifier to its live collaborators.

use std::sync::Arc;

use alarmlog_config::NotifierConfig;
use alarmlog_core::Geolocator;
use alarmlog_engine::{Collaborators, Notifier};
use alarmlog_providers::{
    load_sdk_config, CloudWatchLogsClient, GeoTable, SendGridClient, SnsClient,
};
use anyhow::Result;
use tracing::info;

pub struct ServerState {
    pub notifier: Notifier,
    pub bind_addr: String,
}

impl ServerState {
    pub fn new(notifier: Notifier, bind_addr: impl Into<String>) -> Self {
        Self {
            notifier,
            bind_addr: bind_addr.into(),
        }
    }

    /// Builds AWS, SendGrid and geolocation clients once for all requests.
    pub async fn from_config(config: &NotifierConfig) -> Result<Self> {
        let sdk_config = load_sdk_config(config.aws_region.as_deref()).await;
        let logs = Arc::new(CloudWatchLogsClient::new(&sdk_config));

        let geolocator: Option<Arc<dyn Geolocator>> = match &config.geolocation.table_path {
            Some(path) if config.geolocation.enabled => Some(Arc::new(GeoTable::load(path)?)),
            _ => None,
        };

        let collaborators = Collaborators {
            filters: logs.clone(),
            logs,
            subscriptions: Arc::new(SnsClient::new(&sdk_config)),
            transport: Arc::new(SendGridClient::new(config.sendgrid_api_key.clone())),
            geolocator,
        };

        let notifier = Notifier::new(config, collaborators);
        info!(
            stages = ?notifier.stage_names(),
            recipients = ?config.recipients,
            geolocation = config.geolocation.enabled,
            "Notifier ready"
        );

        Ok(Self::new(notifier, config.bind_addr.clone()))
    }
}
