//! Notifier configuration loaded from the process environment.
//!
//! Values are read through a lookup function so tests can supply them
//! without touching the real environment:
//!
//! ```rust
//! use alarmlog_config::{NotifierConfig, RecipientSetting};
//!
//! let config = NotifierConfig::from_lookup(|key| match key {
//!     "FROM_EMAIL" => Some("alerts@example.com".to_string()),
//!     "TO_EMAIL" => Some("sns-subscribers".to_string()),
//!     "SENDGRID_API_KEY" => Some("SG.key".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(config.recipients, RecipientSetting::Discover);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// `TO_EMAIL` value that switches recipient resolution to topic discovery.
pub const DISCOVER_RECIPIENTS: &str = "sns-subscribers";

pub const DEFAULT_SENDER_NAME: &str = "AWS Lambda";
pub const DEFAULT_LOG_VIEWER_URL: &str = "https://console.aws.amazon.com/cloudwatch/home";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

// ─────────────────────────────────────────────────────────────────────────────
// Config Structs
// ─────────────────────────────────────────────────────────────────────────────

/// Where the report is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientSetting {
    /// A single literal address.
    Address(String),
    /// Every email-protocol subscriber of the alarm's topic.
    Discover,
}

impl RecipientSetting {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            DISCOVER_RECIPIENTS => RecipientSetting::Discover,
            address => RecipientSetting::Address(address.to_string()),
        }
    }
}

/// Geolocation enrichment settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeolocationConfig {
    pub enabled: bool,
    /// CIDR table consulted for lookups.
    pub table_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub sender_name: String,
    pub from_email: String,
    pub recipients: RecipientSetting,
    pub sendgrid_api_key: String,
    /// Raw custom-metadata JSON; parsed when the email is composed.
    pub custom_args: Option<String>,
    pub geolocation: GeolocationConfig,
    pub aws_region: Option<String>,
    pub log_viewer_url: String,
    pub bind_addr: String,
}

impl NotifierConfig {
    /// Loads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let enabled = match optional("GEOLOCATE") {
            Some(raw) => parse_bool("GEOLOCATE", &raw)?,
            None => false,
        };
        let table_path = optional("GEOIP_TABLE").map(PathBuf::from);
        if enabled && table_path.is_none() {
            return Err(ConfigError::Missing("GEOIP_TABLE"));
        }

        Ok(Self {
            sender_name: optional("SENDER_NAME").unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
            from_email: required("FROM_EMAIL")?,
            recipients: RecipientSetting::parse(&required("TO_EMAIL")?),
            sendgrid_api_key: required("SENDGRID_API_KEY")?,
            custom_args: optional("SENDGRID_CUSTOM_ARGS"),
            geolocation: GeolocationConfig { enabled, table_path },
            aws_region: optional("AWS_REGION"),
            log_viewer_url: optional("LOG_VIEWER_URL")
                .unwrap_or_else(|| DEFAULT_LOG_VIEWER_URL.to_string()),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
        }),
    }
}
