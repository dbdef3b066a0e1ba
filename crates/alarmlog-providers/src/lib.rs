//! Concrete collaborators for the alarmlog notifier.
//!
//! - [`CloudWatchLogsClient`]: metric filter lookup and filtered log queries
//! - [`SnsClient`]: topic subscription listing
//! - [`SendGridClient`]: email delivery over the SendGrid v3 API
//! - [`GeoTable`]: IP geolocation from a CIDR table
//!
//! AWS clients share one [`aws_config::SdkConfig`] from [`load_sdk_config`].

mod aws;
mod cloudwatch;
mod geo;
mod sendgrid;
mod sns;

pub use aws::load_sdk_config;
pub use cloudwatch::CloudWatchLogsClient;
pub use geo::{GeoTable, GeoTableError};
pub use sendgrid::{SendGridClient, SendGridError};
pub use sns::SnsClient;
