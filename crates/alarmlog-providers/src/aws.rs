//! Shared AWS SDK configuration.

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Loads the SDK configuration from the default provider chain, pinning the
/// region when one is configured.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest());
    let loader = match region {
        Some(region) => loader.region(Region::new(region.to_string())),
        None => loader,
    };
    loader.load().await
}

/// Drops empty continuation tokens, which some listings return on the last page.
pub(crate) fn cursor(token: Option<&str>) -> Option<String> {
    token.filter(|t| !t.is_empty()).map(str::to_string)
}
