//! Settings shared by all built-in services.

use cloudmock_core::{AccountId, AwsRegion, CloudMockConfig};

/// Account, region and advertised endpoint used when rendering ARNs and URLs.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Region reported in ARNs.
    pub region: AwsRegion,
    /// Account that owns every resource.
    pub account: AccountId,
    /// `host:port` used in generated URLs.
    pub external_host: String,
}

impl ServiceContext {
    /// Regional ARN for a resource of `service`.
    #[must_use]
    pub fn arn(&self, service: &str, resource: &str) -> String {
        cloudmock_core::arn(service, Some(&self.region), Some(&self.account), resource)
    }

    /// Base URL (`http://host:port`) advertised to clients.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.external_host)
    }
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self::from(&CloudMockConfig::default())
    }
}

impl From<&CloudMockConfig> for ServiceContext {
    fn from(config: &CloudMockConfig) -> Self {
        Self {
            region: config.default_region.clone(),
            account: config.account_id.clone(),
            external_host: config.external_host.clone(),
        }
    }
}

/// Seconds since the epoch as the `f64` the JSON protocols use for timestamps.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable: AWS returns epoch seconds as f64
pub fn epoch_seconds(at: chrono::DateTime<chrono::Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// ISO 8601 timestamp with millisecond precision (`2006-02-03T16:45:09.000Z`).
#[must_use]
pub fn iso8601(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
