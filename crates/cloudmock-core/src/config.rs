//! Configuration management for CloudMock.
//!
//! All configuration is driven by environment variables, matching LocalStack conventions.

use crate::types::{AccountId, AwsRegion};

/// Global configuration for CloudMock.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudMockConfig {
    /// Bind address for the gateway.
    pub gateway_listen: String,
    /// Region reported by services that do not derive one from the request.
    pub default_region: AwsRegion,
    /// Account that owns every mock resource.
    pub account_id: AccountId,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Services to register. Empty means all built-in services.
    pub services: Vec<String>,
    /// `host:port` advertised in generated URLs (queue URLs, API endpoints).
    pub external_host: String,
}

impl Default for CloudMockConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:4566".to_owned(),
            default_region: AwsRegion::default(),
            account_id: AccountId::default(),
            log_level: "info".to_owned(),
            services: Vec::new(),
            external_host: "localhost.localstack.cloud:4566".to_owned(),
        }
    }
}

impl CloudMockConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// [`CloudMockError::InvalidAccountId`](crate::CloudMockError::InvalidAccountId)
    /// if `DEFAULT_ACCOUNT_ID` is not a 12-digit string, and
    /// [`CloudMockError::Config`](crate::CloudMockError::Config) for a
    /// `GATEWAY_LISTEN` that is not `host:port`.
    pub fn from_env() -> crate::CloudMockResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::CloudMockResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            check_listen_addr(&v)?;
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("DEFAULT_REGION") {
            config.default_region = AwsRegion::new(v);
        }
        if let Some(v) = lookup("DEFAULT_ACCOUNT_ID") {
            config.account_id = AccountId::new(v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("SERVICES") {
            config.services = parse_services(&v);
        }
        if let Some(v) = lookup("LOCALSTACK_HOST") {
            config.external_host = v;
        }

        Ok(config)
    }

    /// Whether a built-in service should be registered under this configuration.
    #[must_use]
    pub fn is_enabled(&self, service: &str) -> bool {
        self.services.is_empty() || self.services.iter().any(|s| s == service)
    }
}

fn check_listen_addr(addr: &str) -> crate::CloudMockResult<()> {
    let invalid = |reason: &str| crate::CloudMockError::Config {
        var: "GATEWAY_LISTEN",
        reason: format!("{addr:?} {reason}"),
    };
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| invalid("is not host:port"))?;
    if host.is_empty() {
        return Err(invalid("has no host"));
    }
    port.parse::<u16>()
        .map(drop)
        .map_err(|_| invalid("has no valid port"))
}

/// Parse a comma-separated services list into lowercase service names.
///
/// Blank input yields an empty list, which enables every built-in service.
#[must_use]
pub fn parse_services(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
