//! Integration tests for CloudMock server using the AWS SDKs.
//!
//! These tests require a running CloudMock server at `localhost:4566`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p cloudmock-integration -- --ignored
//! ```

use std::sync::Once;

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("CLOUDMOCK_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

fn credentials() -> Credentials {
    init_tracing();
    Credentials::new("test", "test", None, None, "integration-test")
}

/// Create a configured S3 client pointing at the local server.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials())
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Create a configured DynamoDB client pointing at the local server.
#[must_use]
pub fn dynamodb_client() -> aws_sdk_dynamodb::Client {
    let config = aws_sdk_dynamodb::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
        .credentials_provider(credentials())
        .endpoint_url(endpoint_url())
        .build();

    aws_sdk_dynamodb::Client::from_conf(config)
}

/// Create a configured SQS client pointing at the local server.
#[must_use]
pub fn sqs_client() -> aws_sdk_sqs::Client {
    let config = aws_sdk_sqs::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(aws_sdk_sqs::config::Region::new("us-east-1"))
        .credentials_provider(credentials())
        .endpoint_url(endpoint_url())
        .build();

    aws_sdk_sqs::Client::from_conf(config)
}

/// Create a configured SSM client pointing at the local server.
#[must_use]
pub fn ssm_client() -> aws_sdk_ssm::Client {
    let config = aws_sdk_ssm::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(aws_sdk_ssm::config::Region::new("us-east-1"))
        .credentials_provider(credentials())
        .endpoint_url(endpoint_url())
        .build();

    aws_sdk_ssm::Client::from_conf(config)
}

/// Create a configured STS client pointing at the local server.
#[must_use]
pub fn sts_client() -> aws_sdk_sts::Client {
    let config = aws_sdk_sts::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(aws_sdk_sts::config::Region::new("us-east-1"))
        .credentials_provider(credentials())
        .endpoint_url(endpoint_url())
        .build();

    aws_sdk_sts::Client::from_conf(config)
}

/// Generate a unique resource name for a test.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

mod test_dynamodb;
mod test_gateway;
mod test_s3;
mod test_sqs;
mod test_ssm;
mod test_sts;
