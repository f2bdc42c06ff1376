//! Built-in in-memory mock services for CloudMock.
//!
//! Each module implements one service behind the
//! [`MockService`](cloudmock_protocol::MockService) contract and owns all of
//! its state. Services never reference each other; the gateway composes them.
//!
//! | Service          | Protocol      |
//! |------------------|---------------|
//! | `dynamodb`       | `awsJson1_0`  |
//! | `ssm`            | `awsJson1_1`  |
//! | `secretsmanager` | `awsJson1_1`  |
//! | `sqs`            | `awsQuery`    |
//! | `sns`            | `awsQuery`    |
//! | `sts`            | `awsQuery`    |
//! | `s3`             | `restXml`     |
//! | `cloudfront`     | `restXml`     |
//! | `lambda`         | `restJson1`   |
//! | `apigatewayv2`   | `restJson1`   |

pub mod apigatewayv2;
pub mod cloudfront;
pub mod context;
pub mod dynamodb;
pub mod lambda;
pub mod s3;
pub mod secretsmanager;
pub mod sns;
pub mod sqs;
pub mod ssm;
pub mod sts;

use std::sync::Arc;

use cloudmock_core::CloudMockConfig;
use cloudmock_protocol::MockService;

pub use context::ServiceContext;

/// Names of every built-in service, in registration order.
pub const BUILTIN_NAMES: &[&str] = &[
    "dynamodb",
    "ssm",
    "secretsmanager",
    "sqs",
    "sns",
    "sts",
    "s3",
    "cloudfront",
    "lambda",
    "apigatewayv2",
];

/// Construct one built-in service by name.
#[must_use]
pub fn builtin_service(name: &str, ctx: &ServiceContext) -> Option<Arc<dyn MockService>> {
    let ctx = ctx.clone();
    let service: Arc<dyn MockService> = match name {
        "dynamodb" => Arc::new(dynamodb::DynamoDBService::new(ctx)),
        "ssm" => Arc::new(ssm::SsmService::new(ctx)),
        "secretsmanager" => Arc::new(secretsmanager::SecretsManagerService::new(ctx)),
        "sqs" => Arc::new(sqs::SqsService::new(ctx)),
        "sns" => Arc::new(sns::SnsService::new(ctx)),
        "sts" => Arc::new(sts::StsService::new(ctx)),
        "s3" => Arc::new(s3::S3Service::new(ctx)),
        "cloudfront" => Arc::new(cloudfront::CloudFrontService::new(ctx)),
        "lambda" => Arc::new(lambda::LambdaService::new(ctx)),
        "apigatewayv2" => Arc::new(apigatewayv2::ApiGatewayV2Service::new(ctx)),
        _ => return None,
    };
    Some(service)
}

/// Construct every built-in service enabled by `config.services`.
#[must_use]
pub fn builtin_services(config: &CloudMockConfig) -> Vec<Arc<dyn MockService>> {
    let ctx = ServiceContext::from(config);
    BUILTIN_NAMES
        .iter()
        .filter(|name| config.is_enabled(name))
        .filter_map(|name| builtin_service(name, &ctx))
        .collect()
}
