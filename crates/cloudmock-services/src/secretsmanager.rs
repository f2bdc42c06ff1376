//! Mock Secrets Manager (`awsJson1_1`, `X-Amz-Target: secretsmanager.<Op>`).
//!
//! Secrets are addressed by name or by ARN. Deletion is immediate; the
//! recovery window is reported but not enforced.

use cloudmock_core::{ResourceStore, StoreError};
use cloudmock_protocol::request::target_action;
use cloudmock_protocol::service::ready;
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, ResetError, ServiceError, ServiceFuture,
    json, new_request_id,
};
use serde::{Deserialize, Serialize};

use crate::context::{ServiceContext, epoch_seconds};

const PROTOCOL: Protocol = Protocol::AwsJson1_1;

/// Default recovery window reported by `DeleteSecret`.
const DEFAULT_RECOVERY_DAYS: i64 = 30;

#[derive(Debug, Clone)]
struct Secret {
    name: String,
    arn: String,
    description: Option<String>,
    secret_string: Option<String>,
    version_id: String,
    created: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSecretInput {
    name: Option<String>,
    description: Option<String>,
    secret_string: Option<String>,
    client_request_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecretIdInput {
    secret_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteSecretInput {
    secret_id: Option<String>,
    recovery_window_in_days: Option<i64>,
    #[serde(default)]
    force_delete_without_recovery: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecretListEntry<'a> {
    #[serde(rename = "ARN")]
    arn: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    created_date: f64,
}

/// Mock Secrets Manager service.
#[derive(Debug)]
pub struct SecretsManagerService {
    ctx: ServiceContext,
    secrets: ResourceStore<Secret>,
}

impl SecretsManagerService {
    /// Create a service with no secrets.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            secrets: ResourceStore::new(),
        }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let action = target_action(req.headers()).unwrap_or_default();
        tracing::debug!(action, "secretsmanager operation");
        match action {
            "CreateSecret" => {
                let secret = self.create_secret(json::parse_body(req.body())?)?;
                json::success(
                    PROTOCOL,
                    &serde_json::json!({
                        "ARN": secret.arn,
                        "Name": secret.name,
                        "VersionId": secret.version_id,
                    }),
                    request_id,
                )
            }
            "GetSecretValue" => {
                let secret = self.resolve(json::parse_body::<SecretIdInput>(req.body())?.secret_id)?;
                let mut output = serde_json::json!({
                    "ARN": secret.arn,
                    "Name": secret.name,
                    "VersionId": secret.version_id,
                    "VersionStages": ["AWSCURRENT"],
                    "CreatedDate": secret.created,
                });
                if let Some(value) = secret.secret_string {
                    output["SecretString"] = serde_json::Value::String(value);
                }
                json::success(PROTOCOL, &output, request_id)
            }
            "DeleteSecret" => {
                let input: DeleteSecretInput = json::parse_body(req.body())?;
                let days = input.recovery_window_in_days.unwrap_or(DEFAULT_RECOVERY_DAYS);
                if input.force_delete_without_recovery && input.recovery_window_in_days.is_some() {
                    return Err(ServiceError::bad_request(
                        "InvalidParameterException",
                        "You can't use ForceDeleteWithoutRecovery in conjunction with RecoveryWindowInDays.",
                    ));
                }
                if !(7..=30).contains(&days) {
                    return Err(ServiceError::bad_request(
                        "InvalidParameterException",
                        "The RecoveryWindowInDays value must be between 7 and 30 days (inclusive).",
                    ));
                }
                let secret = self.resolve(input.secret_id)?;
                self.secrets.remove(&secret.name).map_err(secret_error)?;
                let deletion = chrono::Utc::now() + chrono::Duration::days(days);
                json::success(
                    PROTOCOL,
                    &serde_json::json!({
                        "ARN": secret.arn,
                        "Name": secret.name,
                        "DeletionDate": epoch_seconds(deletion),
                    }),
                    request_id,
                )
            }
            "ListSecrets" => {
                let all = self.secrets.list();
                let entries: Vec<SecretListEntry<'_>> = all
                    .iter()
                    .map(|(_, s)| SecretListEntry {
                        arn: &s.arn,
                        name: &s.name,
                        description: s.description.as_deref(),
                        created_date: s.created,
                    })
                    .collect();
                json::success(PROTOCOL, &serde_json::json!({ "SecretList": entries }), request_id)
            }
            other => Err(ServiceError::unknown_operation(
                PROTOCOL,
                format!("Unrecognized operation: {other}"),
            )),
        }
    }

    fn create_secret(&self, input: CreateSecretInput) -> Result<Secret, ServiceError> {
        let name = input
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::validation("Name is required"))?;
        // Real ARNs end in a random six character suffix.
        let suffix: String = uuid::Uuid::new_v4().simple().to_string()[..6].to_owned();
        let secret = Secret {
            arn: self.ctx.arn("secretsmanager", &format!("secret:{name}-{suffix}")),
            name: name.clone(),
            description: input.description,
            secret_string: input.secret_string,
            version_id: input
                .client_request_token
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            created: epoch_seconds(chrono::Utc::now()),
        };
        self.secrets.create(name, secret).map_err(secret_error)
    }

    /// Look a secret up by name or full ARN.
    fn resolve(&self, secret_id: Option<String>) -> Result<Secret, ServiceError> {
        let id = secret_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServiceError::validation("SecretId is required"))?;
        if id.starts_with("arn:") {
            return self
                .secrets
                .list()
                .into_iter()
                .map(|(_, s)| s)
                .find(|s| s.arn == id)
                .ok_or_else(|| secret_error(StoreError::NotFound(id)));
        }
        self.secrets.require(&id).map_err(secret_error)
    }
}

fn secret_error(err: StoreError) -> ServiceError {
    match err {
        StoreError::AlreadyExists(name) => ServiceError::bad_request(
            "ResourceExistsException",
            format!("The operation failed because the secret {name} already exists."),
        ),
        StoreError::NotFound(_) => ServiceError::bad_request(
            "ResourceNotFoundException",
            "Secrets Manager can't find the specified secret.",
        ),
    }
}

impl MockService for SecretsManagerService {
    fn name(&self) -> &str {
        "secretsmanager"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let response = self
            .dispatch(&req, &request_id)
            .unwrap_or_else(|err| err.to_response(PROTOCOL, &request_id));
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.secrets.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use cloudmock_protocol::body::collect_bytes;

    use super::*;

    async fn call(
        svc: &SecretsManagerService,
        op: &str,
        body: &str,
    ) -> (http::StatusCode, serde_json::Value) {
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header("x-amz-target", format!("secretsmanager.{op}"))
            .header("content-type", "application/x-amz-json-1.1")
            .body(Bytes::from(body.to_owned()))
            .unwrap();
        let resp = svc.handle(req).await;
        let status = resp.status();
        let bytes = collect_bytes(resp.into_body()).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_should_store_and_read_secret_by_name_and_arn() {
        let svc = SecretsManagerService::new(ServiceContext::default());
        let (status, created) = call(
            &svc,
            "CreateSecret",
            r#"{"Name":"db-pass","SecretString":"hunter2"}"#,
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
        let arn = created["ARN"].as_str().unwrap().to_owned();
        assert!(arn.starts_with("arn:aws:secretsmanager:us-east-1:000000000000:secret:db-pass-"));

        let (_, by_name) = call(&svc, "GetSecretValue", r#"{"SecretId":"db-pass"}"#).await;
        assert_eq!(by_name["SecretString"], "hunter2");

        let (_, by_arn) = call(&svc, "GetSecretValue", &format!(r#"{{"SecretId":"{arn}"}}"#)).await;
        assert_eq!(by_arn["Name"], "db-pass");
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_secret() {
        let svc = SecretsManagerService::new(ServiceContext::default());
        call(&svc, "CreateSecret", r#"{"Name":"s"}"#).await;
        let (status, body) = call(&svc, "CreateSecret", r#"{"Name":"s"}"#).await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["__type"], "ResourceExistsException");
    }

    #[tokio::test]
    async fn test_should_validate_recovery_window() {
        let svc = SecretsManagerService::new(ServiceContext::default());
        call(&svc, "CreateSecret", r#"{"Name":"s"}"#).await;
        let (_, body) = call(
            &svc,
            "DeleteSecret",
            r#"{"SecretId":"s","RecoveryWindowInDays":3}"#,
        )
        .await;
        assert_eq!(body["__type"], "InvalidParameterException");

        let (status, _) = call(&svc, "DeleteSecret", r#"{"SecretId":"s"}"#).await;
        assert_eq!(status, http::StatusCode::OK);
        let (_, body) = call(&svc, "GetSecretValue", r#"{"SecretId":"s"}"#).await;
        assert_eq!(body["__type"], "ResourceNotFoundException");
    }

    #[tokio::test]
    async fn test_should_list_secrets_until_reset() {
        let svc = SecretsManagerService::new(ServiceContext::default());
        call(&svc, "CreateSecret", r#"{"Name":"b"}"#).await;
        call(&svc, "CreateSecret", r#"{"Name":"a","Description":"first"}"#).await;
        let (_, body) = call(&svc, "ListSecrets", "{}").await;
        assert_eq!(body["SecretList"][0]["Name"], "a");
        assert_eq!(body["SecretList"][0]["Description"], "first");
        assert_eq!(body["SecretList"][1]["Name"], "b");

        svc.reset().unwrap();
        let (_, body) = call(&svc, "ListSecrets", "{}").await;
        assert_eq!(body["SecretList"], serde_json::json!([]));
    }
}
