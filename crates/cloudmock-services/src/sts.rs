//! Mock STS (`awsQuery`). Stateless: identities are derived from the
//! configured account and every role assumption succeeds.

use cloudmock_protocol::request::{form_params, param};
use cloudmock_protocol::service::ready;
use cloudmock_protocol::xml::{self, Element};
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, ResetError, ServiceError, ServiceFuture,
    new_request_id,
};

use crate::context::{ServiceContext, iso8601};

const PROTOCOL: Protocol = Protocol::AwsQuery;

/// XML namespace of STS Query responses.
pub const NAMESPACE: &str = "https://sts.amazonaws.com/doc/2011-06-15/";

/// Lifetime of credentials returned by `AssumeRole` when none is requested.
const DEFAULT_SESSION_SECONDS: i64 = 3600;

/// Mock STS service.
#[derive(Debug)]
pub struct StsService {
    ctx: ServiceContext,
}

impl StsService {
    /// Create the service.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let params = form_params(req);
        let action = param(&params, "Action").unwrap_or_default();
        tracing::debug!(action, "sts operation");

        let account = self.ctx.account.as_str();
        let result = match action {
            "GetCallerIdentity" => vec![
                Element::text("Arn", format!("arn:aws:iam::{account}:root")),
                Element::text("UserId", account),
                Element::text("Account", account),
            ],
            "AssumeRole" => {
                let role_arn = param(&params, "RoleArn").unwrap_or_default();
                let session = param(&params, "RoleSessionName").unwrap_or_default();
                if role_arn.is_empty() || session.is_empty() {
                    return Err(ServiceError::bad_request(
                        "ValidationError",
                        "RoleArn and RoleSessionName are required",
                    ));
                }
                let seconds = param(&params, "DurationSeconds")
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(DEFAULT_SESSION_SECONDS);
                let role_name = role_arn.rsplit('/').next().unwrap_or(role_arn);
                let expiration = chrono::Utc::now() + chrono::Duration::seconds(seconds);
                vec![
                    Element::new("Credentials")
                        .child(Element::text("AccessKeyId", "ASIAMOCKACCESSKEY000"))
                        .child(Element::text(
                            "SecretAccessKey",
                            uuid::Uuid::new_v4().simple().to_string(),
                        ))
                        .child(Element::text("SessionToken", uuid::Uuid::new_v4().to_string()))
                        .child(Element::text("Expiration", iso8601(expiration))),
                    Element::new("AssumedRoleUser")
                        .child(Element::text(
                            "AssumedRoleId",
                            format!("AROAMOCKROLEID:{session}"),
                        ))
                        .child(Element::text(
                            "Arn",
                            format!("arn:aws:sts::{account}:assumed-role/{role_name}/{session}"),
                        )),
                ]
            }
            other => {
                return Err(ServiceError::unknown_operation(
                    PROTOCOL,
                    format!("Could not find operation {other}"),
                ));
            }
        };

        Ok(xml::query_response(action, NAMESPACE, result, request_id))
    }
}

impl MockService for StsService {
    fn name(&self) -> &str {
        "sts"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let response = self
            .dispatch(&req, &request_id)
            .unwrap_or_else(|err| err.to_response(PROTOCOL, &request_id));
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        Ok(())
    }
}
