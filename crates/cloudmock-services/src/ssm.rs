//! Mock SSM Parameter Store (`awsJson1_1`, `X-Amz-Target: AmazonSSM.<Op>`).

use cloudmock_core::ResourceStore;
use cloudmock_protocol::request::target_action;
use cloudmock_protocol::service::ready;
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, ResetError, ServiceError, ServiceFuture,
    json, new_request_id,
};
use serde::{Deserialize, Serialize};

use crate::context::{ServiceContext, epoch_seconds};

const PROTOCOL: Protocol = Protocol::AwsJson1_1;

const VALID_TYPES: &[&str] = &["String", "StringList", "SecureString"];

#[derive(Debug, Clone)]
struct Parameter {
    name: String,
    value: String,
    kind: String,
    version: i64,
    last_modified: f64,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutParameterInput {
    name: Option<String>,
    value: Option<String>,
    #[serde(rename = "Type")]
    kind: Option<String>,
    description: Option<String>,
    #[serde(default)]
    overwrite: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NameInput {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeParametersInput {
    max_results: Option<usize>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterView<'a> {
    name: &'a str,
    #[serde(rename = "Type")]
    kind: &'a str,
    value: &'a str,
    version: i64,
    last_modified_date: f64,
    #[serde(rename = "ARN")]
    arn: String,
    data_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterMetadata<'a> {
    name: &'a str,
    #[serde(rename = "Type")]
    kind: &'a str,
    version: i64,
    last_modified_date: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// Mock SSM service.
#[derive(Debug)]
pub struct SsmService {
    ctx: ServiceContext,
    parameters: ResourceStore<Parameter>,
}

impl SsmService {
    /// Create a service with an empty parameter store.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            parameters: ResourceStore::new(),
        }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let action = target_action(req.headers()).unwrap_or_default();
        tracing::debug!(action, "ssm operation");
        match action {
            "PutParameter" => {
                let version = self.put_parameter(json::parse_body(req.body())?)?;
                json::success(
                    PROTOCOL,
                    &serde_json::json!({ "Version": version, "Tier": "Standard" }),
                    request_id,
                )
            }
            "GetParameter" => {
                let name = required_name(json::parse_body(req.body())?)?;
                let param = self.parameters.get(&name).ok_or_else(|| not_found(&name))?;
                json::success(
                    PROTOCOL,
                    &serde_json::json!({ "Parameter": self.view(&param) }),
                    request_id,
                )
            }
            "DeleteParameter" => {
                let name = required_name(json::parse_body(req.body())?)?;
                self.parameters.remove(&name).map_err(|_| not_found(&name))?;
                json::success(PROTOCOL, &serde_json::json!({}), request_id)
            }
            "DescribeParameters" => {
                let input: DescribeParametersInput = json::parse_body(req.body())?;
                self.describe_parameters(&input, request_id)
            }
            other => Err(ServiceError::unknown_operation(
                PROTOCOL,
                format!("Unrecognized operation: {other}"),
            )),
        }
    }

    fn put_parameter(&self, input: PutParameterInput) -> Result<i64, ServiceError> {
        let name = input
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::validation("Name is required"))?;
        let value = input
            .value
            .ok_or_else(|| ServiceError::validation("Value is required"))?;
        let kind = input.kind.unwrap_or_else(|| "String".to_owned());
        if !VALID_TYPES.contains(&kind.as_str()) {
            return Err(ServiceError::validation(format!(
                "1 validation error detected: Value '{kind}' at 'type' failed to satisfy constraint: Member must satisfy enum value set: [SecureString, StringList, String]"
            )));
        }

        let now = epoch_seconds(chrono::Utc::now());
        if self.parameters.contains(&name) {
            if !input.overwrite {
                return Err(ServiceError::bad_request(
                    "ParameterAlreadyExists",
                    "The parameter already exists. To overwrite this value, set the overwrite option in the request to true.",
                ));
            }
            return self
                .parameters
                .update(&name, |p| {
                    p.version += 1;
                    p.value = value;
                    p.kind = kind;
                    p.last_modified = now;
                    if input.description.is_some() {
                        p.description = input.description;
                    }
                    p.version
                })
                .map_err(|_| not_found(&name));
        }

        let param = Parameter {
            name: name.clone(),
            value,
            kind,
            version: 1,
            last_modified: now,
            description: input.description,
        };
        // A concurrent put may have won the race; report it the same way.
        self.parameters.create(name, param).map_err(|_| {
            ServiceError::bad_request("ParameterAlreadyExists", "The parameter already exists.")
        })?;
        Ok(1)
    }

    fn describe_parameters(
        &self,
        input: &DescribeParametersInput,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let max = input.max_results.unwrap_or(50).clamp(1, 50);
        let start = match input.next_token.as_deref() {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ServiceError::bad_request("InvalidNextToken", "The specified token is not valid."))?,
            None => 0,
        };

        let all = self.parameters.list();
        let page: Vec<ParameterMetadata<'_>> = all
            .iter()
            .skip(start)
            .take(max)
            .map(|(_, p)| ParameterMetadata {
                name: &p.name,
                kind: &p.kind,
                version: p.version,
                last_modified_date: p.last_modified,
                description: p.description.as_deref(),
            })
            .collect();
        let next = start + page.len();

        let mut output = serde_json::json!({ "Parameters": page });
        if next < all.len() {
            output["NextToken"] = serde_json::Value::String(next.to_string());
        }
        json::success(PROTOCOL, &output, request_id)
    }

    fn view<'a>(&self, param: &'a Parameter) -> ParameterView<'a> {
        let path = param.name.trim_start_matches('/');
        ParameterView {
            name: &param.name,
            kind: &param.kind,
            value: &param.value,
            version: param.version,
            last_modified_date: param.last_modified,
            arn: self.ctx.arn("ssm", &format!("parameter/{path}")),
            data_type: "text",
        }
    }
}

fn required_name(input: NameInput) -> Result<String, ServiceError> {
    input
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServiceError::validation("Name is required"))
}

fn not_found(name: &str) -> ServiceError {
    ServiceError::bad_request("ParameterNotFound", format!("Parameter {name} not found."))
}

impl MockService for SsmService {
    fn name(&self) -> &str {
        "ssm"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let response = self
            .dispatch(&req, &request_id)
            .unwrap_or_else(|err| err.to_response(PROTOCOL, &request_id));
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.parameters.clear();
        Ok(())
    }
}
