//! Mock Lambda function registry (`restJson1`, `/2015-03-31/functions`).
//!
//! Functions are stored with their configuration and code digest; they are
//! never executed.

use base64::Engine;
use chrono::Utc;
use cloudmock_core::{ResourceStore, StoreError};
use cloudmock_protocol::service::ready;
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, ResetError, ServiceError, ServiceFuture,
    json, new_request_id,
};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::context::ServiceContext;

const PROTOCOL: Protocol = Protocol::RestJson;

/// Path prefix of the functions resource.
pub const FUNCTIONS_PATH: &str = "/2015-03-31/functions";

const DEFAULT_TIMEOUT: u32 = 3;
const DEFAULT_MEMORY: u32 = 128;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateFunctionInput {
    function_name: Option<String>,
    runtime: Option<String>,
    role: Option<String>,
    handler: Option<String>,
    description: Option<String>,
    timeout: Option<u32>,
    memory_size: Option<u32>,
    #[serde(default)]
    code: FunctionCodeInput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FunctionCodeInput {
    zip_file: Option<String>,
    s3_bucket: Option<String>,
    s3_key: Option<String>,
    image_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct FunctionConfiguration {
    function_name: String,
    function_arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    runtime: Option<String>,
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    handler: Option<String>,
    code_size: usize,
    code_sha256: String,
    description: String,
    timeout: u32,
    memory_size: u32,
    last_modified: String,
    version: String,
    state: String,
    package_type: String,
}

/// Mock Lambda service.
#[derive(Debug)]
pub struct LambdaService {
    ctx: ServiceContext,
    functions: ResourceStore<FunctionConfiguration>,
}

impl LambdaService {
    /// Create a service with no functions.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            functions: ResourceStore::new(),
        }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let path = req.uri().path();
        let rest = path
            .strip_prefix(FUNCTIONS_PATH)
            .map(|r| r.trim_matches('/'))
            .ok_or_else(|| unknown(req))?;
        tracing::debug!(method = %req.method(), function = rest, "lambda request");

        match (req.method(), rest) {
            (&http::Method::POST, "") => {
                let config = self.create_function(json::parse_body(req.body())?)?;
                json::with_status(PROTOCOL, http::StatusCode::CREATED, &config, request_id)
            }
            (&http::Method::GET, "") => {
                let functions: Vec<FunctionConfiguration> =
                    self.functions.list().into_iter().map(|(_, f)| f).collect();
                json::success(
                    PROTOCOL,
                    &serde_json::json!({ "Functions": functions }),
                    request_id,
                )
            }
            (&http::Method::GET, name) if !name.contains('/') => {
                let config = self
                    .functions
                    .require(&function_name(name))
                    .map_err(function_error)?;
                let location = format!(
                    "{}/lambda-code/{}",
                    self.ctx.base_url(),
                    config.function_name
                );
                json::success(
                    PROTOCOL,
                    &serde_json::json!({
                        "Configuration": config,
                        "Code": { "RepositoryType": "S3", "Location": location },
                    }),
                    request_id,
                )
            }
            (&http::Method::DELETE, name) if !name.contains('/') => {
                self.functions
                    .remove(&function_name(name))
                    .map_err(function_error)?;
                Ok(cloudmock_protocol::response::empty_response(
                    http::StatusCode::NO_CONTENT,
                    request_id,
                ))
            }
            _ => Err(unknown(req)),
        }
    }

    fn create_function(
        &self,
        input: CreateFunctionInput,
    ) -> Result<FunctionConfiguration, ServiceError> {
        let name = input
            .function_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid("FunctionName is required"))?;
        let role = input.role.ok_or_else(|| invalid("Role is required"))?;

        let code = &input.code;
        let package_type = if code.image_uri.is_some() { "Image" } else { "Zip" };
        if package_type == "Zip" && (input.runtime.is_none() || input.handler.is_none()) {
            return Err(invalid(
                "Runtime and Handler are mandatory parameters for functions created with Zip packages.",
            ));
        }
        let bytes = match (&code.zip_file, &code.s3_bucket, &code.s3_key) {
            (Some(zip), _, _) => base64::engine::general_purpose::STANDARD
                .decode(zip)
                .map_err(|e| invalid(format!("Could not unzip uploaded file: {e}")))?,
            (None, Some(bucket), Some(key)) => format!("s3://{bucket}/{key}").into_bytes(),
            (None, _, _) => match &code.image_uri {
                Some(uri) => uri.clone().into_bytes(),
                None => return Err(invalid("Code is required")),
            },
        };

        let config = FunctionConfiguration {
            function_arn: self.ctx.arn("lambda", &format!("function:{name}")),
            runtime: input.runtime,
            role,
            handler: input.handler,
            code_size: bytes.len(),
            code_sha256: base64::engine::general_purpose::STANDARD.encode(Sha256::digest(&bytes)),
            description: input.description.unwrap_or_default(),
            timeout: input.timeout.unwrap_or(DEFAULT_TIMEOUT),
            memory_size: input.memory_size.unwrap_or(DEFAULT_MEMORY),
            last_modified: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f+0000").to_string(),
            version: "$LATEST".to_owned(),
            state: "Active".to_owned(),
            package_type: package_type.to_owned(),
            function_name: name.clone(),
        };
        self.functions.create(name, config).map_err(function_error)
    }
}

/// Accept a plain name, a partial ARN, or a full ARN.
fn function_name(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    match decoded.split_once(":function:") {
        Some((_, tail)) => tail.split(':').next().unwrap_or(tail).to_owned(),
        None => decoded.into_owned(),
    }
}

fn invalid(message: impl Into<String>) -> ServiceError {
    ServiceError::bad_request("InvalidParameterValueException", message)
}

fn unknown(req: &MockRequest) -> ServiceError {
    ServiceError::unknown_operation(
        PROTOCOL,
        format!("No Lambda operation matches {} {}", req.method(), req.uri().path()),
    )
}

fn function_error(err: StoreError) -> ServiceError {
    match err {
        StoreError::AlreadyExists(name) => ServiceError::conflict(
            "ResourceConflictException",
            format!("Function already exist: {name}"),
        ),
        StoreError::NotFound(name) => ServiceError::not_found(
            "ResourceNotFoundException",
            format!("Function not found: {name}"),
        ),
    }
}

impl MockService for LambdaService {
    fn name(&self) -> &str {
        "lambda"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let response = self
            .dispatch(&req, &request_id)
            .unwrap_or_else(|err| err.to_response(PROTOCOL, &request_id));
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.functions.clear();
        Ok(())
    }
}
