//! Mock API Gateway v2 (`restJson1`, `/v2/apis`). Member names are camelCase.

use cloudmock_core::{ResourceStore, StoreError};
use cloudmock_protocol::response::empty_response;
use cloudmock_protocol::service::ready;
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, ResetError, ServiceError, ServiceFuture,
    json, new_request_id,
};
use serde::{Deserialize, Serialize};

use crate::context::{ServiceContext, iso8601};

const PROTOCOL: Protocol = Protocol::RestJson;

/// Path prefix of the APIs resource.
pub const APIS_PATH: &str = "/v2/apis";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateApiInput {
    name: Option<String>,
    protocol_type: Option<String>,
    description: Option<String>,
    route_selection_expression: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Api {
    api_id: String,
    name: String,
    protocol_type: String,
    api_endpoint: String,
    route_selection_expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    created_date: String,
}

/// Mock API Gateway v2 service.
#[derive(Debug)]
pub struct ApiGatewayV2Service {
    ctx: ServiceContext,
    apis: ResourceStore<Api>,
}

impl ApiGatewayV2Service {
    /// Create a service with no APIs.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            apis: ResourceStore::new(),
        }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let rest = req
            .uri()
            .path()
            .strip_prefix(APIS_PATH)
            .map(|r| r.trim_matches('/'))
            .ok_or_else(|| unknown(req))?;
        tracing::debug!(method = %req.method(), api = rest, "apigatewayv2 request");

        match (req.method(), rest) {
            (&http::Method::POST, "") => {
                let api = self.create_api(json::parse_body(req.body())?)?;
                json::with_status(PROTOCOL, http::StatusCode::CREATED, &api, request_id)
            }
            (&http::Method::GET, "") => {
                let items: Vec<Api> = self.apis.list().into_iter().map(|(_, a)| a).collect();
                json::success(PROTOCOL, &serde_json::json!({ "items": items }), request_id)
            }
            (&http::Method::GET, id) if !id.contains('/') => {
                let api = self.apis.require(id).map_err(api_error)?;
                json::success(PROTOCOL, &api, request_id)
            }
            (&http::Method::DELETE, id) if !id.contains('/') => {
                self.apis.remove(id).map_err(api_error)?;
                Ok(empty_response(http::StatusCode::NO_CONTENT, request_id))
            }
            _ => Err(unknown(req)),
        }
    }

    fn create_api(&self, input: CreateApiInput) -> Result<Api, ServiceError> {
        let name = input
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| bad_request("Invalid API name specified"))?;
        let protocol_type = input
            .protocol_type
            .ok_or_else(|| bad_request("Invalid protocol type specified"))?;
        let (scheme, default_selection) = match protocol_type.as_str() {
            "HTTP" => ("http", "$request.method $request.path"),
            "WEBSOCKET" => ("ws", "$request.body.action"),
            _ => return Err(bad_request("Invalid protocol type specified")),
        };

        let api_id: String = uuid::Uuid::new_v4().simple().to_string()[..10].to_owned();
        let api = Api {
            api_endpoint: format!("{scheme}://{api_id}.execute-api.{}", self.ctx.external_host),
            api_id: api_id.clone(),
            name,
            protocol_type,
            route_selection_expression: input
                .route_selection_expression
                .unwrap_or_else(|| default_selection.to_owned()),
            description: input.description,
            created_date: iso8601(chrono::Utc::now()),
        };
        self.apis.create(api_id, api).map_err(api_error)
    }
}

fn bad_request(message: &str) -> ServiceError {
    ServiceError::bad_request("BadRequestException", message)
}

fn unknown(req: &MockRequest) -> ServiceError {
    ServiceError::unknown_operation(
        PROTOCOL,
        format!("No API Gateway operation matches {} {}", req.method(), req.uri().path()),
    )
}

fn api_error(err: StoreError) -> ServiceError {
    match err {
        StoreError::AlreadyExists(id) => {
            ServiceError::conflict("ConflictException", format!("API {id} already exists"))
        }
        StoreError::NotFound(id) => ServiceError::not_found(
            "NotFoundException",
            format!("Invalid API identifier specified {id}"),
        ),
    }
}

impl MockService for ApiGatewayV2Service {
    fn name(&self) -> &str {
        "apigatewayv2"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let response = self
            .dispatch(&req, &request_id)
            .unwrap_or_else(|err| err.to_response(PROTOCOL, &request_id));
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.apis.clear();
        Ok(())
    }
}
