//! The frozen gateway: classifies each request and hands it to one service.
//!
//! Health checks (`/_localstack/health`, `/_health`, `/health`) and the reset
//! endpoint (`POST /_localstack/state/reset`) are answered here, before
//! classification.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cloudmock_core::CloudMockConfig;
use cloudmock_protocol::response::not_found_envelope;
use cloudmock_protocol::{MockRequest, MockResponseBody, REQUEST_ID_HEADER, new_request_id};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, warn};

use crate::classifier::{Classification, Classifier, ClassifyError};
use crate::registry::{GatewayBuilder, ServiceRegistry};
use crate::reset::{ResetFailure, reset_services};

/// Version reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Path of the reset endpoint.
pub const RESET_PATH: &str = "/_localstack/state/reset";

/// Response type produced by the gateway.
pub type GatewayResponse = http::Response<MockResponseBody>;

struct GatewayInner {
    registry: ServiceRegistry,
    classifier: Classifier,
}

/// A frozen registry plus its classifier. Cheap to clone.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub(crate) fn new(registry: ServiceRegistry, classifier: Classifier) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                registry,
                classifier,
            }),
        }
    }

    /// Builder seeded with the built-in services `config` enables.
    #[must_use]
    pub fn builder(config: &CloudMockConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    /// The registered services.
    #[must_use]
    pub fn registry(&self) -> &ServiceRegistry {
        &self.inner.registry
    }

    /// Registered service names in registration order.
    #[must_use]
    pub fn service_names(&self) -> Vec<&str> {
        self.inner.registry.names()
    }

    /// Decide which service owns `req` without dispatching it.
    pub fn classify(&self, req: &MockRequest) -> Result<Classification, ClassifyError> {
        self.inner.classifier.classify(req)
    }

    /// Reset every registered service, continuing past failures.
    ///
    /// No request may be in flight while this runs.
    pub fn reset_all(&self) -> Result<(), ResetFailure> {
        reset_services(self.inner.registry.iter())
    }

    /// Route one buffered request and return the owning service's response.
    pub async fn dispatch(&self, req: MockRequest) -> GatewayResponse {
        if is_health_check(req.method(), req.uri().path()) {
            return self.health_response();
        }
        if *req.method() == http::Method::POST && req.uri().path() == RESET_PATH {
            return self.reset_response();
        }

        let classification = match self.classify(&req) {
            Ok(classification) => classification,
            Err(err) => {
                warn!(
                    method = %req.method(),
                    path = req.uri().path(),
                    error = %err,
                    "unroutable request"
                );
                return not_found_envelope(&req, &err.to_string(), &new_request_id());
            }
        };

        let Some(service) = self.inner.registry.get(&classification.service) else {
            return not_found_envelope(
                &req,
                &format!("service {} is not registered", classification.service),
                &new_request_id(),
            );
        };
        debug!(
            service = %classification.service,
            signal = %classification.signal,
            action = classification.action.as_deref().unwrap_or(""),
            method = %req.method(),
            path = req.uri().path(),
            "dispatching request"
        );
        service.handle(req).await
    }

    fn health_response(&self) -> GatewayResponse {
        let services: serde_json::Map<String, serde_json::Value> = self
            .service_names()
            .into_iter()
            .map(|name| (name.to_owned(), serde_json::Value::from("running")))
            .collect();
        let body = serde_json::json!({
            "services": services,
            "edition": "community",
            "version": VERSION,
        });
        json_response(http::StatusCode::OK, &body)
    }

    fn reset_response(&self) -> GatewayResponse {
        match self.reset_all() {
            Ok(()) => json_response(http::StatusCode::OK, &serde_json::json!({ "status": "ok" })),
            Err(failure) => {
                let failed: serde_json::Map<String, serde_json::Value> = failure
                    .failures()
                    .iter()
                    .map(|(name, err)| (name.clone(), serde_json::Value::from(err.to_string())))
                    .collect();
                json_response(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    &serde_json::json!({ "status": "error", "failed": failed }),
                )
            }
        }
    }
}

impl Service<http::Request<Incoming>> for Gateway {
    type Response = GatewayResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let gateway = self.clone();
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    warn!(error = %err, "failed to read request body");
                    return Ok(json_response(
                        http::StatusCode::BAD_REQUEST,
                        &serde_json::json!({ "message": "failed to read request body" }),
                    ));
                }
            };
            Ok(gateway.dispatch(http::Request::from_parts(parts, body)).await)
        })
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET
        && (path == "/_localstack/health" || path == "/_health" || path == "/health")
}

fn json_response(status: http::StatusCode, body: &serde_json::Value) -> GatewayResponse {
    http::Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header(REQUEST_ID_HEADER, new_request_id())
        .body(MockResponseBody::from_string(body.to_string()))
        .expect("static gateway response should be valid")
}
