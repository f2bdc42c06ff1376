//! Mock CloudFront distributions (`restXml`, `/2020-05-31/distribution`).
//!
//! Only the identifying parts of a `DistributionConfig` are kept:
//! `CallerReference`, `Comment` and `Enabled`. Changes take effect
//! immediately, so every distribution reports `Deployed`.

use chrono::{DateTime, Utc};
use cloudmock_core::{ResourceStore, StoreError};
use cloudmock_protocol::request::header_str;
use cloudmock_protocol::service::ready;
use cloudmock_protocol::xml::{self, Element};
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, REQUEST_ID_HEADER, ResetError,
    ServiceError, ServiceFuture, new_request_id,
};

use crate::context::{ServiceContext, iso8601};

const PROTOCOL: Protocol = Protocol::RestXml;

/// XML namespace of CloudFront responses.
pub const NAMESPACE: &str = "http://cloudfront.amazonaws.com/doc/2020-05-31/";

/// Path prefix of the distribution resource.
pub const DISTRIBUTION_PATH: &str = "/2020-05-31/distribution";

#[derive(Debug, Clone)]
struct Distribution {
    id: String,
    arn: String,
    etag: String,
    caller_reference: String,
    comment: String,
    enabled: bool,
    last_modified: DateTime<Utc>,
}

impl Distribution {
    fn domain_name(&self) -> String {
        format!("{}.cloudfront.net", self.id.to_ascii_lowercase())
    }

    fn config(&self) -> Element {
        Element::new("DistributionConfig")
            .child(Element::text("CallerReference", self.caller_reference.as_str()))
            .child(Element::text("Comment", self.comment.as_str()))
            .child(Element::text("Enabled", self.enabled.to_string()))
    }

    fn to_xml(&self) -> Element {
        Element::new("Distribution")
            .attr("xmlns", NAMESPACE)
            .child(Element::text("Id", self.id.as_str()))
            .child(Element::text("ARN", self.arn.as_str()))
            .child(Element::text("Status", "Deployed"))
            .child(Element::text("LastModifiedTime", iso8601(self.last_modified)))
            .child(Element::text("DomainName", self.domain_name()))
            .child(self.config())
    }

    fn summary(&self) -> Element {
        Element::new("DistributionSummary")
            .child(Element::text("Id", self.id.as_str()))
            .child(Element::text("ARN", self.arn.as_str()))
            .child(Element::text("Status", "Deployed"))
            .child(Element::text("LastModifiedTime", iso8601(self.last_modified)))
            .child(Element::text("DomainName", self.domain_name()))
            .child(Element::text("Comment", self.comment.as_str()))
            .child(Element::text("Enabled", self.enabled.to_string()))
    }
}

/// Mock CloudFront service.
#[derive(Debug)]
pub struct CloudFrontService {
    ctx: ServiceContext,
    distributions: ResourceStore<Distribution>,
}

impl CloudFrontService {
    /// Create a service with no distributions.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            distributions: ResourceStore::new(),
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
            .strip_prefix(DISTRIBUTION_PATH)
            .map(|r| r.trim_matches('/'))
            .ok_or_else(|| unknown(req))?;
        tracing::debug!(method = %req.method(), id = rest, "cloudfront request");

        match (req.method(), rest) {
            (&http::Method::POST, "") => self.create_distribution(req, request_id),
            (&http::Method::GET, "") => Ok(self.list_distributions(request_id)),
            (&http::Method::GET, id) if !id.contains('/') => {
                let dist = self.distributions.require(id).map_err(distribution_error)?;
                distribution_response(http::StatusCode::OK, &dist, request_id)
            }
            (&http::Method::DELETE, id) if !id.contains('/') => {
                self.delete_distribution(id, req, request_id)
            }
            _ => Err(unknown(req)),
        }
    }

    fn create_distribution(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let mut fields = xml::read_fields(req.body(), &["CallerReference", "Comment", "Enabled"])?;
        let caller_reference = fields
            .remove("CallerReference")
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                ServiceError::bad_request("MalformedInput", "CallerReference is required")
            })?;
        let duplicate = self
            .distributions
            .list()
            .into_iter()
            .any(|(_, d)| d.caller_reference == caller_reference);
        if duplicate {
            return Err(ServiceError::conflict(
                "DistributionAlreadyExists",
                "The caller reference that you are using to create a distribution is associated with another distribution.",
            ));
        }

        let id = new_distribution_id();
        let dist = Distribution {
            arn: cloudmock_core::arn(
                "cloudfront",
                None,
                Some(&self.ctx.account),
                &format!("distribution/{id}"),
            ),
            etag: new_etag(),
            caller_reference,
            comment: fields.remove("Comment").unwrap_or_default(),
            enabled: fields.remove("Enabled").is_none_or(|v| v == "true"),
            last_modified: Utc::now(),
            id: id.clone(),
        };
        self.distributions
            .create(id.as_str(), dist.clone())
            .map_err(distribution_error)?;

        let mut response = distribution_response(http::StatusCode::CREATED, &dist, request_id)?;
        if let Ok(location) = http::HeaderValue::from_str(&format!(
            "{}{DISTRIBUTION_PATH}/{id}",
            self.ctx.base_url()
        )) {
            response.headers_mut().insert(http::header::LOCATION, location);
        }
        Ok(response)
    }

    fn list_distributions(&self, request_id: &str) -> http::Response<MockResponseBody> {
        let all = self.distributions.list();
        let mut root = Element::new("DistributionList")
            .attr("xmlns", NAMESPACE)
            .child(Element::text("Marker", ""))
            .child(Element::text("MaxItems", "100"))
            .child(Element::text("IsTruncated", "false"))
            .child(Element::text("Quantity", all.len().to_string()));
        if !all.is_empty() {
            root = root.child(Element::new("Items").children(all.iter().map(|(_, d)| d.summary())));
        }
        xml::rest_response(http::StatusCode::OK, &root, request_id)
    }

    fn delete_distribution(
        &self,
        id: &str,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let dist = self.distributions.require(id).map_err(distribution_error)?;
        match header_str(req.headers(), "if-match") {
            None => {
                return Err(ServiceError::bad_request(
                    "InvalidIfMatchVersion",
                    "The If-Match version is missing or not valid for the resource.",
                ));
            }
            Some(tag) if tag != dist.etag => {
                return Err(ServiceError::new(
                    "PreconditionFailed",
                    http::StatusCode::PRECONDITION_FAILED,
                    "The precondition given in one or more of the request-header fields evaluated to false.",
                ));
            }
            Some(_) => {}
        }
        self.distributions.remove(id).map_err(distribution_error)?;
        Ok(cloudmock_protocol::response::empty_response(
            http::StatusCode::NO_CONTENT,
            request_id,
        ))
    }
}

fn distribution_response(
    status: http::StatusCode,
    dist: &Distribution,
    request_id: &str,
) -> Result<http::Response<MockResponseBody>, ServiceError> {
    let mut response = xml::rest_response(status, &dist.to_xml(), request_id);
    let etag = http::HeaderValue::from_str(&dist.etag)
        .map_err(|e| ServiceError::internal(e.to_string()))?;
    response.headers_mut().insert(http::header::ETAG, etag);
    Ok(response)
}

/// Distribution ids are `E` followed by 13 upper-case alphanumerics.
fn new_distribution_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("E{}", &raw[..13])
}

fn new_etag() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("E{}", &raw[..12])
}

fn unknown(req: &MockRequest) -> ServiceError {
    ServiceError::unknown_operation(
        PROTOCOL,
        format!("No CloudFront operation matches {} {}", req.method(), req.uri().path()),
    )
}

fn distribution_error(err: StoreError) -> ServiceError {
    match err {
        StoreError::AlreadyExists(id) => ServiceError::conflict(
            "DistributionAlreadyExists",
            format!("Distribution {id} already exists."),
        ),
        StoreError::NotFound(_) => {
            ServiceError::not_found("NoSuchDistribution", "The specified distribution does not exist.")
        }
    }
}

impl MockService for CloudFrontService {
    fn name(&self) -> &str {
        "cloudfront"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let mut response = self
            .dispatch(&req, &request_id)
            .unwrap_or_else(|err| err.to_response(PROTOCOL, &request_id));
        // CloudFront clients read the request id from x-amz-request-id.
        if let Some(id) = response.headers().get(REQUEST_ID_HEADER).cloned() {
            response.headers_mut().insert("x-amz-request-id", id);
        }
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.distributions.clear();
        Ok(())
    }
}
