//! Protocol-agnostic response helpers and request identifiers.

use crate::body::MockResponseBody;
use crate::error::ServiceError;
use crate::protocol::Protocol;

/// Header every envelope carries the request identifier in.
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";

/// Generate an opaque request identifier.
#[must_use]
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A bodiless response (`204 No Content`, `HEAD` answers).
#[must_use]
pub fn empty_response(
    status: http::StatusCode,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    http::Response::builder()
        .status(status)
        .header(REQUEST_ID_HEADER, request_id)
        .body(MockResponseBody::empty())
        .expect("valid empty response")
}

/// The envelope returned when no service claims a request.
///
/// The framing follows the protocol family inferred from the request so the
/// calling SDK can decode it; the code is the family's generic
/// unknown-operation code (see [`ServiceError::unknown_operation`]).
#[must_use]
pub fn not_found_envelope<B>(
    req: &http::Request<B>,
    message: &str,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    let protocol = Protocol::infer(req);
    ServiceError::unknown_operation(protocol, message).to_response(protocol, request_id)
}
