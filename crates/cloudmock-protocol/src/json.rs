//! JSON envelopes for the `awsJson1_0`, `awsJson1_1` and `restJson1` protocols.

use serde::Serialize;

use crate::body::MockResponseBody;
use crate::error::ServiceError;
use crate::protocol::Protocol;
use crate::response::REQUEST_ID_HEADER;

/// Serialize a service error into a JSON error body.
///
/// The error format follows the AWS JSON protocols:
///
/// ```json
/// {
///   "__type": "ResourceNotFoundException",
///   "message": "Requested resource not found"
/// }
/// ```
#[must_use]
pub fn error_to_json(error: &ServiceError) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "__type": error.code,
        "message": error.message,
    }))
    .unwrap_or_default()
}

/// Build a JSON response from already-serialized bytes.
///
/// JSON-RPC responses carry an `x-amz-crc32` checksum of the body, which the
/// DynamoDB SDKs verify.
#[must_use]
pub fn json_response(
    protocol: Protocol,
    status: http::StatusCode,
    json: Vec<u8>,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    let crc = crc32fast::hash(&json);

    let mut response = http::Response::builder()
        .status(status)
        .header("content-type", protocol.content_type())
        .header(REQUEST_ID_HEADER, request_id)
        .body(MockResponseBody::from_bytes(json))
        .expect("valid JSON response");

    if protocol != Protocol::RestJson {
        if let Ok(hv) = http::HeaderValue::from_str(&crc.to_string()) {
            response.headers_mut().insert("x-amz-crc32", hv);
        }
    }

    response
}

/// Serialize `output` and wrap it in a `200 OK` JSON response.
pub fn success<T: Serialize>(
    protocol: Protocol,
    output: &T,
    request_id: &str,
) -> Result<http::Response<MockResponseBody>, ServiceError> {
    with_status(protocol, http::StatusCode::OK, output, request_id)
}

/// Serialize `output` and wrap it in a JSON response with the given status.
///
/// REST-JSON create operations answer `201 Created`.
pub fn with_status<T: Serialize>(
    protocol: Protocol,
    status: http::StatusCode,
    output: &T,
    request_id: &str,
) -> Result<http::Response<MockResponseBody>, ServiceError> {
    let json = serde_json::to_vec(output)
        .map_err(|e| ServiceError::internal(format!("Failed to serialize response: {e}")))?;
    Ok(json_response(protocol, status, json, request_id))
}

/// Convert a [`ServiceError`] into a complete JSON error response.
///
/// REST-JSON additionally names the error in the `x-amzn-errortype` header.
#[must_use]
pub fn error_response(
    protocol: Protocol,
    error: &ServiceError,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    let mut response = json_response(protocol, error.status, error_to_json(error), request_id);
    if protocol == Protocol::RestJson {
        if let Ok(hv) = http::HeaderValue::from_str(&error.code) {
            response.headers_mut().insert("x-amzn-errortype", hv);
        }
    }
    response
}

/// Deserialize a JSON request body.
///
/// An empty body is treated as `{}` so operations whose fields are all
/// optional accept it, as the real services do.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| {
        ServiceError::serialization(format!("Failed to deserialize request body: {e}"))
    })
}
