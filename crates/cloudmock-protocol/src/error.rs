//! Service-level error type rendered by the envelope library.

use std::borrow::Cow;

use crate::body::MockResponseBody;
use crate::protocol::Protocol;
use crate::{json, xml};

/// An error a mock service reports to its client.
///
/// The same value renders as a JSON envelope (`__type`/`message`), a Query
/// `ErrorResponse`, or a flat REST-XML `Error` depending on the protocol of
/// the service that raised it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    /// AWS error code, e.g. `ResourceNotFoundException`.
    pub code: Cow<'static, str>,
    /// Human-readable message.
    pub message: String,
    /// HTTP status code.
    pub status: http::StatusCode,
}

impl ServiceError {
    /// Create an error with an explicit status.
    #[must_use]
    pub fn new(
        code: impl Into<Cow<'static, str>>,
        status: http::StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// `400 Bad Request`, the status JSON-RPC and Query services use for most faults.
    #[must_use]
    pub fn bad_request(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::new(code, http::StatusCode::BAD_REQUEST, message)
    }

    /// `404 Not Found`.
    #[must_use]
    pub fn not_found(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::new(code, http::StatusCode::NOT_FOUND, message)
    }

    /// `409 Conflict`.
    #[must_use]
    pub fn conflict(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::new(code, http::StatusCode::CONFLICT, message)
    }

    /// A missing or malformed request field.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::bad_request("ValidationException", message)
    }

    /// The request body could not be decoded.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::bad_request("SerializationException", message)
    }

    /// Unexpected failure inside the mock.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            "InternalFailure",
            http::StatusCode::INTERNAL_SERVER_ERROR,
            message,
        )
    }

    /// The operation is not known, framed the way each protocol family reports it.
    ///
    /// JSON-RPC answers `400 UnknownOperationException`, Query answers
    /// `400 InvalidAction`, REST answers `404 NotFound`.
    #[must_use]
    pub fn unknown_operation(protocol: Protocol, message: impl Into<String>) -> Self {
        match protocol {
            Protocol::AwsJson1_0 | Protocol::AwsJson1_1 => {
                Self::bad_request("UnknownOperationException", message)
            }
            Protocol::AwsQuery => Self::bad_request("InvalidAction", message),
            Protocol::RestXml | Protocol::RestJson => Self::not_found("NotFound", message),
        }
    }

    /// Whether the client caused the error (`Sender`) rather than the server (`Receiver`).
    #[must_use]
    pub fn is_sender_fault(&self) -> bool {
        !self.status.is_server_error()
    }

    /// Render this error as a complete HTTP response for the given protocol.
    #[must_use]
    pub fn to_response(
        &self,
        protocol: Protocol,
        request_id: &str,
    ) -> http::Response<MockResponseBody> {
        match protocol {
            Protocol::AwsJson1_0 | Protocol::AwsJson1_1 | Protocol::RestJson => {
                json::error_response(protocol, self, request_id)
            }
            Protocol::AwsQuery => xml::query_error_response(self, request_id),
            Protocol::RestXml => xml::rest_error_response(self, None, request_id),
        }
    }
}
