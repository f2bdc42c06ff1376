//! Service contract, wire protocol helpers, and response envelopes for CloudMock.
//!
//! This crate is the boundary between the gateway and the individual mock
//! services:
//!
//! - **Service contract**: [`MockService`] (`name`, `handle`, `reset`)
//! - **Request signals**: target header, query/form parameters, host, SigV4 scope
//! - **Envelopes**: JSON (`awsJson1_0`, `awsJson1_1`, `restJson1`) and XML
//!   (`awsQuery`, `restXml`) success and error framing, request identifiers
//!
//! Every service renders its responses through these helpers, so the wire
//! format of errors is identical across services speaking the same protocol.

pub mod body;
pub mod error;
pub mod json;
pub mod protocol;
pub mod request;
pub mod response;
pub mod service;
pub mod xml;

pub use body::MockResponseBody;
pub use error::ServiceError;
pub use protocol::Protocol;
pub use request::MockRequest;
pub use response::{REQUEST_ID_HEADER, new_request_id};
pub use service::{MockService, ResetError, ServiceFuture};
