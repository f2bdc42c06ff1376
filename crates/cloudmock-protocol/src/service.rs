//! The contract every mock service implements.

use std::future::Future;
use std::pin::Pin;

use crate::body::MockResponseBody;
use crate::request::MockRequest;

/// Future returned by [`MockService::handle`].
pub type ServiceFuture = Pin<Box<dyn Future<Output = http::Response<MockResponseBody>> + Send>>;

/// An independent, stateful emulation of one cloud API.
///
/// The gateway knows a service only through these three entry points. Each
/// implementation owns its state and its own synchronization; `handle` may be
/// called concurrently with itself. `reset` is only called while no request
/// is in flight for the service (the caller of the reset surface guarantees
/// quiescence).
pub trait MockService: Send + Sync + 'static {
    /// Stable, lowercase identifier matching the provider's service code
    /// (e.g. `"s3"`, `"dynamodb"`).
    fn name(&self) -> &str;

    /// Handle one fully buffered request.
    ///
    /// Service-local failures (missing resources, validation errors) are
    /// rendered into the returned response; the gateway forwards it untouched.
    fn handle(&self, req: MockRequest) -> ServiceFuture;

    /// Discard all mutable state, returning the service to its initial condition.
    fn reset(&self) -> Result<(), ResetError>;
}

/// Failure reported by [`MockService::reset`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ResetError {
    message: String,
}

impl ResetError {
    /// Create a reset error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Wrap an already computed response as a [`ServiceFuture`].
///
/// Services whose logic is synchronous in-memory map access use this instead
/// of spawning an async block.
#[must_use]
pub fn ready(response: http::Response<MockResponseBody>) -> ServiceFuture {
    Box::pin(std::future::ready(response))
}
