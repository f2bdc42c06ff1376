//! Error types for the CloudMock core.

/// Core error type for CloudMock infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum CloudMockError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// An environment variable holds an unusable value.
    #[error("invalid {var}: {reason}")]
    Config {
        /// Variable name.
        var: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Convenience result type for CloudMock operations.
pub type CloudMockResult<T> = Result<T, CloudMockError>;
