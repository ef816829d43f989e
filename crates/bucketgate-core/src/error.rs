//! Gateway error types.

use bucketgate_auth::PresignError;

/// Errors raised while configuring the gateway or serving an object.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The configuration is incomplete or inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A presigned URL could not be built.
    #[error(transparent)]
    Presign(#[from] PresignError),

    /// The SDK presigner failed.
    #[error("SDK presigning failed: {0}")]
    Sdk(String),

    /// The upstream request could not be sent or its body could not be read.
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream store answered with a status other than 200.
    #[error("Upstream returned status {status} for key {key}")]
    UpstreamStatus {
        /// HTTP status code returned by the store.
        status: u16,
        /// Object key that was requested.
        key: String,
    },

    /// The object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The requested path cannot be mapped onto the backend.
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    /// A filesystem operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the gateway.
pub type GatewayResult<T> = Result<T, GatewayError>;
