//! Error types for presigning and presigned URL verification.
//!
//! Building a presigned URL can only fail while assembling the base URL
//! ([`PresignError`]). Everything after that point is a total function of its
//! inputs. Verification failures are reported through [`VerifyError`].

/// Errors raised while constructing a presigned URL.
#[derive(Debug, thiserror::Error)]
pub enum PresignError {
    /// The endpoint could not be parsed as `[scheme://]host[:port]`.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// The endpoint as supplied.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The bucket name cannot be placed in the requested addressing style.
    #[error("invalid bucket name {0:?}")]
    InvalidBucket(String),

    /// The object key is empty.
    #[error("object key must not be empty")]
    EmptyKey,

    /// The object key has a `.` or `..` path segment, which HTTP clients
    /// collapse before sending.
    #[error("object key {0:?} contains a dot segment")]
    DotSegmentKey(String),

    /// The assembled URL is not a valid URI.
    #[error("invalid presigned URL: {0}")]
    InvalidUrl(#[from] http::uri::InvalidUri),
}

/// Errors that can occur while verifying a presigned URL.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A required query parameter is missing or malformed.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(String),

    /// A signed header is absent from the request.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `X-Amz-Credential` value does not match
    /// `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key ID was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The verification instant precedes `X-Amz-Date`.
    #[error("Request is not yet valid")]
    RequestNotYetValid,

    /// The verification instant is at or past `X-Amz-Date` + `X-Amz-Expires`.
    #[error("Request has expired")]
    RequestExpired,

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}
