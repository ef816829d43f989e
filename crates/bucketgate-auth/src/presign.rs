//! Presigned GET URL construction.
//!
//! The query string carries the whole authorization:
//!
//! - `X-Amz-Algorithm` - `AWS4-HMAC-SHA256`
//! - `X-Amz-Credential` - `AKID/date/region/s3/aws4_request`
//! - `X-Amz-Date` - ISO 8601 basic format timestamp (`YYYYMMDDTHHMMSSZ`)
//! - `X-Amz-Expires` - Validity duration in seconds
//! - `X-Amz-SignedHeaders` - `host`
//! - `X-Amz-Signature` - The hex-encoded signature, appended last
//!
//! Every parameter except the signature goes into the canonical request.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use http::Uri;
use http::uri::Scheme;
use tracing::debug;

use crate::canonical::{SIGNED_HEADERS, canonicalize};
use crate::credentials::Credentials;
use crate::error::PresignError;
use crate::signer::{ALGORITHM, CredentialScope, build_string_to_sign, sign};
use crate::target::ObjectTarget;
use crate::timestamp::SigningTime;

/// Everything needed to presign one GET request.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// URL scheme of the endpoint.
    pub scheme: Scheme,
    /// `host[:port]`, no scheme, no path.
    pub host: String,
    /// Request path, already percent-encoded exactly once.
    pub object_path: String,
    /// Signing credentials.
    pub credentials: Credentials,
    /// Signing region.
    pub region: String,
    /// The instant the URL is issued at.
    pub time: SigningTime,
    /// Lifetime in seconds.
    pub expires_secs: u64,
}

impl SigningRequest {
    /// Presigned URLs only authorize GET.
    pub const METHOD: &'static str = "GET";
}

/// A presigned URL and the window it is valid in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    url: String,
    issued_at: DateTime<Utc>,
    expires_secs: u64,
}

impl PresignedUrl {
    /// The URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Consume into the URL string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.url
    }

    /// Start of the validity window.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// The `X-Amz-Expires` value.
    #[must_use]
    pub fn expires_secs(&self) -> u64 {
        self.expires_secs
    }

    /// First instant at which the URL is no longer valid.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.expires_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| self.issued_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `now` falls in `[issued_at, expires_at)`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.issued_at <= now && now < self.expires_at()
    }
}

impl fmt::Display for PresignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl AsRef<str> for PresignedUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

/// Build the presigned URL for `request`.
///
/// # Errors
///
/// Returns [`PresignError::InvalidUrl`] if the scheme, host, and path do not
/// form a valid URI.
pub fn build_presigned_url(request: &SigningRequest) -> Result<PresignedUrl, PresignError> {
    let scope = CredentialScope::for_s3(&request.time, &request.region);
    let amz_date = request.time.amz_date();
    let credential = format!("{}/{scope}", request.credentials.access_key_id());
    let expires = request.expires_secs.to_string();

    let canonical = canonicalize(
        SigningRequest::METHOD,
        &request.object_path,
        &[
            ("X-Amz-Algorithm", ALGORITHM),
            ("X-Amz-Credential", &credential),
            ("X-Amz-Date", &amz_date),
            ("X-Amz-Expires", &expires),
            ("X-Amz-SignedHeaders", SIGNED_HEADERS),
        ],
        &request.host,
    );

    debug!(canonical_request = %canonical, "Built presigned canonical request");

    let string_to_sign = build_string_to_sign(&amz_date, &scope, &canonical.hash());

    debug!(string_to_sign, "Built presigned string to sign");

    let signature = sign(
        request.credentials.secret_access_key(),
        &scope,
        &string_to_sign,
    );

    let url = format!(
        "{}://{}{}?{}&X-Amz-Signature={signature}",
        request.scheme,
        request.host,
        canonical.canonical_uri(),
        canonical.canonical_query(),
    );
    url.parse::<Uri>()?;

    debug!(
        host = %request.host,
        path = %request.object_path,
        expires = request.expires_secs,
        "Presigned GET URL"
    );

    Ok(PresignedUrl {
        url,
        issued_at: request.time.instant(),
        expires_secs: request.expires_secs,
    })
}

/// Presign a GET of `key` on `target`, valid for `expires_secs` from `issued_at`.
///
/// # Errors
///
/// Returns a [`PresignError`] when the endpoint, bucket, and key cannot be
/// combined into a URL.
pub fn presign_get(
    target: &ObjectTarget,
    credentials: &Credentials,
    region: &str,
    key: &str,
    issued_at: DateTime<Utc>,
    expires_secs: u64,
) -> Result<PresignedUrl, PresignError> {
    let request = target.signing_request(
        credentials,
        region,
        key,
        SigningTime::new(issued_at),
        expires_secs,
    )?;
    build_presigned_url(&request)
}
