//! SigV4 signing: key derivation, string to sign, and the final signature.
//!
//! ```text
//! DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
//! DateRegionKey        = HMAC-SHA256(DateKey, region)
//! DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
//! SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
//! Signature            = hex(HMAC-SHA256(SigningKey, string_to_sign))
//! ```
//!
//! Malformed region or date strings are not rejected here. They produce a
//! well-formed but wrong signature that only the object store can detect.

use std::fmt;

use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

use crate::timestamp::SigningTime;

/// The signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// The service name for S3.
pub const SERVICE: &str = "s3";

/// The credential scope terminator.
pub const TERMINATOR: &str = "aws4_request";

/// Payload hash placeholder for presigned requests.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

type HmacSha256 = Hmac<Sha256>;

/// The `date/region/service/aws4_request` tuple a signing key is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    date: String,
    region: String,
    service: String,
}

impl CredentialScope {
    /// Create a scope from its components.
    pub fn new(
        date: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    /// The S3 scope for a signing instant and region.
    #[must_use]
    pub fn for_s3(time: &SigningTime, region: &str) -> Self {
        Self::new(time.date_stamp(), region, SERVICE)
    }

    /// `YYYYMMDD`
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Signing region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Signing service.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{TERMINATOR}",
            self.date, self.region, self.service
        )
    }
}

/// A derived 256-bit signing key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(** redacted **)")
    }
}

/// Derive the signing key for `scope`. The four steps run in a fixed order.
///
/// # Examples
///
/// ```
/// use bucketgate_auth::signer::{CredentialScope, derive_signing_key};
///
/// let scope = CredentialScope::new("20120215", "us-east-1", "iam");
/// let key = derive_signing_key("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", &scope);
/// assert_eq!(
///     hex::encode(key.as_bytes()),
///     "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
/// );
/// ```
#[must_use]
pub fn derive_signing_key(secret_access_key: &str, scope: &CredentialScope) -> SigningKey {
    let date_key = hmac_sha256(
        format!("AWS4{secret_access_key}").as_bytes(),
        scope.date.as_bytes(),
    );
    let date_region_key = hmac_sha256(&date_key, scope.region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, scope.service.as_bytes());
    SigningKey(hmac_sha256(&date_region_service_key, TERMINATOR.as_bytes()))
}

/// Build the string to sign.
///
/// ```text
/// AWS4-HMAC-SHA256\n
/// <YYYYMMDDTHHMMSSZ>\n
/// <credential scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
#[must_use]
pub fn build_string_to_sign(
    amz_date: &str,
    scope: &CredentialScope,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{amz_date}\n{scope}\n{canonical_request_hash}")
}

/// Lower-case hex HMAC-SHA256 of `data` under `signing_key`.
#[must_use]
pub fn compute_signature(signing_key: &SigningKey, data: &str) -> String {
    hex::encode(hmac_sha256(&signing_key.0, data.as_bytes()))
}

/// Derive the key for `scope` and sign `string_to_sign` with it.
///
/// The derived key lives only for the duration of this call.
#[must_use]
pub fn sign(secret_access_key: &str, scope: &CredentialScope, string_to_sign: &str) -> String {
    let signing_key = derive_signing_key(secret_access_key, scope);
    compute_signature(&signing_key, string_to_sign)
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac =
        <HmacSha256 as KeyInit>::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    let mut output = [0u8; 32];
    output.copy_from_slice(&digest);
    output
}
