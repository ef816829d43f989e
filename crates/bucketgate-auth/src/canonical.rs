//! Canonical request construction for presigned GET URLs.
//!
//! The canonical request is the exact byte sequence both signer and verifier
//! hash:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! A presigned URL signs exactly one header (`host`) and never the body, so
//! the headers block is always `host:<host>\n` and the payload hash is the
//! literal `UNSIGNED-PAYLOAD`.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

use crate::signer::UNSIGNED_PAYLOAD;

/// Every byte except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is percent-encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Same as [`URI_ENCODE_SET`] but keeps `/` as a path separator.
const PATH_ENCODE_SET: &AsciiSet = &URI_ENCODE_SET.remove(b'/');

/// The only header a presigned URL signs.
pub const SIGNED_HEADERS: &str = "host";

/// A canonical request, kept as its six components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    canonical_uri: String,
    canonical_query: String,
    canonical_headers: String,
    payload_hash: &'static str,
}

impl CanonicalRequest {
    /// Build a canonical request from a query string that is already in
    /// canonical (encoded and sorted) form.
    #[must_use]
    pub fn new(method: &str, uri_path: &str, canonical_query: String, host: &str) -> Self {
        Self {
            method: method.to_owned(),
            canonical_uri: build_canonical_uri(uri_path),
            canonical_query,
            canonical_headers: format!("host:{}\n", host.trim()),
            payload_hash: UNSIGNED_PAYLOAD,
        }
    }

    /// The canonical query string component.
    #[must_use]
    pub fn canonical_query(&self) -> &str {
        &self.canonical_query
    }

    /// The canonical URI component.
    #[must_use]
    pub fn canonical_uri(&self) -> &str {
        &self.canonical_uri
    }

    /// Hex-encoded SHA-256 of the joined canonical request. This digest, not
    /// the request itself, goes into the string to sign.
    #[must_use]
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.to_string().as_bytes()))
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            self.canonical_uri,
            self.canonical_query,
            self.canonical_headers,
            SIGNED_HEADERS,
            self.payload_hash
        )
    }
}

/// Canonicalize a presigned GET request.
///
/// `uri_path` must already be percent-encoded exactly once (see
/// [`encode_object_key`]); `query_params` are raw, unencoded pairs.
///
/// # Examples
///
/// ```
/// use bucketgate_auth::canonical::canonicalize;
///
/// let canonical = canonicalize("GET", "/test.txt", &[("b", "2"), ("a", "1")], "example.com");
/// assert_eq!(
///     canonical.to_string(),
///     "GET\n/test.txt\na=1&b=2\nhost:example.com\n\nhost\nUNSIGNED-PAYLOAD"
/// );
/// ```
#[must_use]
pub fn canonicalize(
    method: &str,
    uri_path: &str,
    query_params: &[(&str, &str)],
    host: &str,
) -> CanonicalRequest {
    CanonicalRequest::new(
        method,
        uri_path,
        build_canonical_query_string(query_params),
        host,
    )
}

/// Normalize an encoded request path into a canonical URI.
///
/// S3 paths are not normalized further: the path is taken verbatim, and an
/// empty path becomes `/`.
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() {
        "/".to_owned()
    } else if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Encode raw query parameters and sort them by encoded key, then value.
///
/// # Examples
///
/// ```
/// use bucketgate_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(
///     build_canonical_query_string(&[("b", "x/y"), ("a", "1")]),
///     "a=1&b=x%2Fy"
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();

    encoded.sort_unstable();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sort a query string that arrived already encoded, without re-encoding it.
///
/// The verifier must hash exactly the encoding the signer produced, so
/// values are compared byte-wise as they appear on the wire.
#[must_use]
pub fn sort_encoded_query(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();

    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a query key or value with the SigV4 rules (`/` included).
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Percent-encode an object key for use in a URL path.
///
/// Every segment is encoded once; `/` separators are preserved.
///
/// # Examples
///
/// ```
/// use bucketgate_auth::canonical::encode_object_key;
///
/// assert_eq!(encode_object_key("photos/a b+c.jpg"), "photos/a%20b%2Bc.jpg");
/// ```
#[must_use]
pub fn encode_object_key(key: &str) -> String {
    utf8_percent_encode(key, PATH_ENCODE_SET).to_string()
}
