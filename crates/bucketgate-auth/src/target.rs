//! Endpoint parsing and bucket addressing.
//!
//! An [`ObjectTarget`] turns `(endpoint, bucket, key)` into the host and
//! encoded path a presigned URL points at. Virtual-hosted style
//! (`<bucket>.<endpoint>/<key>`) is the default; path style
//! (`<endpoint>/<bucket>/<key>`) must be chosen explicitly for stores that
//! need it.

use std::fmt;
use std::str::FromStr;

use http::Uri;
use http::uri::{Authority, Scheme};

use crate::canonical::{encode_object_key, uri_encode};
use crate::credentials::Credentials;
use crate::error::PresignError;
use crate::presign::SigningRequest;
use crate::timestamp::SigningTime;

/// How the bucket is placed in the URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressingStyle {
    /// `https://<bucket>.<endpoint>/<key>`
    #[default]
    VirtualHosted,
    /// `https://<endpoint>/<bucket>/<key>`
    Path,
}

impl AddressingStyle {
    /// The configuration name of this style.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VirtualHosted => "virtual",
            Self::Path => "path",
        }
    }
}

impl fmt::Display for AddressingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "virtual" | "virtual-hosted" | "virtual_hosted" => Ok(Self::VirtualHosted),
            "path" => Ok(Self::Path),
            other => Err(format!("unknown addressing style: {other}")),
        }
    }
}

/// A parsed object-store endpoint: scheme plus `host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    authority: Authority,
}

impl Endpoint {
    /// Parse `host[:port]` or `scheme://host[:port][/]`.
    ///
    /// A missing scheme means `https`.
    ///
    /// # Errors
    ///
    /// Returns [`PresignError::InvalidEndpoint`] when the value is empty, uses a
    /// scheme other than `http`/`https`, carries credentials, a path, or a
    /// query, or is not a valid URI.
    pub fn parse(endpoint: &str) -> Result<Self, PresignError> {
        let invalid = |reason: &str| PresignError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: reason.to_owned(),
        };

        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(invalid("endpoint is empty"));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        };

        let uri: Uri = with_scheme
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;

        let scheme = uri.scheme().cloned().ok_or_else(|| invalid("missing scheme"))?;
        if scheme != Scheme::HTTPS && scheme != Scheme::HTTP {
            return Err(invalid("scheme must be http or https"));
        }

        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| invalid("missing host"))?;
        if authority.as_str().contains('@') {
            return Err(invalid("endpoint must not carry credentials"));
        }
        if authority.host().is_empty() {
            return Err(invalid("missing host"));
        }
        if !matches!(uri.path(), "" | "/") || uri.query().is_some() {
            return Err(invalid("endpoint must not contain a path or query"));
        }

        Ok(Self { scheme, authority })
    }

    /// URL scheme.
    #[must_use]
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Host name without port.
    #[must_use]
    pub fn host(&self) -> &str {
        self.authority.host()
    }

    /// The `host[:port]` value sent in the `Host` header. Default ports are
    /// dropped and the host is lowercased so the signed value matches what
    /// HTTP clients send.
    #[must_use]
    pub fn host_header(&self) -> String {
        self.host_header_for(self.host())
    }

    fn host_header_for(&self, host: &str) -> String {
        let host = host.to_ascii_lowercase();
        match self.authority.port_u16() {
            Some(port) if !self.is_default_port(port) => format!("{host}:{port}"),
            _ => host,
        }
    }

    fn is_default_port(&self, port: u16) -> bool {
        (self.scheme == Scheme::HTTPS && port == 443) || (self.scheme == Scheme::HTTP && port == 80)
    }
}

impl FromStr for Endpoint {
    type Err = PresignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host_header())
    }
}

/// A bucket on an endpoint, addressed in a fixed style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTarget {
    endpoint: Endpoint,
    bucket: String,
    addressing: AddressingStyle,
}

impl ObjectTarget {
    /// Create a target.
    pub fn new(endpoint: Endpoint, bucket: impl Into<String>, addressing: AddressingStyle) -> Self {
        Self {
            endpoint,
            bucket: bucket.into(),
            addressing,
        }
    }

    /// The endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The addressing style.
    #[must_use]
    pub fn addressing(&self) -> AddressingStyle {
        self.addressing
    }

    /// Resolve the `Host` value and encoded request path for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PresignError::EmptyKey`] for an empty key,
    /// [`PresignError::DotSegmentKey`] for keys with `.` or `..` segments,
    /// [`PresignError::InvalidBucket`] when the bucket cannot be expressed in
    /// the chosen addressing style, and [`PresignError::InvalidEndpoint`] when
    /// the endpoint host cannot carry a bucket label.
    pub fn locate(&self, key: &str) -> Result<(String, String), PresignError> {
        if key.is_empty() {
            return Err(PresignError::EmptyKey);
        }
        // HTTP clients resolve dot segments before sending, in raw or
        // percent-encoded form, so the signed path would never be requested.
        if key.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(PresignError::DotSegmentKey(key.to_owned()));
        }
        if self.bucket.is_empty() || self.bucket.contains('/') {
            return Err(PresignError::InvalidBucket(self.bucket.clone()));
        }

        let encoded_key = encode_object_key(key);
        match self.addressing {
            AddressingStyle::VirtualHosted => {
                if !is_dns_compatible(&self.bucket) {
                    return Err(PresignError::InvalidBucket(self.bucket.clone()));
                }
                if self.endpoint.host().starts_with('[') {
                    return Err(PresignError::InvalidEndpoint {
                        endpoint: self.endpoint.to_string(),
                        reason: "virtual-hosted addressing needs a DNS host name".to_owned(),
                    });
                }
                let host = self
                    .endpoint
                    .host_header_for(&format!("{}.{}", self.bucket, self.endpoint.host()));
                Authority::try_from(host.as_str()).map_err(|e| PresignError::InvalidEndpoint {
                    endpoint: self.endpoint.to_string(),
                    reason: format!("cannot prefix host with bucket: {e}"),
                })?;
                Ok((host, format!("/{encoded_key}")))
            }
            AddressingStyle::Path => Ok((
                self.endpoint.host_header(),
                format!("/{}/{encoded_key}", uri_encode(&self.bucket)),
            )),
        }
    }

    /// Build the [`SigningRequest`] for a GET of `key`.
    ///
    /// # Errors
    ///
    /// Propagates the construction errors of [`ObjectTarget::locate`].
    pub fn signing_request(
        &self,
        credentials: &Credentials,
        region: &str,
        key: &str,
        time: SigningTime,
        expires_secs: u64,
    ) -> Result<SigningRequest, PresignError> {
        let (host, object_path) = self.locate(key)?;
        Ok(SigningRequest {
            scheme: self.endpoint.scheme.clone(),
            host,
            object_path,
            credentials: credentials.clone(),
            region: region.to_owned(),
            time,
            expires_secs,
        })
    }
}

/// Whether `bucket` can be used as the leading DNS labels of a host name.
fn is_dns_compatible(bucket: &str) -> bool {
    bucket.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}
