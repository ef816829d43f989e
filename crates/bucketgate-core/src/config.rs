//! Gateway configuration.
//!
//! Provides [`GatewayConfig`] for selecting and configuring the object
//! backend and the presigner. Values are loaded from environment variables
//! and can also be assembled with the generated builder.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bucketgate_auth::{AddressingStyle, Credentials, Endpoint, MAX_EXPIRES_SECS, ObjectTarget};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{GatewayError, GatewayResult};

/// Which backend serves objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// An S3-compatible bucket, fetched through presigned URLs.
    #[default]
    S3,
    /// A directory on the local filesystem.
    Local,
}

impl FromStr for ServiceKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" => Ok(Self::Local),
            other => Err(GatewayError::Config(format!("Service {other} is unknown"))),
        }
    }
}

/// How presigned URLs are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresignerKind {
    /// The built-in SigV4 implementation.
    #[default]
    Manual,
    /// `aws-sdk-s3` presigning.
    Sdk,
}

impl FromStr for PresignerKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "sdk" => Ok(Self::Sdk),
            other => Err(GatewayError::Config(format!("Presigner {other} is unknown"))),
        }
    }
}

/// Gateway configuration.
///
/// # Examples
///
/// ```
/// use bucketgate_core::config::{GatewayConfig, ServiceKind};
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.service, ServiceKind::S3);
/// assert_eq!(config.s3_presign_expires, 900);
/// assert!(config.s3_virtual_hosting);
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Backend that serves objects.
    #[builder(default)]
    pub service: ServiceKind,

    /// Upper bound on one upstream fetch, in seconds.
    #[builder(default = 5)]
    pub timeout_seconds: u64,

    /// Root directory for the local backend.
    #[builder(default = String::from("."))]
    pub directory: String,

    /// Object store endpoint, `host[:port]` with an optional scheme.
    #[builder(default = String::from("s3.amazonaws.com"))]
    pub s3_endpoint_url: String,

    /// Signing region.
    #[builder(default = String::from("us-east-1"))]
    pub s3_region: String,

    /// Bucket holding the objects.
    #[builder(default)]
    pub s3_bucket: String,

    /// Prefix prepended to every requested path to form the object key.
    #[builder(default)]
    pub s3_prefix: String,

    /// Virtual-hosted-style addressing; `false` selects path style.
    #[builder(default = true)]
    pub s3_virtual_hosting: bool,

    /// Presigner implementation.
    #[builder(default)]
    pub s3_presigner: PresignerKind,

    /// Presigned URL lifetime in seconds.
    #[builder(default = 900)]
    pub s3_presign_expires: u64,

    /// Access key ID used for signing.
    #[builder(default)]
    pub access_key_id: String,

    /// Secret access key used for signing.
    #[builder(default)]
    #[serde(skip_serializing, default)]
    pub secret_access_key: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("service", &self.service)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("directory", &self.directory)
            .field("s3_endpoint_url", &self.s3_endpoint_url)
            .field("s3_region", &self.s3_region)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_prefix", &self.s3_prefix)
            .field("s3_virtual_hosting", &self.s3_virtual_hosting)
            .field("s3_presigner", &self.s3_presigner)
            .field("s3_presign_expires", &self.s3_presign_expires)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BUCKETGATE_SERVICE` | `s3` |
    /// | `BUCKETGATE_TIMEOUT_SECONDS` | `5` |
    /// | `BUCKETGATE_DIRECTORY` | `.` |
    /// | `S3_ENDPOINT_URL` | `s3.amazonaws.com` |
    /// | `S3_REGION` (or `AWS_REGION`) | `us-east-1` |
    /// | `S3_BUCKET` | *(empty)* |
    /// | `S3_PREFIX` | *(empty)* |
    /// | `S3_VIRTUAL_HOSTING` | `true` |
    /// | `S3_PRESIGNER` | `manual` |
    /// | `S3_PRESIGN_EXPIRES` | `900` |
    /// | `AWS_ACCESS_KEY_ID` | *(empty)* |
    /// | `AWS_SECRET_ACCESS_KEY` | *(empty)* |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] for an unknown service or presigner
    /// name, or a non-numeric timeout or expiry. The remaining consistency
    /// checks live in [`GatewayConfig::validate`].
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GatewayResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("BUCKETGATE_SERVICE") {
            config.service = v.parse()?;
        }
        if let Some(v) = lookup("BUCKETGATE_TIMEOUT_SECONDS") {
            config.timeout_seconds = parse_seconds("BUCKETGATE_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = lookup("BUCKETGATE_DIRECTORY") {
            config.directory = v;
        }
        if let Some(v) = lookup("S3_ENDPOINT_URL") {
            config.s3_endpoint_url = v;
        }
        if let Some(v) = lookup("S3_REGION").or_else(|| lookup("AWS_REGION")) {
            config.s3_region = v;
        }
        if let Some(v) = lookup("S3_BUCKET") {
            config.s3_bucket = v;
        }
        if let Some(v) = lookup("S3_PREFIX") {
            config.s3_prefix = v;
        }
        if let Some(v) = lookup("S3_VIRTUAL_HOSTING") {
            config.s3_virtual_hosting = parse_bool(&v);
        }
        if let Some(v) = lookup("S3_PRESIGNER") {
            config.s3_presigner = v.parse()?;
        }
        if let Some(v) = lookup("S3_PRESIGN_EXPIRES") {
            config.s3_presign_expires = parse_seconds("S3_PRESIGN_EXPIRES", &v)?;
        }
        if let Some(v) = lookup("AWS_ACCESS_KEY_ID") {
            config.access_key_id = v;
        }
        if let Some(v) = lookup("AWS_SECRET_ACCESS_KEY") {
            config.secret_access_key = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// Check that the selected backend has everything it needs.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] describing the first problem found.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.timeout_seconds == 0 {
            return Err(GatewayError::Config(
                "timeout_seconds must be greater than zero".to_owned(),
            ));
        }

        match self.service {
            ServiceKind::Local => {
                if self.directory.trim().is_empty() {
                    return Err(GatewayError::Config(
                        "directory is required for the local service".to_owned(),
                    ));
                }
            }
            ServiceKind::S3 => {
                if self.s3_bucket.trim().is_empty() {
                    return Err(GatewayError::Config(
                        "s3_bucket is required for the s3 service".to_owned(),
                    ));
                }
                if self.s3_region.trim().is_empty() {
                    return Err(GatewayError::Config("s3_region must not be empty".to_owned()));
                }
                if !(1..=MAX_EXPIRES_SECS).contains(&self.s3_presign_expires) {
                    return Err(GatewayError::Config(format!(
                        "s3_presign_expires must be between 1 and {MAX_EXPIRES_SECS} seconds, got {}",
                        self.s3_presign_expires
                    )));
                }
                if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
                    return Err(GatewayError::Config(
                        "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY are required for the s3 service"
                            .to_owned(),
                    ));
                }
                self.endpoint()?;
            }
        }

        Ok(())
    }

    /// Signing credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.access_key_id, &self.secret_access_key)
    }

    /// The configured addressing style.
    #[must_use]
    pub fn addressing_style(&self) -> AddressingStyle {
        if self.s3_virtual_hosting {
            AddressingStyle::VirtualHosted
        } else {
            AddressingStyle::Path
        }
    }

    /// The parsed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Presign`] if the endpoint cannot be parsed.
    pub fn endpoint(&self) -> GatewayResult<Endpoint> {
        Ok(Endpoint::parse(&self.s3_endpoint_url)?)
    }

    /// The bucket target presigned URLs point at.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Presign`] if the endpoint cannot be parsed.
    pub fn object_target(&self) -> GatewayResult<ObjectTarget> {
        Ok(ObjectTarget::new(
            self.endpoint()?,
            self.s3_bucket.clone(),
            self.addressing_style(),
        ))
    }

    /// Upstream fetch timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Presigned URL lifetime.
    #[must_use]
    pub fn presign_expires(&self) -> Duration {
        Duration::from_secs(self.s3_presign_expires)
    }
}

/// Parse a whole number of seconds from variable `name`.
fn parse_seconds(name: &str, value: &str) -> GatewayResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            GatewayError::Config(format!("{name} must be a number of seconds, got {value:?}"))
        })
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
