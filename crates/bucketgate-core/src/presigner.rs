//! Presigner strategies.
//!
//! The S3 backend asks a [`Presigner`] for a GET URL and fetches it. Two
//! implementations exist: [`ManualPresigner`] uses the SigV4 code in
//! `bucketgate-auth`, and `SdkPresigner` (behind the `sdk` feature) delegates
//! to `aws-sdk-s3`. Both sign the same inputs, so a store accepting one
//! accepts the other.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bucketgate_auth::{Credentials, ObjectTarget, PresignedUrl, presign_get};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{GatewayConfig, PresignerKind};
use crate::error::GatewayResult;

/// Produces presigned GET URLs for object keys in the configured bucket.
#[async_trait]
pub trait Presigner: Send + Sync + fmt::Debug {
    /// Presign a GET of `key`, valid for `expires` starting at `issued_at`.
    async fn presign_get(
        &self,
        key: &str,
        issued_at: DateTime<Utc>,
        expires: Duration,
    ) -> GatewayResult<String>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Presigner backed by the built-in SigV4 implementation.
#[derive(Debug, Clone)]
pub struct ManualPresigner {
    target: ObjectTarget,
    credentials: Credentials,
    region: String,
}

impl ManualPresigner {
    /// Create a presigner for `target`.
    pub fn new(target: ObjectTarget, credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            target,
            credentials,
            region: region.into(),
        }
    }

    /// Create a presigner from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint cannot be parsed.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        Ok(Self::new(
            config.object_target()?,
            config.credentials(),
            config.s3_region.clone(),
        ))
    }

    /// Presign synchronously, keeping the validity window.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Presign`](crate::error::GatewayError::Presign) if the URL cannot be built.
    pub fn presign(
        &self,
        key: &str,
        issued_at: DateTime<Utc>,
        expires: Duration,
    ) -> GatewayResult<PresignedUrl> {
        Ok(presign_get(
            &self.target,
            &self.credentials,
            &self.region,
            key,
            issued_at,
            expires.as_secs(),
        )?)
    }
}

#[async_trait]
impl Presigner for ManualPresigner {
    async fn presign_get(
        &self,
        key: &str,
        issued_at: DateTime<Utc>,
        expires: Duration,
    ) -> GatewayResult<String> {
        self.presign(key, issued_at, expires)
            .map(PresignedUrl::into_string)
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}

#[cfg(feature = "sdk")]
pub use sdk::SdkPresigner;

#[cfg(feature = "sdk")]
mod sdk {
    use std::time::{Duration, SystemTime};

    use async_trait::async_trait;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use aws_sdk_s3::error::DisplayErrorContext;
    use aws_sdk_s3::presigning::PresigningConfig;
    use chrono::{DateTime, Utc};

    use super::Presigner;
    use crate::config::GatewayConfig;
    use crate::error::{GatewayError, GatewayResult};

    /// Presigner backed by `aws-sdk-s3`.
    #[derive(Debug, Clone)]
    pub struct SdkPresigner {
        client: aws_sdk_s3::Client,
        bucket: String,
    }

    impl SdkPresigner {
        /// Create a presigner from gateway configuration.
        ///
        /// # Errors
        ///
        /// Returns an error if the configured endpoint cannot be parsed.
        pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
            let endpoint = config.endpoint()?;
            let creds = Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None,
                None,
                "bucketgate",
            );

            let sdk_config = aws_sdk_s3::config::Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(config.s3_region.clone()))
                .credentials_provider(creds)
                .endpoint_url(endpoint.to_string())
                .force_path_style(!config.s3_virtual_hosting)
                .build();

            Ok(Self {
                client: aws_sdk_s3::Client::from_conf(sdk_config),
                bucket: config.s3_bucket.clone(),
            })
        }
    }

    #[async_trait]
    impl Presigner for SdkPresigner {
        async fn presign_get(
            &self,
            key: &str,
            issued_at: DateTime<Utc>,
            expires: Duration,
        ) -> GatewayResult<String> {
            let presigning_config = PresigningConfig::builder()
                .start_time(SystemTime::from(issued_at))
                .expires_in(expires)
                .build()
                .map_err(|e| GatewayError::Sdk(DisplayErrorContext(e).to_string()))?;

            let presigned = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presigning_config)
                .await
                .map_err(|e| GatewayError::Sdk(DisplayErrorContext(e).to_string()))?;

            Ok(presigned.uri().to_string())
        }

        fn name(&self) -> &'static str {
            "sdk"
        }
    }
}

/// Build the presigner selected by `config.s3_presigner`.
///
/// # Errors
///
/// Returns [`GatewayError::Config`](crate::error::GatewayError::Config) when the SDK presigner is requested but
/// the `sdk` feature is disabled, or any error from constructing the
/// presigner.
pub fn build_presigner(config: &GatewayConfig) -> GatewayResult<Arc<dyn Presigner>> {
    let presigner: Arc<dyn Presigner> = match config.s3_presigner {
        PresignerKind::Manual => Arc::new(ManualPresigner::from_config(config)?),
        #[cfg(feature = "sdk")]
        PresignerKind::Sdk => Arc::new(SdkPresigner::from_config(config)?),
        #[cfg(not(feature = "sdk"))]
        PresignerKind::Sdk => {
            return Err(crate::error::GatewayError::Config(
                "the sdk presigner requires the `sdk` feature".to_owned(),
            ));
        }
    };

    debug!(presigner = presigner.name(), "Selected presigner");
    Ok(presigner)
}
