//! Object backends.
//!
//! A request path maps onto an object by dropping one leading `/`. The S3
//! backend prefixes the result with `s3_prefix`, presigns a GET for that key,
//! and fetches it. The local backend reads the file under `directory`.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::config::{GatewayConfig, ServiceKind};
use crate::error::{GatewayError, GatewayResult};
use crate::presigner::{Presigner, build_presigner};

/// Object body plus the headers copied from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectResponse {
    /// Object bytes.
    pub body: Bytes,
    /// `Content-Type` reported by the backend, if any.
    pub content_type: Option<String>,
    /// `Content-Length` reported by the backend, if any.
    pub content_length: Option<u64>,
}

/// A source of objects addressed by request path.
#[async_trait]
pub trait ObjectService: Send + Sync + fmt::Debug {
    /// Fetch the object for `path` (e.g. `/images/logo.png`).
    async fn get(&self, path: &str) -> GatewayResult<ObjectResponse>;
}

/// Strip exactly one leading `/` from a request path.
fn relative_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Fetches objects from an S3-compatible store through presigned URLs.
#[derive(Debug, Clone)]
pub struct S3ObjectService {
    client: reqwest::Client,
    presigner: Arc<dyn Presigner>,
    prefix: String,
    expires: Duration,
}

impl S3ObjectService {
    /// Create a service using `presigner` for URL construction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the HTTP client cannot be built.
    pub fn new(
        presigner: Arc<dyn Presigner>,
        prefix: impl Into<String>,
        expires: Duration,
        timeout: Duration,
    ) -> GatewayResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            presigner,
            prefix: prefix.into(),
            expires,
        })
    }

    /// Create a service from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the presigner or HTTP client cannot be built.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        Self::new(
            build_presigner(config)?,
            config.s3_prefix.clone(),
            config.presign_expires(),
            config.timeout(),
        )
    }

    /// The object key a request path maps to.
    #[must_use]
    pub fn object_key(&self, path: &str) -> String {
        format!("{}{}", self.prefix, relative_path(path))
    }

    /// Presign a GET for the object behind `path`, issued now.
    ///
    /// # Errors
    ///
    /// Returns an error if the presigner fails.
    pub async fn presign(&self, path: &str) -> GatewayResult<String> {
        let key = self.object_key(path);
        self.presigner
            .presign_get(&key, Utc::now(), self.expires)
            .await
    }
}

#[async_trait]
impl ObjectService for S3ObjectService {
    async fn get(&self, path: &str) -> GatewayResult<ObjectResponse> {
        let key = self.object_key(path);
        let url = self.presign(path).await?;

        debug!(key = %key, presigner = self.presigner.name(), "Fetching object");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(key = %key, status = status.as_u16(), "Upstream rejected object request");
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                key,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let content_length = response.content_length();
        let body = response.bytes().await?;

        debug!(key = %key, size = body.len(), "Fetched object");

        Ok(ObjectResponse {
            body,
            content_type,
            content_length,
        })
    }
}

/// Serves objects from a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectService {
    root: PathBuf,
}

impl LocalObjectService {
    /// Create a service rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `path` under the root, refusing anything that could escape it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPath`] for empty paths and paths with
    /// `..`, root, or prefix components.
    pub fn resolve(&self, path: &str) -> GatewayResult<PathBuf> {
        let relative = Path::new(relative_path(path));
        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => return Err(GatewayError::InvalidPath(path.to_owned())),
            }
        }
        if depth == 0 {
            return Err(GatewayError::InvalidPath(path.to_owned()));
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ObjectService for LocalObjectService {
    async fn get(&self, path: &str) -> GatewayResult<ObjectResponse> {
        let file = self.resolve(path)?;
        let body = match tokio::fs::read(&file).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GatewayError::NotFound(path.to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %file.display(), size = body.len(), "Read local object");

        Ok(ObjectResponse {
            content_length: Some(body.len() as u64),
            content_type: None,
            body: Bytes::from(body),
        })
    }
}

/// Build the backend selected by `config.service`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the backend cannot
/// be constructed.
pub fn build_service(config: &GatewayConfig) -> GatewayResult<Arc<dyn ObjectService>> {
    config.validate()?;

    let service: Arc<dyn ObjectService> = match config.service {
        ServiceKind::S3 => {
            info!(
                endpoint = %config.s3_endpoint_url,
                bucket = %config.s3_bucket,
                region = %config.s3_region,
                virtual_hosting = config.s3_virtual_hosting,
                "Using S3 object service"
            );
            Arc::new(S3ObjectService::from_config(config)?)
        }
        ServiceKind::Local => {
            info!(directory = %config.directory, "Using local object service");
            Arc::new(LocalObjectService::new(&config.directory))
        }
    };

    Ok(service)
}
