//! Object gateway core for bucketgate.
//!
//! Maps request paths onto objects held either in an S3-compatible bucket or
//! in a local directory. S3 objects are fetched through presigned GET URLs,
//! so the HTTP client never handles credentials directly.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Gateway error type
//! - [`presigner`] - Manual and SDK presigner strategies
//! - [`service`] - S3 and local object backends

pub mod config;
pub mod error;
pub mod presigner;
pub mod service;

pub use config::{GatewayConfig, PresignerKind, ServiceKind};
pub use error::{GatewayError, GatewayResult};
#[cfg(feature = "sdk")]
pub use presigner::SdkPresigner;
pub use presigner::{ManualPresigner, Presigner, build_presigner};
pub use service::{
    LocalObjectService, ObjectResponse, ObjectService, S3ObjectService, build_service,
};
