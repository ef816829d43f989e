//! Integration tests for bucketgate against a live S3-compatible store.
//!
//! These tests require a store at `localhost:4566` (override with
//! `S3_ENDPOINT_URL`) that accepts the `test`/`test` credential pair.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p bucketgate-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use bucketgate_core::{GatewayConfig, PresignerKind};

/// Access key ID the store accepts.
pub const ACCESS_KEY: &str = "test";
/// Secret access key the store accepts.
pub const SECRET_KEY: &str = "test";
/// Signing region.
pub const REGION: &str = "us-east-1";

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the store.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Create an S3 client used to seed and clean up fixtures.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new(ACCESS_KEY, SECRET_KEY, None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(REGION))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Gateway configuration pointing at `bucket` on the store, path style.
#[must_use]
pub fn gateway_config(bucket: &str, prefix: &str, presigner: PresignerKind) -> GatewayConfig {
    GatewayConfig::builder()
        .s3_endpoint_url(endpoint_url())
        .s3_region(REGION.to_owned())
        .s3_bucket(bucket.to_owned())
        .s3_prefix(prefix.to_owned())
        .s3_virtual_hosting(false)
        .s3_presigner(presigner)
        .access_key_id(ACCESS_KEY.to_owned())
        .secret_access_key(SECRET_KEY.to_owned())
        .build()
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name. Caller is responsible for cleanup.
pub async fn create_test_bucket(client: &aws_sdk_s3::Client, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    client
        .create_bucket()
        .bucket(&name)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// Delete all objects in a bucket, then delete the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    if let Ok(resp) = client.list_objects_v2().bucket(bucket).send().await {
        for obj in resp.contents() {
            if let Some(key) = obj.key() {
                let _ = client.delete_object().bucket(bucket).key(key).send().await;
            }
        }
    }

    let _ = client.delete_bucket().bucket(bucket).send().await;
}

mod test_presigned;
