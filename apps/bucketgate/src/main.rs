//! bucketgate - presign and fetch objects from S3-compatible stores.
//!
//! # Usage
//!
//! ```text
//! S3_BUCKET=media AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=... bucketgate presign /index.html
//! S3_BUCKET=media AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=... bucketgate get /index.html > index.html
//! BUCKETGATE_SERVICE=local BUCKETGATE_DIRECTORY=./public bucketgate get /index.html
//! ```
//!
//! `presign` prints one URL per path. `get` writes the object body to stdout.
//! Logs go to stderr.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BUCKETGATE_SERVICE` | `s3` | Backend, `s3` or `local` |
//! | `BUCKETGATE_TIMEOUT_SECONDS` | `5` | Upstream fetch timeout |
//! | `BUCKETGATE_DIRECTORY` | `.` | Root directory for `local` |
//! | `S3_ENDPOINT_URL` | `s3.amazonaws.com` | Store endpoint |
//! | `S3_REGION` / `AWS_REGION` | `us-east-1` | Signing region |
//! | `S3_BUCKET` | *(required)* | Bucket name |
//! | `S3_PREFIX` | *(empty)* | Key prefix |
//! | `S3_VIRTUAL_HOSTING` | `true` | `false` selects path-style URLs |
//! | `S3_PRESIGNER` | `manual` | `manual` or `sdk` |
//! | `S3_PRESIGN_EXPIRES` | `900` | URL lifetime in seconds |
//! | `AWS_ACCESS_KEY_ID` | *(required)* | Access key ID |
//! | `AWS_SECRET_ACCESS_KEY` | *(required)* | Secret access key |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result, bail};
use bucketgate_core::{GatewayConfig, S3ObjectService, ServiceKind, build_service};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: bucketgate <presign|get> <path>...";

/// Initialize the tracing subscriber on stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Print a presigned URL for each path.
async fn presign(config: &GatewayConfig, paths: &[String]) -> Result<()> {
    if config.service != ServiceKind::S3 {
        bail!("presign requires BUCKETGATE_SERVICE=s3");
    }
    config.validate()?;

    let service = S3ObjectService::from_config(config)?;
    for path in paths {
        let url = service
            .presign(path)
            .await
            .with_context(|| format!("failed to presign {}", service.object_key(path)))?;
        println!("{url}");
    }

    info!(
        count = paths.len(),
        presigner = ?config.s3_presigner,
        expires = config.s3_presign_expires,
        "Presigned URLs"
    );
    Ok(())
}

/// Fetch one object and stream it to stdout.
async fn get(config: &GatewayConfig, path: &str) -> Result<()> {
    let service = build_service(config)?;
    let object = service
        .get(path)
        .await
        .with_context(|| format!("failed to fetch {path}"))?;

    info!(
        path,
        content_type = object.content_type.as_deref().unwrap_or("-"),
        size = object.body.len(),
        "Fetched object"
    );

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&object.body).await?;
    stdout.flush().await?;
    Ok(())
}

async fn run(config: &GatewayConfig, args: &[String]) -> Result<()> {
    match args {
        [command, paths @ ..] if command == "presign" && !paths.is_empty() => {
            presign(config, paths).await
        }
        [command, path] if command == "get" => get(config, path).await,
        _ => bail!(USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&config, &args).await {
        error!(error = %e, "bucketgate failed");
        return Err(e);
    }
    Ok(())
}
