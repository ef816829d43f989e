//! End-to-end fetch through a local store that checks SigV4 query signatures.

use std::sync::Arc;

use bucketgate_auth::{StaticCredentialProvider, verify_presigned};
use bucketgate_core::{GatewayConfig, GatewayError, ObjectService, S3ObjectService};
use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const ACCESS_KEY: &str = "AKIDEXAMPLE";
const SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

/// Start a store that answers each GET with its own path when the signature
/// verifies, and 403 otherwise. Returns the endpoint URL.
async fn start_store() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let provider = Arc::new(StaticCredentialProvider::new(vec![(
        ACCESS_KEY.to_owned(),
        SECRET_KEY.to_owned(),
    )]));

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { handle(stream, &provider).await });
        }
    });

    format!("http://{addr}")
}

async fn handle(mut stream: TcpStream, provider: &StaticCredentialProvider) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap();
    let mut fields = request_line.split(' ');
    let method = fields.next().unwrap();
    let target = fields.next().unwrap();
    let host = lines
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("host")
                .then(|| value.trim().to_owned())
        })
        .unwrap();

    let (parts, ()) = http::Request::builder()
        .method(method)
        .uri(target)
        .header("host", host)
        .body(())
        .unwrap()
        .into_parts();

    let response = match verify_presigned(&parts, provider, Utc::now()) {
        Ok(_) => {
            let body = parts.uri.path();
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
        }
        Err(_) => "HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_owned(),
    };
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.unwrap();
}

fn config(endpoint: String, secret: &str) -> GatewayConfig {
    GatewayConfig::builder()
        .s3_endpoint_url(endpoint)
        .s3_bucket("media".into())
        .s3_prefix("site/".into())
        .s3_virtual_hosting(false)
        .access_key_id(ACCESS_KEY.into())
        .secret_access_key(secret.into())
        .build()
}

#[tokio::test]
async fn test_should_fetch_object_through_presigned_url() {
    let endpoint = start_store().await;
    let service = S3ObjectService::from_config(&config(endpoint, SECRET_KEY)).unwrap();

    let response = service.get("/docs/read me.txt").await.unwrap();

    assert_eq!(&response.body[..], b"/media/site/docs/read%20me.txt");
    assert_eq!(response.content_type.as_deref(), Some("text/plain"));
    assert_eq!(response.content_length, Some(response.body.len() as u64));
}

#[tokio::test]
async fn test_should_fetch_through_mixed_case_endpoint() {
    let endpoint = start_store().await.replace("127.0.0.1", "LocalHost");
    let service = S3ObjectService::from_config(&config(endpoint, SECRET_KEY)).unwrap();

    let url = service.presign("/a.txt").await.unwrap();
    assert!(url.starts_with("http://localhost:"));

    let response = service.get("/a.txt").await.unwrap();
    assert_eq!(&response.body[..], b"/media/site/a.txt");
}

#[tokio::test]
async fn test_should_surface_rejected_signature_as_upstream_status() {
    let endpoint = start_store().await;
    let service = S3ObjectService::from_config(&config(endpoint, "wrong-secret")).unwrap();

    let result = service.get("/index.html").await;

    match result {
        Err(GatewayError::UpstreamStatus { status, key }) => {
            assert_eq!(status, 403);
            assert_eq!(key, "site/index.html");
        }
        other => panic!("expected upstream 403, got {other:?}"),
    }
}
