//! Presigned GET integration tests.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use aws_sdk_s3::primitives::ByteStream;
    use bucketgate_auth::{AddressingStyle, Credentials, Endpoint, ObjectTarget, presign_get};
    use bucketgate_core::{GatewayError, ObjectService, PresignerKind, S3ObjectService};
    use chrono::Utc;

    use crate::{
        ACCESS_KEY, REGION, SECRET_KEY, cleanup_bucket, create_test_bucket, endpoint_url,
        gateway_config, s3_client,
    };

    async fn put_text(client: &aws_sdk_s3::Client, bucket: &str, key: &str, body: &'static str) {
        client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from_static(body.as_bytes()))
            .content_type("text/plain")
            .send()
            .await
            .expect("put_object");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fetch_object_with_manual_presigner() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "manual").await;
        put_text(&client, &bucket, "site/index.html", "hello, bucketgate!").await;

        let service =
            S3ObjectService::from_config(&gateway_config(&bucket, "site/", PresignerKind::Manual))
                .expect("service");
        let object = service.get("/index.html").await.expect("get");

        assert_eq!(&object.body[..], b"hello, bucketgate!");
        assert_eq!(object.content_type.as_deref(), Some("text/plain"));
        assert_eq!(object.content_length, Some(18));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fetch_object_with_sdk_presigner() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "sdk").await;
        put_text(&client, &bucket, "notes/read me.txt", "spaced").await;

        let service =
            S3ObjectService::from_config(&gateway_config(&bucket, "notes/", PresignerKind::Sdk))
                .expect("service");
        let object = service.get("/read me.txt").await.expect("get");

        assert_eq!(&object.body[..], b"spaced");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_object_as_upstream_status() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "missing").await;

        let service =
            S3ObjectService::from_config(&gateway_config(&bucket, "", PresignerKind::Manual))
                .expect("service");
        let result = service.get("/nope.txt").await;

        assert!(matches!(
            result,
            Err(GatewayError::UpstreamStatus { status: 404, .. })
        ));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_expired_presigned_url() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "expired").await;
        put_text(&client, &bucket, "old.txt", "stale").await;

        let target = ObjectTarget::new(
            Endpoint::parse(&endpoint_url()).expect("endpoint"),
            bucket.clone(),
            AddressingStyle::Path,
        );
        let issued_at = Utc::now() - chrono::Duration::hours(1);
        let url = presign_get(
            &target,
            &Credentials::new(ACCESS_KEY, SECRET_KEY),
            REGION,
            "old.txt",
            issued_at,
            60,
        )
        .expect("presign");
        assert!(!url.is_valid_at(Utc::now()));

        let resp = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client")
            .get(url.as_str())
            .send()
            .await
            .expect("send");
        assert_eq!(resp.status().as_u16(), 403);

        cleanup_bucket(&client, &bucket).await;
    }
}
