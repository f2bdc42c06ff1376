//! S3 integration tests against a running CloudMock server.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{s3_client, unique_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_get_and_delete_object() {
        let client = s3_client();
        let bucket = unique_name("bucket");
        client.create_bucket().bucket(&bucket).send().await.unwrap();

        client
            .put_object()
            .bucket(&bucket)
            .key("docs/readme.txt")
            .content_type("text/plain")
            .body(ByteStream::from_static(b"hello world"))
            .send()
            .await
            .unwrap();

        let got = client
            .get_object()
            .bucket(&bucket)
            .key("docs/readme.txt")
            .send()
            .await
            .unwrap();
        assert_eq!(got.content_type(), Some("text/plain"));
        let body = got.body.collect().await.unwrap().into_bytes();
        assert_eq!(body.as_ref(), b"hello world");

        let listed = client
            .list_objects_v2()
            .bucket(&bucket)
            .prefix("docs/")
            .send()
            .await
            .unwrap();
        assert_eq!(listed.contents().len(), 1);
        assert_eq!(listed.contents()[0].key(), Some("docs/readme.txt"));

        client
            .delete_object()
            .bucket(&bucket)
            .key("docs/readme.txt")
            .send()
            .await
            .unwrap();
        client.delete_bucket().bucket(&bucket).send().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_to_get_missing_key() {
        let client = s3_client();
        let bucket = unique_name("missing");
        client.create_bucket().bucket(&bucket).send().await.unwrap();

        let err = client
            .get_object()
            .bucket(&bucket)
            .key("nope")
            .send()
            .await
            .unwrap_err();
        assert!(err.into_service_error().is_no_such_key());

        client.delete_bucket().bucket(&bucket).send().await.unwrap();
    }
}
