//! STS integration tests against a running CloudMock server.

#[cfg(test)]
mod tests {
    use crate::sts_client;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_default_caller_identity() {
        let client = sts_client();
        let identity = client.get_caller_identity().send().await.unwrap();
        assert_eq!(identity.account(), Some("000000000000"));
        assert!(identity.arn().is_some_and(|arn| arn.starts_with("arn:aws:iam::")));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_assume_role() {
        let client = sts_client();
        let resp = client
            .assume_role()
            .role_arn("arn:aws:iam::000000000000:role/deployer")
            .role_session_name("ci")
            .send()
            .await
            .unwrap();
        let credentials = resp.credentials().unwrap();
        assert!(!credentials.access_key_id().is_empty());
        assert!(
            resp.assumed_role_user()
                .unwrap()
                .arn()
                .ends_with("deployer/ci")
        );
    }
}
