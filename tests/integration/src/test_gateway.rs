//! Gateway-level endpoints against a running CloudMock server.

#[cfg(test)]
mod tests {
    use crate::endpoint_url;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_running_services() {
        let resp = reqwest::get(format!("{}/_localstack/health", endpoint_url()))
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(
            body["services"]
                .as_object()
                .is_some_and(|services| services.values().all(|s| s == "running"))
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_frame_unknown_target_as_json_error() {
        let resp = reqwest::Client::new()
            .post(endpoint_url())
            .header("x-amz-target", "MockServiceA_1.DoThing")
            .header("content-type", "application/x-amz-json-1.1")
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        assert!(resp.headers().contains_key("x-amzn-requestid"));
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["__type"], "UnknownOperationException");
    }
}
