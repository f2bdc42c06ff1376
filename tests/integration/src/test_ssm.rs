//! SSM Parameter Store integration tests against a running CloudMock server.

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::types::ParameterType;

    use crate::{ssm_client, unique_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_get_and_overwrite_parameter() {
        let client = ssm_client();
        let name = format!("/{}/db-url", unique_name("app"));

        let put = client
            .put_parameter()
            .name(&name)
            .value("postgres://one")
            .r#type(ParameterType::String)
            .send()
            .await
            .unwrap();
        assert_eq!(put.version(), 1);

        let overwritten = client
            .put_parameter()
            .name(&name)
            .value("postgres://two")
            .r#type(ParameterType::String)
            .overwrite(true)
            .send()
            .await
            .unwrap();
        assert_eq!(overwritten.version(), 2);

        let got = client.get_parameter().name(&name).send().await.unwrap();
        let parameter = got.parameter().unwrap();
        assert_eq!(parameter.value(), Some("postgres://two"));
        assert_eq!(parameter.version(), 2);

        client.delete_parameter().name(&name).send().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_to_get_missing_parameter() {
        let client = ssm_client();
        let err = client
            .get_parameter()
            .name(unique_name("missing"))
            .send()
            .await
            .unwrap_err();
        assert!(err.into_service_error().is_parameter_not_found());
    }
}
