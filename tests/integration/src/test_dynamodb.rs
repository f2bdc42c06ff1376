//! DynamoDB integration tests against a running CloudMock server.

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::types::{
        AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
        TableStatus,
    };

    use crate::{dynamodb_client, unique_name};

    /// Helper: create a simple table with a hash key.
    async fn create_simple_table(client: &aws_sdk_dynamodb::Client, table_name: &str) {
        client
            .create_table()
            .table_name(table_name)
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name("pk")
                    .key_type(KeyType::Hash)
                    .build()
                    .unwrap(),
            )
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name("pk")
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .unwrap(),
            )
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to create table {table_name}: {e}"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_describe_table() {
        let client = dynamodb_client();
        let table_name = unique_name("create");

        create_simple_table(&client, &table_name).await;

        let resp = client
            .describe_table()
            .table_name(&table_name)
            .send()
            .await
            .unwrap();

        let desc = resp.table().unwrap();
        assert_eq!(desc.table_name(), Some(table_name.as_str()));
        assert_eq!(desc.table_status(), Some(&TableStatus::Active));
        assert_eq!(desc.key_schema().len(), 1);
        assert_eq!(desc.key_schema()[0].attribute_name(), "pk");

        client
            .delete_table()
            .table_name(&table_name)
            .send()
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_tables() {
        let client = dynamodb_client();
        let table_name = unique_name("list");
        create_simple_table(&client, &table_name).await;

        let resp = client.list_tables().send().await.unwrap();
        assert!(resp.table_names().contains(&table_name));

        client
            .delete_table()
            .table_name(&table_name)
            .send()
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_to_describe_deleted_table() {
        let client = dynamodb_client();
        let table_name = unique_name("delete");
        create_simple_table(&client, &table_name).await;

        client
            .delete_table()
            .table_name(&table_name)
            .send()
            .await
            .unwrap();

        let err = client
            .describe_table()
            .table_name(&table_name)
            .send()
            .await
            .unwrap_err();
        assert!(err.into_service_error().is_resource_not_found_exception());
    }
}
