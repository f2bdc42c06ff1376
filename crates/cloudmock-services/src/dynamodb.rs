//! Mock DynamoDB control plane (`awsJson1_0`, `X-Amz-Target: DynamoDB_20120810.<Op>`).
//!
//! Tables are kept by name; items are out of scope for this mock.

use std::sync::Arc;

use cloudmock_core::{ResourceStore, StoreError};
use cloudmock_protocol::request::target_action;
use cloudmock_protocol::service::ready;
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, ResetError, ServiceError, ServiceFuture,
    json, new_request_id,
};
use serde::{Deserialize, Serialize};

use crate::context::{ServiceContext, epoch_seconds};

const PROTOCOL: Protocol = Protocol::AwsJson1_0;

/// Maximum page size for `ListTables`.
const MAX_LIST_TABLES: usize = 100;

/// All supported DynamoDB operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamoDBOperation {
    /// Create a new table.
    CreateTable,
    /// Describe a table.
    DescribeTable,
    /// List all tables.
    ListTables,
    /// Delete a table.
    DeleteTable,
}

impl DynamoDBOperation {
    /// Parse an operation name string into a `DynamoDBOperation`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CreateTable" => Some(Self::CreateTable),
            "DescribeTable" => Some(Self::DescribeTable),
            "ListTables" => Some(Self::ListTables),
            "DeleteTable" => Some(Self::DeleteTable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeySchemaElement {
    attribute_name: String,
    key_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeDefinition {
    attribute_name: String,
    attribute_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateTableInput {
    table_name: Option<String>,
    #[serde(default)]
    key_schema: Vec<KeySchemaElement>,
    #[serde(default)]
    attribute_definitions: Vec<AttributeDefinition>,
    billing_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TableNameInput {
    table_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListTablesInput {
    exclusive_start_table_name: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListTablesOutput {
    table_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_evaluated_table_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TableDescription {
    table_name: String,
    table_arn: String,
    table_id: String,
    table_status: String,
    key_schema: Vec<KeySchemaElement>,
    attribute_definitions: Vec<AttributeDefinition>,
    creation_date_time: f64,
    item_count: i64,
    table_size_bytes: i64,
    billing_mode_summary: BillingModeSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BillingModeSummary {
    billing_mode: String,
}

/// Mock DynamoDB service.
#[derive(Debug)]
pub struct DynamoDBService {
    ctx: ServiceContext,
    tables: Arc<ResourceStore<TableDescription>>,
}

impl DynamoDBService {
    /// Create a service with no tables.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            tables: Arc::new(ResourceStore::new()),
        }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let action = target_action(req.headers()).unwrap_or_default();
        let op = DynamoDBOperation::from_name(action).ok_or_else(|| {
            ServiceError::unknown_operation(PROTOCOL, format!("Unrecognized operation: {action}"))
        })?;
        tracing::debug!(?op, "dynamodb operation");

        match op {
            DynamoDBOperation::CreateTable => {
                let output = self.create_table(json::parse_body(req.body())?)?;
                json::success(PROTOCOL, &serde_json::json!({ "TableDescription": output }), request_id)
            }
            DynamoDBOperation::DescribeTable => {
                let name = required_table_name(json::parse_body(req.body())?)?;
                let table = self.tables.require(&name).map_err(table_error)?;
                json::success(PROTOCOL, &serde_json::json!({ "Table": table }), request_id)
            }
            DynamoDBOperation::ListTables => {
                let output = self.list_tables(&json::parse_body(req.body())?);
                json::success(PROTOCOL, &output, request_id)
            }
            DynamoDBOperation::DeleteTable => {
                let name = required_table_name(json::parse_body(req.body())?)?;
                let mut table = self.tables.remove(&name).map_err(table_error)?;
                table.table_status = "DELETING".to_owned();
                json::success(PROTOCOL, &serde_json::json!({ "TableDescription": table }), request_id)
            }
        }
    }

    fn create_table(&self, input: CreateTableInput) -> Result<TableDescription, ServiceError> {
        let name = input
            .table_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::validation("TableName is required"))?;
        if input.key_schema.is_empty() {
            return Err(ServiceError::validation(
                "1 validation error detected: Value null at 'keySchema' failed to satisfy constraint: Member must not be null",
            ));
        }
        if !input.key_schema.iter().any(|k| k.key_type == "HASH") {
            return Err(ServiceError::validation(
                "Invalid KeySchema: The first KeySchemaElement is not a HASH key type",
            ));
        }

        let description = TableDescription {
            table_arn: self.ctx.arn("dynamodb", &format!("table/{name}")),
            table_id: uuid::Uuid::new_v4().to_string(),
            table_status: "ACTIVE".to_owned(),
            key_schema: input.key_schema,
            attribute_definitions: input.attribute_definitions,
            creation_date_time: epoch_seconds(chrono::Utc::now()),
            item_count: 0,
            table_size_bytes: 0,
            billing_mode_summary: BillingModeSummary {
                billing_mode: input
                    .billing_mode
                    .unwrap_or_else(|| "PROVISIONED".to_owned()),
            },
            table_name: name.clone(),
        };
        self.tables
            .create(name, description)
            .map_err(table_error)
    }

    fn list_tables(&self, input: &ListTablesInput) -> ListTablesOutput {
        let limit = input.limit.unwrap_or(MAX_LIST_TABLES).clamp(1, MAX_LIST_TABLES);
        let names: Vec<String> = self
            .tables
            .list()
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| {
                input
                    .exclusive_start_table_name
                    .as_ref()
                    .is_none_or(|start| name > start)
            })
            .collect();

        let has_more = names.len() > limit;
        let table_names: Vec<String> = names.into_iter().take(limit).collect();
        let last_evaluated_table_name = if has_more {
            table_names.last().cloned()
        } else {
            None
        };
        ListTablesOutput {
            table_names,
            last_evaluated_table_name,
        }
    }
}

fn required_table_name(input: TableNameInput) -> Result<String, ServiceError> {
    input
        .table_name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServiceError::validation("TableName is required"))
}

fn table_error(err: StoreError) -> ServiceError {
    match err {
        StoreError::AlreadyExists(name) => ServiceError::bad_request(
            "ResourceInUseException",
            format!("Table already exists: {name}"),
        ),
        StoreError::NotFound(name) => ServiceError::bad_request(
            "ResourceNotFoundException",
            format!("Requested resource not found: Table: {name} not found"),
        ),
    }
}

impl MockService for DynamoDBService {
    fn name(&self) -> &str {
        "dynamodb"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let response = self
            .dispatch(&req, &request_id)
            .unwrap_or_else(|err| err.to_response(PROTOCOL, &request_id));
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.tables.clear();
        Ok(())
    }
}
