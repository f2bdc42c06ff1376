//! The routing table: which generic request signals identify which service.
//!
//! Every service name in the registry may carry one [`ServiceRoutes`] entry.
//! Built-in services get theirs from [`builtin_routes`]; embedders attach or
//! replace entries through the gateway builder.

use cloudmock_services::sqs;

/// Request signals that identify one service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRoutes {
    /// Registry name of the service these routes lead to.
    pub service: String,
    /// `X-Amz-Target` prefixes (the part before the first `.`).
    pub target_prefixes: Vec<String>,
    /// REST path prefixes, matched on segment boundaries.
    pub path_prefixes: Vec<String>,
    /// Leftmost `Host` labels (`sqs` in `sqs.us-east-1.amazonaws.com`).
    pub host_labels: Vec<String>,
    /// Whether the second `Host` label also identifies the service
    /// (`bucket.s3.amazonaws.com`).
    pub virtual_host: bool,
    /// SigV4 credential scope service names.
    pub signing_names: Vec<String>,
    /// Query protocol `Action` names.
    pub query_actions: Vec<String>,
}

impl ServiceRoutes {
    /// Empty routes for `service`.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Add an `X-Amz-Target` prefix.
    #[must_use]
    pub fn target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefixes.push(prefix.into());
        self
    }

    /// Add a REST path prefix.
    #[must_use]
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefixes.push(prefix.into());
        self
    }

    /// Add a host label.
    #[must_use]
    pub fn host_label(mut self, label: impl Into<String>) -> Self {
        self.host_labels.push(label.into());
        self
    }

    /// Also match the host label in second position.
    #[must_use]
    pub fn virtual_host(mut self) -> Self {
        self.virtual_host = true;
        self
    }

    /// Add a SigV4 signing name.
    #[must_use]
    pub fn signing_name(mut self, name: impl Into<String>) -> Self {
        self.signing_names.push(name.into());
        self
    }

    /// Add Query protocol actions.
    #[must_use]
    pub fn query_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Check the shape of every entry, independent of other services.
    pub(crate) fn check_shape(&self) -> Result<(), String> {
        for prefix in &self.target_prefixes {
            if prefix.is_empty() || prefix.contains('.') {
                return Err(format!("invalid target prefix {prefix:?}"));
            }
        }
        for prefix in &self.path_prefixes {
            if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
                return Err(format!("invalid path prefix {prefix:?}"));
            }
        }
        for label in self.host_labels.iter().chain(&self.signing_names) {
            if label.is_empty() || label.contains('.') {
                return Err(format!("invalid host label or signing name {label:?}"));
            }
        }
        if let Some(action) = self.query_actions.iter().find(|a| a.is_empty()) {
            return Err(format!("invalid query action {action:?}"));
        }
        Ok(())
    }
}

/// Whether two path prefixes would both claim some path.
///
/// Prefixes overlap when equal or when one is a segment-prefix of the other
/// (`/v2` and `/v2/apis`), but not when they merely share characters
/// (`/v2/api` and `/v2/apis`).
#[must_use]
pub fn paths_overlap(a: &str, b: &str) -> bool {
    path_has_prefix(a, b) || path_has_prefix(b, a)
}

/// Whether `path` starts with `prefix` on a segment boundary.
#[must_use]
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Routes of the built-in service registered under `name`.
#[must_use]
pub fn builtin_routes(name: &str) -> Option<ServiceRoutes> {
    let routes = match name {
        "dynamodb" => ServiceRoutes::new(name)
            .target_prefix("DynamoDB_20120810")
            .host_label("dynamodb")
            .signing_name("dynamodb"),
        "ssm" => ServiceRoutes::new(name)
            .target_prefix("AmazonSSM")
            .host_label("ssm")
            .signing_name("ssm"),
        "secretsmanager" => ServiceRoutes::new(name)
            .target_prefix("secretsmanager")
            .host_label("secretsmanager")
            .signing_name("secretsmanager"),
        "sqs" => ServiceRoutes::new(name)
            .target_prefix(sqs::TARGET_PREFIX)
            .host_label("sqs")
            .signing_name("sqs")
            .query_actions([
                "CreateQueue",
                "GetQueueUrl",
                "ListQueues",
                "DeleteQueue",
                "GetQueueAttributes",
                "SendMessage",
                "ReceiveMessage",
                "DeleteMessage",
                "PurgeQueue",
            ]),
        "sns" => ServiceRoutes::new(name)
            .host_label("sns")
            .signing_name("sns")
            .query_actions([
                "CreateTopic",
                "ListTopics",
                "DeleteTopic",
                "Subscribe",
                "ListSubscriptions",
                "Publish",
            ]),
        "sts" => ServiceRoutes::new(name)
            .host_label("sts")
            .signing_name("sts")
            .query_actions(["GetCallerIdentity", "AssumeRole"]),
        "s3" => ServiceRoutes::new(name)
            .host_label("s3")
            .virtual_host()
            .signing_name("s3"),
        "cloudfront" => ServiceRoutes::new(name)
            .path_prefix(cloudmock_services::cloudfront::DISTRIBUTION_PATH)
            .host_label("cloudfront")
            .signing_name("cloudfront"),
        "lambda" => ServiceRoutes::new(name)
            .path_prefix(cloudmock_services::lambda::FUNCTIONS_PATH)
            .host_label("lambda")
            .signing_name("lambda"),
        "apigatewayv2" => ServiceRoutes::new(name)
            .path_prefix(cloudmock_services::apigatewayv2::APIS_PATH)
            .host_label("apigateway")
            .signing_name("apigateway"),
        _ => return None,
    };
    Some(routes)
}
