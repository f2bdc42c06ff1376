//! Request classification: which registered service owns a request.
//!
//! Signals are examined in a fixed order and the first one that matches
//! decides, independent of registration order:
//!
//! 1. `X-Amz-Target` prefix. A request carrying the header never falls
//!    through to weaker signals.
//! 2. REST path prefix, on segment boundaries, unless the host or the
//!    credential scope below resolves to a different service.
//! 3. `Host` labels: the virtual-host label (`bucket.s3.domain`) first, then
//!    the leftmost label (`sqs.us-east-1.domain`).
//! 4. The service named in the SigV4 credential scope.
//! 5. The Query protocol `Action` parameter, from the URI or a form body.

use std::collections::HashMap;
use std::fmt;

use cloudmock_protocol::MockRequest;
use cloudmock_protocol::request::{
    CredentialScope, TARGET_HEADER, form_params, header_str, host, param, split_target,
};

use crate::registry::RegistryError;
use crate::routes::{ServiceRoutes, path_has_prefix, paths_overlap};

/// The signal that decided a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchSignal {
    /// `X-Amz-Target` prefix.
    TargetHeader,
    /// REST path prefix.
    PathPrefix,
    /// `Host` label.
    Host,
    /// SigV4 credential scope service.
    CredentialScope,
    /// Query protocol `Action` parameter.
    QueryAction,
}

impl fmt::Display for MatchSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TargetHeader => "target-header",
            Self::PathPrefix => "path-prefix",
            Self::Host => "host",
            Self::CredentialScope => "credential-scope",
            Self::QueryAction => "query-action",
        })
    }
}

/// The outcome of classifying a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Name of the registered service that owns the request.
    pub service: String,
    /// Action named by the target header or `Action` parameter, if any.
    pub action: Option<String>,
    /// Which signal decided.
    pub signal: MatchSignal,
}

/// Why no service owns a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// `X-Amz-Target` present but not of the form `<Prefix>.<Action>`.
    #[error("malformed X-Amz-Target header {0:?}")]
    MalformedTarget(String),

    /// `X-Amz-Target` prefix not claimed by any registered service.
    #[error("no registered service handles target prefix {0:?}")]
    UnknownTarget(String),

    /// No signal matched.
    #[error("no registered service matches this request")]
    NoMatch,
}

/// Immutable lookup tables built from validated routes.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    targets: HashMap<String, String>,
    paths: Vec<(String, String)>,
    hosts: HashMap<String, String>,
    virtual_hosts: HashMap<String, String>,
    signing_names: HashMap<String, String>,
    actions: HashMap<String, String>,
}

impl Classifier {
    /// Build lookup tables, rejecting malformed entries and any signal
    /// claimed by two different services.
    pub fn new(table: &[ServiceRoutes]) -> Result<Self, RegistryError> {
        let mut classifier = Self::default();
        for routes in table {
            routes
                .check_shape()
                .map_err(|reason| RegistryError::MalformedRoute {
                    service: routes.service.clone(),
                    reason,
                })?;
            let service = &routes.service;

            for prefix in &routes.target_prefixes {
                claim(&mut classifier.targets, "target prefix", prefix, service)?;
            }
            for prefix in &routes.path_prefixes {
                if let Some((existing, owner)) = classifier
                    .paths
                    .iter()
                    .find(|(p, owner)| owner != service && paths_overlap(p, prefix))
                {
                    return Err(RegistryError::Conflict {
                        signal: "path prefix",
                        value: format!("{prefix} (overlaps {existing})"),
                        first: owner.clone(),
                        second: service.clone(),
                    });
                }
                classifier.paths.push((prefix.clone(), service.clone()));
            }
            for label in &routes.host_labels {
                claim(&mut classifier.hosts, "host label", label, service)?;
                if routes.virtual_host {
                    claim(&mut classifier.virtual_hosts, "host label", label, service)?;
                }
            }
            for name in &routes.signing_names {
                claim(&mut classifier.signing_names, "signing name", name, service)?;
            }
            for action in &routes.query_actions {
                claim(&mut classifier.actions, "query action", action, service)?;
            }
        }
        Ok(classifier)
    }

    /// Decide which service owns `req`.
    pub fn classify(&self, req: &MockRequest) -> Result<Classification, ClassifyError> {
        if let Some(target) = header_str(req.headers(), TARGET_HEADER) {
            let (prefix, action) = split_target(target)
                .ok_or_else(|| ClassifyError::MalformedTarget(target.to_owned()))?;
            let service = self
                .targets
                .get(prefix)
                .ok_or_else(|| ClassifyError::UnknownTarget(prefix.to_owned()))?;
            return Ok(Classification {
                service: service.clone(),
                action: Some(action.to_owned()),
                signal: MatchSignal::TargetHeader,
            });
        }

        let params = form_params(req);
        let action = param(&params, "Action").map(str::to_owned);
        let found = |service: &String, signal| Classification {
            service: service.clone(),
            action: action.clone(),
            signal,
        };

        let by_host = host(req).and_then(|host| self.host_owner(&host));
        let by_scope = CredentialScope::from_request(req)
            .and_then(|scope| self.signing_names.get(&scope.service));

        // A path prefix only decides when neither the host nor the signing
        // scope names some other service.
        let path = req.uri().path();
        if let Some((_, service)) = self
            .paths
            .iter()
            .find(|(prefix, _)| path_has_prefix(path, prefix))
        {
            if by_host.is_none_or(|s| s == service) && by_scope.is_none_or(|s| s == service) {
                return Ok(found(service, MatchSignal::PathPrefix));
            }
        }

        if let Some(service) = by_host {
            return Ok(found(service, MatchSignal::Host));
        }
        if let Some(service) = by_scope {
            return Ok(found(service, MatchSignal::CredentialScope));
        }

        if let Some(service) = action.as_deref().and_then(|a| self.actions.get(a)) {
            return Ok(found(service, MatchSignal::QueryAction));
        }

        Err(ClassifyError::NoMatch)
    }

    /// Virtual-host label (`bucket.s3.domain`) first, then the leftmost label.
    fn host_owner(&self, host: &str) -> Option<&String> {
        let mut labels = host.split('.');
        let first = labels.next();
        let second = labels.next();
        second
            .and_then(|l| self.virtual_hosts.get(l))
            .or_else(|| first.and_then(|l| self.hosts.get(l)))
    }
}

fn claim(
    map: &mut HashMap<String, String>,
    signal: &'static str,
    value: &str,
    service: &str,
) -> Result<(), RegistryError> {
    match map.get(value) {
        Some(owner) if owner != service => Err(RegistryError::Conflict {
            signal,
            value: value.to_owned(),
            first: owner.clone(),
            second: service.to_owned(),
        }),
        Some(_) => Ok(()),
        None => {
            map.insert(value.to_owned(), service.to_owned());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::routes::builtin_routes;

    fn builtin_classifier() -> Classifier {
        let table: Vec<ServiceRoutes> = cloudmock_services::BUILTIN_NAMES
            .iter()
            .filter_map(|name| builtin_routes(name))
            .collect();
        Classifier::new(&table).unwrap()
    }

    fn request(build: http::request::Builder, body: &'static str) -> MockRequest {
        build.body(Bytes::from_static(body.as_bytes())).unwrap()
    }

    fn classify(
        build: http::request::Builder,
        body: &'static str,
    ) -> Result<Classification, ClassifyError> {
        builtin_classifier().classify(&request(build, body))
    }

    #[test]
    fn test_should_classify_by_target_header() {
        let c = classify(
            http::Request::builder()
                .method("POST")
                .uri("/")
                .header("x-amz-target", "DynamoDB_20120810.ListTables"),
            "{}",
        )
        .unwrap();
        assert_eq!(c.service, "dynamodb");
        assert_eq!(c.action.as_deref(), Some("ListTables"));
        assert_eq!(c.signal, MatchSignal::TargetHeader);

        let c = classify(
            http::Request::builder()
                .method("POST")
                .header("x-amz-target", "secretsmanager.GetSecretValue"),
            "{}",
        )
        .unwrap();
        assert_eq!(c.service, "secretsmanager");
    }

    #[test]
    fn test_should_not_fall_through_on_unknown_target() {
        let err = classify(
            http::Request::builder()
                .method("POST")
                .uri("/2015-03-31/functions")
                .header("host", "sqs.us-east-1.amazonaws.com")
                .header("x-amz-target", "MockServiceA_1.DoThing"),
            "{}",
        )
        .unwrap_err();
        assert_eq!(err, ClassifyError::UnknownTarget("MockServiceA_1".to_owned()));
    }

    #[test]
    fn test_should_reject_malformed_target() {
        let err = classify(
            http::Request::builder().header("x-amz-target", "AmazonSSM"),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, ClassifyError::MalformedTarget(_)));
    }

    #[test]
    fn test_should_classify_by_path_prefix() {
        for (path, expected) in [
            ("/2015-03-31/functions", "lambda"),
            ("/2015-03-31/functions/my-fn", "lambda"),
            ("/2020-05-31/distribution/E123", "cloudfront"),
            ("/v2/apis", "apigatewayv2"),
        ] {
            let c = classify(http::Request::builder().uri(path), "").unwrap();
            assert_eq!(c.service, expected, "{path}");
            assert_eq!(c.signal, MatchSignal::PathPrefix);
        }
    }

    #[test]
    fn test_should_not_match_path_prefix_mid_segment() {
        let err = classify(http::Request::builder().uri("/v2/apisx"), "").unwrap_err();
        assert_eq!(err, ClassifyError::NoMatch);
    }

    #[test]
    fn test_should_let_host_override_foreign_path_prefix() {
        let c = classify(
            http::Request::builder()
                .uri("/v2/apis/readme.txt")
                .header("host", "photos.s3.localhost.localstack.cloud:4566")
                .header(
                    "authorization",
                    "AWS4-HMAC-SHA256 Credential=AKID/20240101/us-east-1/s3/aws4_request, \
                     SignedHeaders=host, Signature=abc",
                ),
            "",
        )
        .unwrap();
        assert_eq!(c.service, "s3");
        assert_eq!(c.signal, MatchSignal::Host);
    }

    #[test]
    fn test_should_let_credential_scope_override_foreign_path_prefix() {
        let c = classify(
            http::Request::builder()
                .uri("/2015-03-31/functions/backup.tar")
                .header("host", "localhost:4566")
                .header(
                    "authorization",
                    "AWS4-HMAC-SHA256 Credential=AKID/20240101/us-east-1/s3/aws4_request, \
                     SignedHeaders=host, Signature=abc",
                ),
            "",
        )
        .unwrap();
        assert_eq!(c.service, "s3");
        assert_eq!(c.signal, MatchSignal::CredentialScope);
    }

    #[test]
    fn test_should_keep_path_prefix_when_host_agrees() {
        let c = classify(
            http::Request::builder()
                .uri("/2015-03-31/functions/my-fn")
                .header("host", "lambda.us-east-1.amazonaws.com")
                .header(
                    "authorization",
                    "AWS4-HMAC-SHA256 Credential=AKID/20240101/us-east-1/lambda/aws4_request, \
                     SignedHeaders=host, Signature=abc",
                ),
            "",
        )
        .unwrap();
        assert_eq!(c.service, "lambda");
        assert_eq!(c.signal, MatchSignal::PathPrefix);
    }

    #[test]
    fn test_should_classify_by_host_label() {
        let c = classify(
            http::Request::builder().uri("/").header("host", "sns.us-east-1.amazonaws.com"),
            "",
        )
        .unwrap();
        assert_eq!(c.service, "sns");
        assert_eq!(c.signal, MatchSignal::Host);
    }

    #[test]
    fn test_should_prefer_virtual_host_label() {
        let c = classify(
            http::Request::builder()
                .uri("/key.txt")
                .header("host", "sqs.s3.localhost.localstack.cloud:4566"),
            "",
        )
        .unwrap();
        assert_eq!(c.service, "s3");
    }

    #[test]
    fn test_should_classify_by_credential_scope() {
        let c = classify(
            http::Request::builder()
                .uri("/my-bucket/key")
                .header("host", "localhost:4566")
                .header(
                    "authorization",
                    "AWS4-HMAC-SHA256 Credential=AKID/20240101/us-east-1/s3/aws4_request, \
                     SignedHeaders=host, Signature=abc",
                ),
            "",
        )
        .unwrap();
        assert_eq!(c.service, "s3");
        assert_eq!(c.signal, MatchSignal::CredentialScope);
    }

    #[test]
    fn test_should_classify_by_query_action_in_form_body() {
        let c = classify(
            http::Request::builder()
                .method("POST")
                .uri("/")
                .header("host", "localhost:4566")
                .header("content-type", "application/x-www-form-urlencoded"),
            "Action=GetCallerIdentity&Version=2011-06-15",
        )
        .unwrap();
        assert_eq!(c.service, "sts");
        assert_eq!(c.action.as_deref(), Some("GetCallerIdentity"));
        assert_eq!(c.signal, MatchSignal::QueryAction);
    }

    #[test]
    fn test_should_classify_by_query_action_in_uri() {
        let c = classify(
            http::Request::builder().uri("/?Action=ListQueues&Version=2012-11-05"),
            "",
        )
        .unwrap();
        assert_eq!(c.service, "sqs");
    }

    #[test]
    fn test_should_report_no_match() {
        let err = classify(
            http::Request::builder().uri("/bucket/key").header("host", "localhost"),
            "",
        )
        .unwrap_err();
        assert_eq!(err, ClassifyError::NoMatch);
    }

    #[test]
    fn test_should_reject_conflicting_claims() {
        let table = [
            ServiceRoutes::new("a").target_prefix("Shared"),
            ServiceRoutes::new("b").target_prefix("Shared"),
        ];
        assert!(matches!(
            Classifier::new(&table),
            Err(RegistryError::Conflict { signal: "target prefix", .. })
        ));

        let table = [
            ServiceRoutes::new("a").path_prefix("/v2"),
            ServiceRoutes::new("b").path_prefix("/v2/apis"),
        ];
        assert!(matches!(
            Classifier::new(&table),
            Err(RegistryError::Conflict { signal: "path prefix", .. })
        ));

        let table = [
            ServiceRoutes::new("a").query_actions(["Publish"]),
            ServiceRoutes::new("b").query_actions(["Publish"]),
        ];
        assert!(Classifier::new(&table).is_err());
    }

    #[test]
    fn test_should_reject_malformed_routes() {
        let table = [ServiceRoutes::new("a").path_prefix("no-slash")];
        assert!(matches!(
            Classifier::new(&table),
            Err(RegistryError::MalformedRoute { .. })
        ));
    }

    #[test]
    fn test_should_be_independent_of_table_order() {
        let mut table: Vec<ServiceRoutes> = cloudmock_services::BUILTIN_NAMES
            .iter()
            .filter_map(|name| builtin_routes(name))
            .collect();
        table.reverse();
        let reversed = Classifier::new(&table).unwrap();
        let req = request(
            http::Request::builder()
                .uri("/v2/apis")
                .header("host", "sqs.localhost"),
            "",
        );
        assert_eq!(
            reversed.classify(&req).unwrap(),
            builtin_classifier().classify(&req).unwrap()
        );
    }
}
