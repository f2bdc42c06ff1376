//! Mock SNS (`awsQuery`).
//!
//! Topics and subscriptions are tracked; `Publish` only records that the
//! topic exists and hands back a message id, nothing is delivered.

use cloudmock_core::ResourceStore;
use cloudmock_protocol::request::{form_params, param};
use cloudmock_protocol::service::ready;
use cloudmock_protocol::xml::{self, Element};
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, ResetError, ServiceError, ServiceFuture,
    new_request_id,
};

use crate::context::ServiceContext;

const PROTOCOL: Protocol = Protocol::AwsQuery;

/// XML namespace of SNS Query responses.
pub const NAMESPACE: &str = "http://sns.amazonaws.com/doc/2010-03-31/";

#[derive(Debug, Clone)]
struct Subscription {
    arn: String,
    topic_arn: String,
    protocol: String,
    endpoint: String,
}

/// Mock SNS service.
#[derive(Debug)]
pub struct SnsService {
    ctx: ServiceContext,
    /// Topics keyed by ARN; the value is the topic name.
    topics: ResourceStore<String>,
    /// Subscriptions keyed by subscription ARN.
    subscriptions: ResourceStore<Subscription>,
}

impl SnsService {
    /// Create a service with no topics.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            topics: ResourceStore::new(),
            subscriptions: ResourceStore::new(),
        }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let params = form_params(req);
        let action = param(&params, "Action").unwrap_or_default();
        tracing::debug!(action, "sns operation");

        let result = match action {
            "CreateTopic" => {
                let name = required(&params, "Name")?;
                if !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                    || name.len() > 256
                {
                    return Err(ServiceError::bad_request(
                        "InvalidParameter",
                        "Invalid parameter: Topic Name",
                    ));
                }
                let arn = self.ctx.arn("sns", name);
                self.topics.get_or_create(arn.as_str(), || name.to_owned());
                vec![Element::text("TopicArn", arn)]
            }
            "ListTopics" => vec![Element::new("Topics").children(
                self.topics.list().into_iter().map(|(arn, _)| {
                    Element::new("member").child(Element::text("TopicArn", arn))
                }),
            )],
            "DeleteTopic" => {
                let arn = required(&params, "TopicArn")?;
                // Deleting an absent topic succeeds, as it does against AWS.
                if self.topics.remove(arn).is_ok() {
                    for (sub_arn, sub) in self.subscriptions.list() {
                        if sub.topic_arn == arn {
                            let _ = self.subscriptions.remove(&sub_arn);
                        }
                    }
                }
                Vec::new()
            }
            "Subscribe" => {
                let topic_arn = self.require_topic(&params)?;
                let protocol = required(&params, "Protocol")?;
                let endpoint = param(&params, "Endpoint").unwrap_or_default();
                let arn = format!("{topic_arn}:{}", uuid::Uuid::new_v4());
                self.subscriptions.put(
                    arn.as_str(),
                    Subscription {
                        arn: arn.clone(),
                        topic_arn,
                        protocol: protocol.to_owned(),
                        endpoint: endpoint.to_owned(),
                    },
                );
                vec![Element::text("SubscriptionArn", arn)]
            }
            "ListSubscriptions" => vec![Element::new("Subscriptions").children(
                self.subscriptions.list().into_iter().map(|(_, s)| {
                    Element::new("member")
                        .child(Element::text("SubscriptionArn", s.arn))
                        .child(Element::text("Owner", self.ctx.account.as_str()))
                        .child(Element::text("TopicArn", s.topic_arn))
                        .child(Element::text("Protocol", s.protocol))
                        .child(Element::text("Endpoint", s.endpoint))
                }),
            )],
            "Publish" => {
                self.require_topic(&params)?;
                required(&params, "Message")?;
                vec![Element::text("MessageId", uuid::Uuid::new_v4().to_string())]
            }
            other => {
                return Err(ServiceError::unknown_operation(
                    PROTOCOL,
                    format!("The action {other} is not valid for this web service."),
                ));
            }
        };

        Ok(xml::query_response(action, NAMESPACE, result, request_id))
    }

    fn require_topic(&self, params: &[(String, String)]) -> Result<String, ServiceError> {
        let arn = required(params, "TopicArn")?;
        if self.topics.contains(arn) {
            Ok(arn.to_owned())
        } else {
            Err(ServiceError::not_found("NotFound", "Topic does not exist"))
        }
    }
}

fn required<'a>(params: &'a [(String, String)], key: &str) -> Result<&'a str, ServiceError> {
    param(params, key).filter(|v| !v.is_empty()).ok_or_else(|| {
        ServiceError::bad_request(
            "InvalidParameter",
            format!("Invalid parameter: {key} Reason: cannot be empty"),
        )
    })
}

impl MockService for SnsService {
    fn name(&self) -> &str {
        "sns"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let response = self
            .dispatch(&req, &request_id)
            .unwrap_or_else(|err| err.to_response(PROTOCOL, &request_id));
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.subscriptions.clear();
        self.topics.clear();
        Ok(())
    }
}
