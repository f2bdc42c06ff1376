//! Mock SQS.
//!
//! Two wire protocols reach the same operations: the legacy `awsQuery` form
//! (`Action=<Op>`) and `awsJson1_0` (`X-Amz-Target: AmazonSQS.<Op>`) used by
//! current SDKs. Requests in either form are normalized to one parameter list
//! and every operation yields an [`Output`] rendered back in the caller's form.
//!
//! Queues are addressed by URL (`http://<host>/<account>/<name>`); only the
//! last path segment is significant. Received messages stay invisible for the
//! visibility timeout and reappear unless deleted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cloudmock_core::ResourceStore;
use cloudmock_protocol::request::{TARGET_HEADER, form_params, header_str, param, split_target};
use cloudmock_protocol::service::ready;
use cloudmock_protocol::xml::{self, Element};
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, Protocol, ResetError, ServiceError, ServiceFuture,
    json, new_request_id,
};
use md5::{Digest, Md5};
use parking_lot::Mutex;

use crate::context::ServiceContext;

/// XML namespace of SQS Query responses.
pub const NAMESPACE: &str = "http://queue.amazonaws.com/doc/2012-11-05/";

/// `X-Amz-Target` prefix of the JSON protocol.
pub const TARGET_PREFIX: &str = "AmazonSQS";

const DEFAULT_VISIBILITY_TIMEOUT: u64 = 30;
const MAX_VISIBILITY_TIMEOUT: u64 = 43_200;
const MAX_RECEIVE: usize = 10;

type Params = Vec<(String, String)>;

#[derive(Debug, Clone)]
struct SqsMessage {
    message_id: String,
    body: String,
    md5_of_body: String,
    receipt_handle: Option<String>,
    visible_at: Instant,
    receive_count: u32,
}

#[derive(Debug)]
struct Queue {
    name: String,
    url: String,
    arn: String,
    visibility_timeout: u64,
    messages: Mutex<Vec<SqsMessage>>,
}

/// A message handed out by `ReceiveMessage`.
#[derive(Debug)]
struct Received {
    message_id: String,
    receipt_handle: String,
    md5_of_body: String,
    body: String,
    receive_count: u32,
}

/// Result of one operation, independent of the wire protocol.
#[derive(Debug)]
enum Output {
    Empty,
    QueueUrl(String),
    QueueUrls(Vec<String>),
    Attributes(Vec<(&'static str, String)>),
    Sent { md5_of_body: String, message_id: String },
    Messages(Vec<Received>),
}

impl Output {
    fn into_xml(self) -> Vec<Element> {
        match self {
            Self::Empty => Vec::new(),
            Self::QueueUrl(url) => vec![Element::text("QueueUrl", url)],
            Self::QueueUrls(urls) => urls
                .into_iter()
                .map(|url| Element::text("QueueUrl", url))
                .collect(),
            Self::Attributes(attrs) => attrs
                .into_iter()
                .map(|(name, value)| {
                    Element::new("Attribute")
                        .child(Element::text("Name", name))
                        .child(Element::text("Value", value))
                })
                .collect(),
            Self::Sent {
                md5_of_body,
                message_id,
            } => vec![
                Element::text("MD5OfMessageBody", md5_of_body),
                Element::text("MessageId", message_id),
            ],
            Self::Messages(messages) => messages
                .into_iter()
                .map(|m| {
                    Element::new("Message")
                        .child(Element::text("MessageId", m.message_id))
                        .child(Element::text("ReceiptHandle", m.receipt_handle))
                        .child(Element::text("MD5OfBody", m.md5_of_body))
                        .child(Element::text("Body", m.body))
                        .child(
                            Element::new("Attribute")
                                .child(Element::text("Name", "ApproximateReceiveCount"))
                                .child(Element::text("Value", m.receive_count.to_string())),
                        )
                })
                .collect(),
        }
    }

    fn into_json(self) -> serde_json::Value {
        match self {
            Self::Empty => serde_json::json!({}),
            Self::QueueUrl(url) => serde_json::json!({ "QueueUrl": url }),
            Self::QueueUrls(urls) => serde_json::json!({ "QueueUrls": urls }),
            Self::Attributes(attrs) => {
                let map: serde_json::Map<String, serde_json::Value> = attrs
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), serde_json::Value::String(v)))
                    .collect();
                serde_json::json!({ "Attributes": map })
            }
            Self::Sent {
                md5_of_body,
                message_id,
            } => serde_json::json!({ "MD5OfMessageBody": md5_of_body, "MessageId": message_id }),
            Self::Messages(messages) => {
                let messages: Vec<serde_json::Value> = messages
                    .into_iter()
                    .map(|m| {
                        serde_json::json!({
                            "MessageId": m.message_id,
                            "ReceiptHandle": m.receipt_handle,
                            "MD5OfBody": m.md5_of_body,
                            "Body": m.body,
                            "Attributes": {
                                "ApproximateReceiveCount": m.receive_count.to_string(),
                            },
                        })
                    })
                    .collect();
                serde_json::json!({ "Messages": messages })
            }
        }
    }
}

/// Mock SQS service.
#[derive(Debug)]
pub struct SqsService {
    ctx: ServiceContext,
    queues: ResourceStore<Arc<Queue>>,
}

impl SqsService {
    /// Create a service with no queues.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            queues: ResourceStore::new(),
        }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        protocol: Protocol,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let (action, params) = if protocol == Protocol::AwsQuery {
            let params = form_params(req);
            let action = param(&params, "Action").unwrap_or_default().to_owned();
            (action, params)
        } else {
            let action = header_str(req.headers(), TARGET_HEADER)
                .and_then(split_target)
                .map(|(_, action)| action.to_owned())
                .unwrap_or_default();
            (action, json_params(&json::parse_body(req.body())?))
        };
        tracing::debug!(action = %action, %protocol, "sqs operation");

        let output = self.execute(&action, &params, protocol)?;
        if protocol == Protocol::AwsQuery {
            Ok(xml::query_response(
                &action,
                NAMESPACE,
                output.into_xml(),
                request_id,
            ))
        } else {
            json::success(protocol, &output.into_json(), request_id)
        }
    }

    fn execute(
        &self,
        action: &str,
        params: &[(String, String)],
        protocol: Protocol,
    ) -> Result<Output, ServiceError> {
        match action {
            "CreateQueue" => self.create_queue(params),
            "GetQueueUrl" => {
                let name = required(params, "QueueName")?;
                Ok(Output::QueueUrl(self.queue_by_name(name)?.url.clone()))
            }
            "ListQueues" => {
                let prefix = param(params, "QueueNamePrefix").unwrap_or_default();
                Ok(Output::QueueUrls(
                    self.queues
                        .list()
                        .into_iter()
                        .filter(|(name, _)| name.starts_with(prefix))
                        .map(|(_, q)| q.url.clone())
                        .collect(),
                ))
            }
            "DeleteQueue" => {
                let queue = self.queue_by_url(params)?;
                self.queues
                    .remove(&queue.name)
                    .map_err(|_| queue_missing())?;
                Ok(Output::Empty)
            }
            "GetQueueAttributes" => {
                let queue = self.queue_by_url(params)?;
                Ok(queue_attributes(&queue))
            }
            "SendMessage" => {
                let queue = self.queue_by_url(params)?;
                let body = required(params, "MessageBody")?;
                Ok(send_message(&queue, body))
            }
            "ReceiveMessage" => {
                let queue = self.queue_by_url(params)?;
                receive_messages(&queue, params)
            }
            "DeleteMessage" => {
                let queue = self.queue_by_url(params)?;
                let handle = required(params, "ReceiptHandle")?;
                delete_message(&queue, handle)?;
                Ok(Output::Empty)
            }
            "PurgeQueue" => {
                self.queue_by_url(params)?.messages.lock().clear();
                Ok(Output::Empty)
            }
            other => Err(ServiceError::unknown_operation(
                protocol,
                format!("The action {other} is not valid for this web service."),
            )),
        }
    }

    fn create_queue(&self, params: &[(String, String)]) -> Result<Output, ServiceError> {
        let name = required(params, "QueueName")?;
        if name.len() > 80
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(ServiceError::bad_request(
                "InvalidParameterValue",
                "Can only include alphanumeric characters, hyphens, or underscores. 1 to 80 in length",
            ));
        }
        let visibility_timeout = attribute(params, "VisibilityTimeout")
            .map(|v| {
                visibility_timeout(v).ok_or_else(|| {
                    ServiceError::bad_request(
                        "InvalidAttributeValue",
                        format!("Invalid value for the parameter VisibilityTimeout: {v}"),
                    )
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT);

        // CreateQueue is idempotent for an existing name.
        let queue = self.queues.get_or_create(name, || {
            Arc::new(Queue {
                name: name.to_owned(),
                url: format!(
                    "{}/{}/{name}",
                    self.ctx.base_url(),
                    self.ctx.account.as_str()
                ),
                arn: self.ctx.arn("sqs", name),
                visibility_timeout,
                messages: Mutex::new(Vec::new()),
            })
        });
        Ok(Output::QueueUrl(queue.url.clone()))
    }

    fn queue_by_name(&self, name: &str) -> Result<Arc<Queue>, ServiceError> {
        self.queues.get(name).ok_or_else(queue_missing)
    }

    fn queue_by_url(&self, params: &[(String, String)]) -> Result<Arc<Queue>, ServiceError> {
        let url = required(params, "QueueUrl")?;
        let name = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
        self.queue_by_name(name)
    }
}

/// Flatten a JSON request into Query-style parameters.
///
/// Scalars keep their member name; the `Attributes` map becomes
/// `Attribute.N.Name`/`Attribute.N.Value` pairs.
fn json_params(body: &serde_json::Value) -> Params {
    let mut params = Params::new();
    let Some(object) = body.as_object() else {
        return params;
    };
    for (key, value) in object {
        match value {
            serde_json::Value::String(s) => params.push((key.clone(), s.clone())),
            serde_json::Value::Number(n) => params.push((key.clone(), n.to_string())),
            serde_json::Value::Bool(b) => params.push((key.clone(), b.to_string())),
            serde_json::Value::Object(map) if key == "Attributes" => {
                for (i, (name, v)) in map.iter().enumerate() {
                    let value = v.as_str().map_or_else(|| v.to_string(), str::to_owned);
                    params.push((format!("Attribute.{}.Name", i + 1), name.clone()));
                    params.push((format!("Attribute.{}.Value", i + 1), value));
                }
            }
            _ => {}
        }
    }
    params
}

fn required<'a>(params: &'a [(String, String)], key: &str) -> Result<&'a str, ServiceError> {
    param(params, key).filter(|v| !v.is_empty()).ok_or_else(|| {
        ServiceError::bad_request(
            "MissingParameter",
            format!("The request must contain the parameter {key}."),
        )
    })
}

/// Read `Attribute.N.Name`/`Attribute.N.Value` pairs for a named attribute.
fn attribute<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .filter(|(k, v)| k.starts_with("Attribute.") && k.ends_with(".Name") && v == name)
        .find_map(|(k, _)| {
            let value_key = format!("{}.Value", k.trim_end_matches(".Name"));
            param(params, &value_key)
        })
}

fn queue_missing() -> ServiceError {
    ServiceError::bad_request(
        "AWS.SimpleQueueService.NonExistentQueue",
        "The specified queue does not exist.",
    )
}

fn queue_attributes(queue: &Queue) -> Output {
    let now = Instant::now();
    let messages = queue.messages.lock();
    let visible = messages.iter().filter(|m| m.visible_at <= now).count();
    let in_flight = messages.len() - visible;
    drop(messages);

    Output::Attributes(vec![
        ("QueueArn", queue.arn.clone()),
        ("ApproximateNumberOfMessages", visible.to_string()),
        ("ApproximateNumberOfMessagesNotVisible", in_flight.to_string()),
        ("VisibilityTimeout", queue.visibility_timeout.to_string()),
    ])
}

fn send_message(queue: &Queue, body: &str) -> Output {
    let message = SqsMessage {
        message_id: uuid::Uuid::new_v4().to_string(),
        body: body.to_owned(),
        md5_of_body: hex::encode(Md5::digest(body.as_bytes())),
        receipt_handle: None,
        visible_at: Instant::now(),
        receive_count: 0,
    };
    let output = Output::Sent {
        md5_of_body: message.md5_of_body.clone(),
        message_id: message.message_id.clone(),
    };
    queue.messages.lock().push(message);
    output
}

/// Seconds in `0..=43200`.
fn visibility_timeout(raw: &str) -> Option<u64> {
    raw.parse::<u64>()
        .ok()
        .filter(|secs| *secs <= MAX_VISIBILITY_TIMEOUT)
}

fn receive_messages(queue: &Queue, params: &[(String, String)]) -> Result<Output, ServiceError> {
    let max = match param(params, "MaxNumberOfMessages") {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=MAX_RECEIVE).contains(n))
            .ok_or_else(|| {
                ServiceError::bad_request(
                    "InvalidParameterValue",
                    format!(
                        "Value {raw} for parameter MaxNumberOfMessages is invalid. Reason: Must be between 1 and 10, if provided."
                    ),
                )
            })?,
        None => 1,
    };
    let timeout = match param(params, "VisibilityTimeout") {
        Some(raw) => visibility_timeout(raw).ok_or_else(|| {
            ServiceError::bad_request(
                "InvalidParameterValue",
                format!(
                    "Value {raw} for parameter VisibilityTimeout is invalid. Reason: Must be between 0 and 43200, if provided."
                ),
            )
        })?,
        None => queue.visibility_timeout,
    };

    let now = Instant::now();
    let mut messages = queue.messages.lock();
    let received = messages
        .iter_mut()
        .filter(|m| m.visible_at <= now)
        .take(max)
        .map(|m| {
            let handle = uuid::Uuid::new_v4().to_string();
            m.receipt_handle = Some(handle.clone());
            m.visible_at = now + Duration::from_secs(timeout);
            m.receive_count += 1;
            Received {
                message_id: m.message_id.clone(),
                receipt_handle: handle,
                md5_of_body: m.md5_of_body.clone(),
                body: m.body.clone(),
                receive_count: m.receive_count,
            }
        })
        .collect();
    Ok(Output::Messages(received))
}

fn delete_message(queue: &Queue, handle: &str) -> Result<(), ServiceError> {
    let mut messages = queue.messages.lock();
    let before = messages.len();
    messages.retain(|m| m.receipt_handle.as_deref() != Some(handle));
    if messages.len() == before {
        return Err(ServiceError::bad_request(
            "ReceiptHandleIsInvalid",
            format!("The input receipt handle \"{handle}\" is not a valid receipt handle."),
        ));
    }
    Ok(())
}

/// Render an error for the JSON protocol.
///
/// Query-compatible SDKs read the Query error code from `x-amzn-query-error`.
fn json_error(err: &ServiceError, request_id: &str) -> http::Response<MockResponseBody> {
    let mut response = err.to_response(Protocol::AwsJson1_0, request_id);
    let fault = if err.is_sender_fault() { "Sender" } else { "Receiver" };
    if let Ok(value) = http::HeaderValue::from_str(&format!("{};{fault}", err.code)) {
        response.headers_mut().insert("x-amzn-query-error", value);
    }
    response
}

impl MockService for SqsService {
    fn name(&self) -> &str {
        "sqs"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let protocol = if req.headers().contains_key(TARGET_HEADER) {
            Protocol::AwsJson1_0
        } else {
            Protocol::AwsQuery
        };
        let response = self
            .dispatch(&req, protocol, &request_id)
            .unwrap_or_else(|err| match protocol {
                Protocol::AwsQuery => err.to_response(protocol, &request_id),
                _ => json_error(&err, &request_id),
            });
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.queues.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use cloudmock_protocol::body::collect_bytes;

    use super::*;

    async fn call(svc: &SqsService, form: &str) -> (http::StatusCode, String) {
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Bytes::from(form.to_owned()))
            .unwrap();
        let resp = svc.handle(req).await;
        let status = resp.status();
        let bytes = collect_bytes(resp.into_body()).await;
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn call_json(
        svc: &SqsService,
        op: &str,
        body: &str,
    ) -> (http::StatusCode, http::HeaderMap, serde_json::Value) {
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header("x-amz-target", format!("AmazonSQS.{op}"))
            .header("content-type", "application/x-amz-json-1.0")
            .body(Bytes::from(body.to_owned()))
            .unwrap();
        let resp = svc.handle(req).await;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = collect_bytes(resp.into_body()).await;
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    const QUEUE_URL: &str = "http%3A%2F%2Flocalhost.localstack.cloud%3A4566%2F000000000000%2Fjobs";

    #[tokio::test]
    async fn test_should_create_queue_and_resolve_url() {
        let svc = SqsService::new(ServiceContext::default());
        let (status, body) = call(&svc, "Action=CreateQueue&QueueName=jobs").await;
        assert_eq!(status, http::StatusCode::OK);
        assert!(body.contains(
            "<CreateQueueResponse xmlns=\"http://queue.amazonaws.com/doc/2012-11-05/\">"
        ));
        assert!(body.contains(
            "<QueueUrl>http://localhost.localstack.cloud:4566/000000000000/jobs</QueueUrl>"
        ));

        let (_, body) = call(&svc, "Action=GetQueueUrl&QueueName=jobs").await;
        assert!(body.contains("/000000000000/jobs</QueueUrl>"));
    }

    #[tokio::test]
    async fn test_should_send_receive_and_delete_message() {
        let svc = SqsService::new(ServiceContext::default());
        call(&svc, "Action=CreateQueue&QueueName=jobs").await;
        let (_, sent) = call(
            &svc,
            &format!("Action=SendMessage&QueueUrl={QUEUE_URL}&MessageBody=hello"),
        )
        .await;
        assert!(sent.contains(
            "<MD5OfMessageBody>5d41402abc4b2a76b9719d911017c592</MD5OfMessageBody>"
        ));

        let (_, received) =
            call(&svc, &format!("Action=ReceiveMessage&QueueUrl={QUEUE_URL}")).await;
        assert!(received.contains("<Body>hello</Body>"));
        let handle = received
            .split("<ReceiptHandle>")
            .nth(1)
            .and_then(|rest| rest.split("</ReceiptHandle>").next())
            .unwrap()
            .to_owned();

        // Invisible until the timeout elapses.
        let (_, again) = call(&svc, &format!("Action=ReceiveMessage&QueueUrl={QUEUE_URL}")).await;
        assert!(!again.contains("<Message>"));

        let (status, _) = call(
            &svc,
            &format!("Action=DeleteMessage&QueueUrl={QUEUE_URL}&ReceiptHandle={handle}"),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_read_attributes_and_receive_through_url() {
        let svc = SqsService::new(ServiceContext::default());
        call(
            &svc,
            "Action=CreateQueue&QueueName=jobs&Attribute.1.Name=VisibilityTimeout&Attribute.1.Value=45",
        )
        .await;
        let (status, body) = call(
            &svc,
            &format!("Action=GetQueueAttributes&QueueUrl={QUEUE_URL}&AttributeName.1=All"),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
        assert!(body.contains("<Value>45</Value>"));

        let (status, body) =
            call(&svc, &format!("Action=ReceiveMessage&QueueUrl={QUEUE_URL}")).await;
        assert_eq!(status, http::StatusCode::OK);
        assert!(!body.contains("<Message>"));
    }

    #[tokio::test]
    async fn test_should_reject_out_of_range_visibility_timeout() {
        let svc = SqsService::new(ServiceContext::default());
        call(&svc, "Action=CreateQueue&QueueName=jobs").await;
        call(
            &svc,
            &format!("Action=SendMessage&QueueUrl={QUEUE_URL}&MessageBody=hello"),
        )
        .await;

        for timeout in ["18446744073709551615", "43201", "-1"] {
            let (status, body) = call(
                &svc,
                &format!(
                    "Action=ReceiveMessage&QueueUrl={QUEUE_URL}&VisibilityTimeout={timeout}"
                ),
            )
            .await;
            assert_eq!(status, http::StatusCode::BAD_REQUEST, "{timeout}");
            assert!(body.contains("<Code>InvalidParameterValue</Code>"));
        }

        // The message was never handed out.
        let (_, body) = call(
            &svc,
            &format!("Action=ReceiveMessage&QueueUrl={QUEUE_URL}&VisibilityTimeout=43200"),
        )
        .await;
        assert!(body.contains("<Body>hello</Body>"));

        let (status, body) = call(
            &svc,
            "Action=CreateQueue&QueueName=slow&Attribute.1.Name=VisibilityTimeout&Attribute.1.Value=99999",
        )
        .await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert!(body.contains("<Code>InvalidAttributeValue</Code>"));
    }

    #[tokio::test]
    async fn test_should_report_missing_queue_as_sender_fault() {
        let svc = SqsService::new(ServiceContext::default());
        let (status, body) = call(&svc, "Action=GetQueueUrl&QueueName=ghost").await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert!(body.contains("<Type>Sender</Type>"));
        assert!(body.contains("<Code>AWS.SimpleQueueService.NonExistentQueue</Code>"));
    }

    #[tokio::test]
    async fn test_should_reject_unknown_action() {
        let svc = SqsService::new(ServiceContext::default());
        let (status, body) = call(&svc, "Action=Frobnicate").await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert!(body.contains("<Code>InvalidAction</Code>"));
    }

    #[tokio::test]
    async fn test_should_list_queues_by_prefix_and_reset() {
        let svc = SqsService::new(ServiceContext::default());
        call(&svc, "Action=CreateQueue&QueueName=jobs").await;
        call(&svc, "Action=CreateQueue&QueueName=events").await;
        let (_, body) = call(&svc, "Action=ListQueues&QueueNamePrefix=jo").await;
        assert!(body.contains("/jobs</QueueUrl>"));
        assert!(!body.contains("/events</QueueUrl>"));

        svc.reset().unwrap();
        let (_, body) = call(&svc, "Action=ListQueues").await;
        assert!(!body.contains("<QueueUrl>"));
    }

    #[tokio::test]
    async fn test_should_speak_json_protocol() {
        let svc = SqsService::new(ServiceContext::default());
        let (status, _, created) = call_json(
            &svc,
            "CreateQueue",
            r#"{"QueueName":"jobs","Attributes":{"VisibilityTimeout":"5"}}"#,
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
        let url = created["QueueUrl"].as_str().unwrap().to_owned();

        let (_, _, attrs) = call_json(
            &svc,
            "GetQueueAttributes",
            &format!(r#"{{"QueueUrl":"{url}"}}"#),
        )
        .await;
        assert_eq!(attrs["Attributes"]["VisibilityTimeout"], "5");

        call_json(
            &svc,
            "SendMessage",
            &format!(r#"{{"QueueUrl":"{url}","MessageBody":"hi"}}"#),
        )
        .await;
        let (_, _, received) = call_json(
            &svc,
            "ReceiveMessage",
            &format!(r#"{{"QueueUrl":"{url}","MaxNumberOfMessages":10}}"#),
        )
        .await;
        assert_eq!(received["Messages"][0]["Body"], "hi");
    }

    #[tokio::test]
    async fn test_should_tag_json_errors_with_query_code() {
        let svc = SqsService::new(ServiceContext::default());
        let (status, headers, body) =
            call_json(&svc, "GetQueueUrl", r#"{"QueueName":"ghost"}"#).await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["__type"], "AWS.SimpleQueueService.NonExistentQueue");
        assert_eq!(
            headers["x-amzn-query-error"],
            "AWS.SimpleQueueService.NonExistentQueue;Sender"
        );
    }

    #[test]
    fn test_should_read_indexed_attributes() {
        let params = vec![
            ("Attribute.1.Name".to_owned(), "VisibilityTimeout".to_owned()),
            ("Attribute.1.Value".to_owned(), "5".to_owned()),
        ];
        assert_eq!(attribute(&params, "VisibilityTimeout"), Some("5"));
        assert_eq!(attribute(&params, "DelaySeconds"), None);
    }
}
