//! XML envelopes for the `awsQuery` and `restXml` protocols.
//!
//! Services describe their result payloads as a small owned [`Element`] tree;
//! this module turns the tree into bytes with `quick-xml` and wraps it in the
//! protocol's envelope:
//!
//! ```xml
//! <CreateQueueResponse xmlns="http://queue.amazonaws.com/doc/2012-11-05/">
//!   <CreateQueueResult>
//!     <QueueUrl>http://localhost:4566/000000000000/orders</QueueUrl>
//!   </CreateQueueResult>
//!   <ResponseMetadata>
//!     <RequestId>...</RequestId>
//!   </ResponseMetadata>
//! </CreateQueueResponse>
//! ```

use std::collections::HashMap;
use std::io;

use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::body::MockResponseBody;
use crate::error::ServiceError;
use crate::protocol::Protocol;
use crate::response::REQUEST_ID_HEADER;

/// Errors that can occur while reading XML request bodies.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}

impl From<XmlError> for ServiceError {
    fn from(err: XmlError) -> Self {
        ServiceError::bad_request("MalformedXML", err.to_string())
    }
}

/// An owned XML element: name, attributes, and either text or children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// An element with no content.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// `<name>value</name>`.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(value.into()),
            ..Self::default()
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Append a child element.
    #[must_use]
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child elements.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn write_element<W: io::Write>(writer: &mut Writer<W>, element: &Element) -> io::Result<()> {
    let mut start = writer.create_element(element.name.as_str());
    for (key, value) in &element.attributes {
        start = start.with_attribute((key.as_str(), value.as_str()));
    }

    if let Some(text) = &element.text {
        start.write_text_content(BytesText::new(text))?;
    } else if element.children.is_empty() {
        start.write_empty()?;
    } else {
        start.write_inner_content(|w| {
            for child in &element.children {
                write_element(w, child)?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// Serialize an element tree as a standalone document with an XML declaration.
#[must_use]
pub fn to_document(root: &Element) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    let result = {
        let mut writer = Writer::new(&mut buf);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .and_then(|()| write_element(&mut writer, root))
    };
    // Writing to Vec<u8> is infallible; if this fails it means a logic error.
    if let Err(e) = result {
        tracing::error!(error = %e, element = %root.name, "failed to serialize XML document");
        buf.clear();
    }
    buf
}

fn xml_response(
    protocol: Protocol,
    status: http::StatusCode,
    xml: Vec<u8>,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    http::Response::builder()
        .status(status)
        .header("content-type", protocol.content_type())
        .header(REQUEST_ID_HEADER, request_id)
        .body(MockResponseBody::from_bytes(xml))
        .expect("valid XML response")
}

/// Build a `200 OK` Query protocol response for `action`.
///
/// `result` becomes the content of `<{action}Result>`; when it is empty the
/// result element is omitted, as AWS does for actions with no output.
#[must_use]
pub fn query_response(
    action: &str,
    namespace: &str,
    result: Vec<Element>,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    let mut root = Element::new(format!("{action}Response")).attr("xmlns", namespace);
    if !result.is_empty() {
        root = root.child(Element::new(format!("{action}Result")).children(result));
    }
    root = root
        .child(Element::new("ResponseMetadata").child(Element::text("RequestId", request_id)));
    xml_response(
        Protocol::AwsQuery,
        http::StatusCode::OK,
        to_document(&root),
        request_id,
    )
}

/// Format a Query protocol error document.
///
/// ```xml
/// <ErrorResponse>
///   <Error>
///     <Type>Sender</Type>
///     <Code>QueueDoesNotExist</Code>
///     <Message>The specified queue does not exist.</Message>
///   </Error>
///   <RequestId>...</RequestId>
/// </ErrorResponse>
/// ```
#[must_use]
pub fn query_error_to_xml(error: &ServiceError, request_id: &str) -> Vec<u8> {
    let fault = if error.is_sender_fault() {
        "Sender"
    } else {
        "Receiver"
    };
    let root = Element::new("ErrorResponse")
        .child(
            Element::new("Error")
                .child(Element::text("Type", fault))
                .child(Element::text("Code", &*error.code))
                .child(Element::text("Message", error.message.as_str())),
        )
        .child(Element::text("RequestId", request_id));
    to_document(&root)
}

/// Convert a [`ServiceError`] into a Query protocol error response.
#[must_use]
pub fn query_error_response(
    error: &ServiceError,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    xml_response(
        Protocol::AwsQuery,
        error.status,
        query_error_to_xml(error, request_id),
        request_id,
    )
}

/// Build a REST-XML response whose body is `root`.
#[must_use]
pub fn rest_response(
    status: http::StatusCode,
    root: &Element,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    xml_response(Protocol::RestXml, status, to_document(root), request_id)
}

/// Format a REST-XML error as a flat `<Error>` element, without an outer
/// `<ErrorResponse>` wrapper.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>NoSuchBucket</Code>
///   <Message>The specified bucket does not exist</Message>
///   <Resource>/mybucket</Resource>
///   <RequestId>...</RequestId>
/// </Error>
/// ```
#[must_use]
pub fn rest_error_to_xml(
    error: &ServiceError,
    resource: Option<&str>,
    request_id: &str,
) -> Vec<u8> {
    let mut root = Element::new("Error")
        .child(Element::text("Code", &*error.code))
        .child(Element::text("Message", error.message.as_str()));
    if let Some(res) = resource {
        root = root.child(Element::text("Resource", res));
    }
    root = root.child(Element::text("RequestId", request_id));
    to_document(&root)
}

/// Convert a [`ServiceError`] into a REST-XML error response.
#[must_use]
pub fn rest_error_response(
    error: &ServiceError,
    resource: Option<&str>,
    request_id: &str,
) -> http::Response<MockResponseBody> {
    xml_response(
        Protocol::RestXml,
        error.status,
        rest_error_to_xml(error, resource, request_id),
        request_id,
    )
}

/// Read the text of the first occurrence of each named leaf element.
///
/// Nesting is ignored: `<DistributionConfig><Comment>x</Comment></DistributionConfig>`
/// yields `Comment = x`. Names not present in the document are absent from the map.
pub fn read_fields(xml: &[u8], names: &[&str]) -> Result<HashMap<String, String>, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut fields = HashMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let tag = std::str::from_utf8(name.as_ref())
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                current = names.contains(&tag).then(|| tag.to_owned());
            }
            Event::Text(e) => {
                if let Some(tag) = current.as_ref() {
                    let decoded = e
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    let unescaped = quick_xml::escape::unescape(&decoded)
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    fields
                        .entry(tag.clone())
                        .or_insert_with(|| unescaped.into_owned());
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_str(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).expect("valid UTF-8")
    }

    #[test]
    fn test_should_write_nested_document() {
        let root = Element::new("ListBucketsResult")
            .attr("xmlns", "http://s3.amazonaws.com/doc/2006-03-01/")
            .child(
                Element::new("Buckets")
                    .child(Element::new("Bucket").child(Element::text("Name", "photos"))),
            )
            .child(Element::new("Empty"));
        let xml = to_document(&root);
        let text = as_str(&xml);

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains(
            "<ListBucketsResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">"
        ));
        assert!(text.contains("<Buckets><Bucket><Name>photos</Name></Bucket></Buckets>"));
        assert!(text.contains("<Empty/>"));
    }

    #[test]
    fn test_should_wrap_query_result_and_metadata() {
        let resp = query_response(
            "GetQueueUrl",
            "http://queue.amazonaws.com/doc/2012-11-05/",
            vec![Element::text("QueueUrl", "http://localhost/000000000000/q")],
            "rid-7",
        );
        assert_eq!(resp.headers().get("content-type").unwrap(), "text/xml");
        assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "rid-7");
    }

    #[test]
    fn test_should_format_query_error_with_fault_type() {
        let err = ServiceError::bad_request(
            "QueueDoesNotExist",
            "The specified queue does not exist.",
        );
        let xml = query_error_to_xml(&err, "rid-8");
        let text = as_str(&xml);
        assert!(text.contains("<Type>Sender</Type>"));
        assert!(text.contains("<Code>QueueDoesNotExist</Code>"));
        assert!(text.contains("<RequestId>rid-8</RequestId>"));
    }

    #[test]
    fn test_should_format_rest_error_with_resource() {
        let err = ServiceError::not_found("NoSuchBucket", "The specified bucket does not exist");
        let xml = rest_error_to_xml(&err, Some("/mybucket"), "tx000001");
        let text = as_str(&xml);
        assert!(text.contains("<Code>NoSuchBucket</Code>"));
        assert!(text.contains("<Resource>/mybucket</Resource>"));
        assert!(text.contains("<RequestId>tx000001</RequestId>"));
    }

    #[test]
    fn test_should_escape_special_characters() {
        let err = ServiceError::bad_request("InvalidArgument", "Value must be < 1024 & > 0");
        let xml = rest_error_to_xml(&err, None, "tx000003");
        assert!(as_str(&xml).contains("Value must be &lt; 1024 &amp; &gt; 0"));
    }

    #[test]
    fn test_should_read_named_leaf_fields() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
            <DistributionConfig xmlns="http://cloudfront.amazonaws.com/doc/2020-05-31/">
              <CallerReference>ref-1</CallerReference>
              <Comment>static site</Comment>
              <Origins><Quantity>1</Quantity></Origins>
            </DistributionConfig>"#;
        let fields = read_fields(body, &["CallerReference", "Comment", "Missing"]).unwrap();
        assert_eq!(fields.get("CallerReference").map(String::as_str), Some("ref-1"));
        assert_eq!(fields.get("Comment").map(String::as_str), Some("static site"));
        assert!(!fields.contains_key("Missing"));
        assert!(!fields.contains_key("Quantity"));
    }
}
