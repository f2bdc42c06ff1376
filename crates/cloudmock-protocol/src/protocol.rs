//! AWS wire protocol families.

use std::fmt;

use crate::request::{TARGET_HEADER, header_str, is_form_encoded, param, query_params};

/// The wire convention a service uses to encode requests and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// `POST /` with `X-Amz-Target`, JSON body, `application/x-amz-json-1.0`.
    AwsJson1_0,
    /// `POST /` with `X-Amz-Target`, JSON body, `application/x-amz-json-1.1`.
    AwsJson1_1,
    /// Form-encoded parameters with an `Action` parameter, XML responses.
    AwsQuery,
    /// Resource paths, XML bodies.
    RestXml,
    /// Resource paths, JSON bodies.
    RestJson,
}

impl Protocol {
    /// Content type of success and error bodies.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::AwsJson1_0 => "application/x-amz-json-1.0",
            Self::AwsJson1_1 => "application/x-amz-json-1.1",
            Self::AwsQuery => "text/xml",
            Self::RestXml => "application/xml",
            Self::RestJson => "application/json",
        }
    }

    /// Whether bodies in this protocol are JSON.
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::AwsJson1_0 | Self::AwsJson1_1 | Self::RestJson)
    }

    /// Guess the protocol family of a request from generic signals only.
    ///
    /// Used to frame an error for a request no service claimed, so the client
    /// SDK can still parse the failure.
    #[must_use]
    pub fn infer<B>(req: &http::Request<B>) -> Self {
        let headers = req.headers();
        let content_type = header_str(headers, "content-type").unwrap_or_default();

        if content_type.starts_with("application/x-amz-json-1.0") {
            return Self::AwsJson1_0;
        }
        if headers.contains_key(TARGET_HEADER)
            || content_type.starts_with("application/x-amz-json")
        {
            return Self::AwsJson1_1;
        }
        if is_form_encoded(headers) || param(&query_params(req.uri()), "Action").is_some() {
            return Self::AwsQuery;
        }
        if content_type.starts_with("application/json") {
            return Self::RestJson;
        }
        Self::RestXml
    }

    /// Short protocol name as used in service models.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwsJson1_0 => "awsJson1_0",
            Self::AwsJson1_1 => "awsJson1_1",
            Self::AwsQuery => "awsQuery",
            Self::RestXml => "restXml",
            Self::RestJson => "restJson1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
