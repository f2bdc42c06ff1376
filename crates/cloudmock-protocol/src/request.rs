//! Buffered request type and the generic request signals services and the
//! gateway read: the target header, query/form parameters, host, and SigV4
//! credential scope.

use bytes::Bytes;

/// A fully buffered inbound request as delivered to a mock service.
pub type MockRequest = http::Request<Bytes>;

/// Header carrying `<ServicePrefix>.<Action>` for JSON-RPC protocols.
pub const TARGET_HEADER: &str = "x-amz-target";

/// Get a header value as a string slice, if present and valid UTF-8.
#[must_use]
pub fn header_str<'a>(headers: &'a http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Split an `X-Amz-Target` value into `(prefix, action)` at the first `.`.
///
/// Returns `None` when there is no dot or either side is empty.
#[must_use]
pub fn split_target(target: &str) -> Option<(&str, &str)> {
    let (prefix, action) = target.split_once('.')?;
    if prefix.is_empty() || action.is_empty() {
        return None;
    }
    Some((prefix, action))
}

/// The action named by the `X-Amz-Target` header, if well formed.
#[must_use]
pub fn target_action(headers: &http::HeaderMap) -> Option<&str> {
    header_str(headers, TARGET_HEADER)
        .and_then(split_target)
        .map(|(_, action)| action)
}

/// The request host without port, lowercased.
#[must_use]
pub fn host<B>(req: &http::Request<B>) -> Option<String> {
    let raw = header_str(req.headers(), "host").or_else(|| req.uri().host())?;
    let without_port = raw.rsplit_once(':').map_or(raw, |(h, port)| {
        if port.chars().all(|c| c.is_ascii_digit()) {
            h
        } else {
            raw
        }
    });
    Some(without_port.to_ascii_lowercase())
}

/// Decode the URI query string into key/value pairs.
#[must_use]
pub fn query_params(uri: &http::Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Whether the request body is `application/x-www-form-urlencoded`.
#[must_use]
pub fn is_form_encoded(headers: &http::HeaderMap) -> bool {
    header_str(headers, "content-type")
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Query parameters merged with form-encoded body parameters (Query protocol).
///
/// URI parameters come first, so a lookup with [`param`] prefers them.
#[must_use]
pub fn form_params(req: &MockRequest) -> Vec<(String, String)> {
    let mut params = query_params(req.uri());
    if is_form_encoded(req.headers()) {
        params.extend(form_urlencoded::parse(req.body()).into_owned());
    }
    params
}

/// Get the first value of a named parameter.
#[must_use]
pub fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// The credential scope of a SigV4-signed request.
///
/// `AKID/20240101/us-east-1/sqs/aws4_request` names the signing service and
/// region even when nothing else in the request does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// Access key ID.
    pub access_key: String,
    /// Signing date (`YYYYMMDD`).
    pub date: String,
    /// Signing region.
    pub region: String,
    /// Signing service name.
    pub service: String,
}

impl CredentialScope {
    /// Parse a `Credential` value of the form `AKID/date/region/service/aws4_request`.
    #[must_use]
    pub fn parse(credential: &str) -> Option<Self> {
        let mut parts = credential.trim().split('/');
        let access_key = parts.next()?;
        let date = parts.next()?;
        let region = parts.next()?;
        let service = parts.next()?;
        if parts.next()? != "aws4_request" || service.is_empty() {
            return None;
        }
        Some(Self {
            access_key: access_key.to_owned(),
            date: date.to_owned(),
            region: region.to_owned(),
            service: service.to_owned(),
        })
    }

    /// Extract the scope from the `Authorization` header, or from the
    /// `X-Amz-Credential` query parameter of a presigned URL.
    #[must_use]
    pub fn from_request<B>(req: &http::Request<B>) -> Option<Self> {
        if let Some(auth) = header_str(req.headers(), "authorization") {
            let credential = auth
                .strip_prefix("AWS4-HMAC-SHA256")?
                .split(',')
                .find_map(|part| part.trim().strip_prefix("Credential="))?;
            return Self::parse(credential);
        }
        let params = query_params(req.uri());
        param(&params, "X-Amz-Credential").and_then(Self::parse)
    }
}
