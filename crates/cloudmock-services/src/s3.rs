//! Mock S3 (`restXml`).
//!
//! Buckets are addressed path-style (`/bucket/key`) or virtual-hosted
//! (`bucket.s3.<domain>/key`). Objects are stored whole in memory.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use cloudmock_core::{ResourceStore, StoreError};
use cloudmock_protocol::request::{header_str, host, query_params};
use cloudmock_protocol::response::empty_response;
use cloudmock_protocol::service::ready;
use cloudmock_protocol::xml::{self, Element};
use cloudmock_protocol::{
    MockRequest, MockResponseBody, MockService, REQUEST_ID_HEADER, ResetError, ServiceError,
    ServiceFuture, new_request_id,
};
use md5::{Digest, Md5};
use parking_lot::RwLock;
use percent_encoding::percent_decode_str;

use crate::context::{ServiceContext, iso8601};

/// XML namespace of S3 responses.
pub const NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

const MAX_KEYS: usize = 1000;

#[derive(Debug, Clone)]
struct S3Object {
    data: Bytes,
    etag: String,
    content_type: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug)]
struct Bucket {
    created: DateTime<Utc>,
    objects: RwLock<BTreeMap<String, S3Object>>,
}

/// The bucket and key a request addresses.
#[derive(Debug, Default, PartialEq, Eq)]
struct Address {
    bucket: Option<String>,
    key: Option<String>,
}

impl Address {
    /// Resolve the addressing style: a host of the form `<bucket>.s3.<domain>`
    /// names the bucket, otherwise the first path segment does.
    fn from_request(req: &MockRequest) -> Self {
        let path = req.uri().path().trim_start_matches('/');
        let decode = |s: &str| percent_decode_str(s).decode_utf8_lossy().into_owned();

        let virtual_bucket = host(req).and_then(|h| {
            let mut labels = h.split('.');
            let bucket = labels.next()?;
            (labels.next() == Some("s3") && !bucket.is_empty()).then(|| bucket.to_owned())
        });

        if let Some(bucket) = virtual_bucket {
            let key = (!path.is_empty()).then(|| decode(path));
            return Self {
                bucket: Some(bucket),
                key,
            };
        }

        match path.split_once('/') {
            _ if path.is_empty() => Self::default(),
            Some((bucket, key)) if !key.is_empty() => Self {
                bucket: Some(decode(bucket)),
                key: Some(decode(key)),
            },
            Some((bucket, _)) => Self {
                bucket: Some(decode(bucket)),
                key: None,
            },
            None => Self {
                bucket: Some(decode(path)),
                key: None,
            },
        }
    }
}

/// Mock S3 service.
#[derive(Debug)]
pub struct S3Service {
    ctx: ServiceContext,
    buckets: ResourceStore<Arc<Bucket>>,
}

impl S3Service {
    /// Create a service with no buckets.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            buckets: ResourceStore::new(),
        }
    }

    fn dispatch(
        &self,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let address = Address::from_request(req);
        let method = req.method();
        tracing::debug!(%method, bucket = ?address.bucket, key = ?address.key, "s3 request");

        match (address.bucket, address.key) {
            (None, _) if method == http::Method::GET => Ok(self.list_buckets(request_id)),
            (Some(bucket), None) => match *method {
                http::Method::PUT => self.create_bucket(&bucket, request_id),
                http::Method::HEAD => {
                    self.bucket(&bucket)?;
                    Ok(empty_response(http::StatusCode::OK, request_id))
                }
                http::Method::DELETE => self.delete_bucket(&bucket, request_id),
                http::Method::GET => self.list_objects(&bucket, req, request_id),
                _ => Err(method_not_allowed(method)),
            },
            (Some(bucket), Some(key)) => match *method {
                http::Method::PUT => self.put_object(&bucket, &key, req, request_id),
                http::Method::GET => self.get_object(&bucket, &key, request_id, true),
                http::Method::HEAD => self.get_object(&bucket, &key, request_id, false),
                http::Method::DELETE => {
                    self.bucket(&bucket)?.objects.write().remove(&key);
                    Ok(empty_response(http::StatusCode::NO_CONTENT, request_id))
                }
                _ => Err(method_not_allowed(method)),
            },
            (None, _) => Err(method_not_allowed(method)),
        }
    }

    fn bucket(&self, name: &str) -> Result<Arc<Bucket>, ServiceError> {
        self.buckets.require(name).map_err(bucket_error)
    }

    fn list_buckets(&self, request_id: &str) -> http::Response<MockResponseBody> {
        let buckets = self.buckets.list().into_iter().map(|(name, b)| {
            Element::new("Bucket")
                .child(Element::text("Name", name))
                .child(Element::text("CreationDate", iso8601(b.created)))
        });
        let root = Element::new("ListAllMyBucketsResult")
            .attr("xmlns", NAMESPACE)
            .child(self.owner())
            .child(Element::new("Buckets").children(buckets));
        xml::rest_response(http::StatusCode::OK, &root, request_id)
    }

    fn create_bucket(
        &self,
        name: &str,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        if !is_valid_bucket_name(name) {
            return Err(ServiceError::bad_request(
                "InvalidBucketName",
                "The specified bucket is not valid.",
            ));
        }
        self.buckets
            .create(
                name,
                Arc::new(Bucket {
                    created: Utc::now(),
                    objects: RwLock::new(BTreeMap::new()),
                }),
            )
            .map_err(bucket_error)?;
        http::Response::builder()
            .status(http::StatusCode::OK)
            .header("location", format!("/{name}"))
            .header(REQUEST_ID_HEADER, request_id)
            .header("x-amz-request-id", request_id)
            .body(MockResponseBody::empty())
            .map_err(|e| ServiceError::internal(e.to_string()))
    }

    fn delete_bucket(
        &self,
        name: &str,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        if !self.bucket(name)?.objects.read().is_empty() {
            return Err(ServiceError::conflict(
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty",
            ));
        }
        self.buckets.remove(name).map_err(bucket_error)?;
        Ok(empty_response(http::StatusCode::NO_CONTENT, request_id))
    }

    /// `ListObjectsV2`; the continuation token is the last key returned.
    fn list_objects(
        &self,
        name: &str,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let bucket = self.bucket(name)?;
        let params = query_params(req.uri());
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        let prefix = get("prefix").unwrap_or_default();
        let start_after = get("continuation-token").or_else(|| get("start-after"));
        let max_keys = get("max-keys")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MAX_KEYS)
            .min(MAX_KEYS);

        let objects = bucket.objects.read();
        let mut matching = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| start_after.is_none_or(|after| key.as_str() > after));
        let page: Vec<(&String, &S3Object)> = matching.by_ref().take(max_keys).collect();
        let truncated = matching.next().is_some();

        let mut root = Element::new("ListBucketResult")
            .attr("xmlns", NAMESPACE)
            .child(Element::text("Name", name))
            .child(Element::text("Prefix", prefix))
            .child(Element::text("KeyCount", page.len().to_string()))
            .child(Element::text("MaxKeys", max_keys.to_string()))
            .child(Element::text("IsTruncated", truncated.to_string()));
        if truncated {
            if let Some((last, _)) = page.last() {
                root = root.child(Element::text("NextContinuationToken", last.as_str()));
            }
        }
        root = root.children(page.iter().map(|(key, obj)| {
            Element::new("Contents")
                .child(Element::text("Key", key.as_str()))
                .child(Element::text("LastModified", iso8601(obj.last_modified)))
                .child(Element::text("ETag", obj.etag.as_str()))
                .child(Element::text("Size", obj.data.len().to_string()))
                .child(Element::text("StorageClass", "STANDARD"))
        }));
        Ok(xml::rest_response(http::StatusCode::OK, &root, request_id))
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        req: &MockRequest,
        request_id: &str,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let bucket = self.bucket(bucket)?;
        let data = if is_aws_chunked(req.headers()) {
            decode_aws_chunked(req.body())?
        } else {
            req.body().clone()
        };
        let etag = format!("\"{}\"", hex::encode(Md5::digest(&data)));
        let object = S3Object {
            etag: etag.clone(),
            content_type: header_str(req.headers(), "content-type")
                .unwrap_or("binary/octet-stream")
                .to_owned(),
            last_modified: Utc::now(),
            data,
        };
        bucket.objects.write().insert(key.to_owned(), object);

        http::Response::builder()
            .status(http::StatusCode::OK)
            .header("etag", etag)
            .header(REQUEST_ID_HEADER, request_id)
            .header("x-amz-request-id", request_id)
            .body(MockResponseBody::empty())
            .map_err(|e| ServiceError::internal(e.to_string()))
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        request_id: &str,
        with_body: bool,
    ) -> Result<http::Response<MockResponseBody>, ServiceError> {
        let object = self
            .bucket(bucket)?
            .objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| {
                ServiceError::not_found("NoSuchKey", "The specified key does not exist.")
            })?;

        let body = if with_body {
            MockResponseBody::from_bytes(object.data.clone())
        } else {
            MockResponseBody::empty()
        };
        http::Response::builder()
            .status(http::StatusCode::OK)
            .header("content-type", object.content_type)
            .header("content-length", object.data.len())
            .header("etag", object.etag)
            .header(
                "last-modified",
                object
                    .last_modified
                    .format("%a, %d %b %Y %H:%M:%S GMT")
                    .to_string(),
            )
            .header(REQUEST_ID_HEADER, request_id)
            .header("x-amz-request-id", request_id)
            .body(body)
            .map_err(|e| ServiceError::internal(e.to_string()))
    }

    fn owner(&self) -> Element {
        Element::new("Owner")
            .child(Element::text("ID", self.ctx.account.as_str()))
            .child(Element::text("DisplayName", "cloudmock"))
    }
}

fn is_valid_bucket_name(name: &str) -> bool {
    (3..=63).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        && name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name.ends_with(|c: char| c.is_ascii_alphanumeric())
}

fn bucket_error(err: StoreError) -> ServiceError {
    match err {
        StoreError::AlreadyExists(_) => ServiceError::conflict(
            "BucketAlreadyOwnedByYou",
            "Your previous request to create the named bucket succeeded and you already own it.",
        ),
        StoreError::NotFound(_) => {
            ServiceError::not_found("NoSuchBucket", "The specified bucket does not exist")
        }
    }
}

fn method_not_allowed(method: &http::Method) -> ServiceError {
    ServiceError::new(
        "MethodNotAllowed",
        http::StatusCode::METHOD_NOT_ALLOWED,
        format!("The specified method is not allowed against this resource: {method}"),
    )
}

impl MockService for S3Service {
    fn name(&self) -> &str {
        "s3"
    }

    fn handle(&self, req: MockRequest) -> ServiceFuture {
        let request_id = new_request_id();
        let response = self.dispatch(&req, &request_id).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "s3 request failed");
            if req.method() == http::Method::HEAD {
                // HEAD responses carry no body, only the status.
                empty_response(err.status, &request_id)
            } else {
                xml::rest_error_response(&err, Some(req.uri().path()), &request_id)
            }
        });
        ready(response)
    }

    fn reset(&self) -> Result<(), ResetError> {
        self.buckets.clear();
        Ok(())
    }
}

/// Whether the body uses the `aws-chunked` framing of streaming uploads.
fn is_aws_chunked(headers: &http::HeaderMap) -> bool {
    header_str(headers, "content-encoding").is_some_and(|ce| ce.contains("aws-chunked"))
        || header_str(headers, "x-amz-content-sha256").is_some_and(|s| s.starts_with("STREAMING-"))
}

/// Strip `aws-chunked` framing: `<hex-size>[;ext]\r\n<data>\r\n` repeated
/// until a zero-size chunk. Trailers after the last chunk are ignored.
fn decode_aws_chunked(body: &[u8]) -> Result<Bytes, ServiceError> {
    let malformed = |detail: &str| {
        ServiceError::bad_request(
            "InvalidArgument",
            format!("Malformed aws-chunked body: {detail}"),
        )
    };
    let mut output = BytesMut::new();
    let mut rest = body;

    loop {
        let line_end = rest
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| malformed("missing chunk size line"))?;
        let size_line = &rest[..line_end];
        let hex = size_line.split(|&b| b == b';').next().unwrap_or_default();
        let size = std::str::from_utf8(hex)
            .ok()
            .and_then(|h| usize::from_str_radix(h.trim(), 16).ok())
            .ok_or_else(|| malformed("invalid chunk size"))?;
        rest = &rest[line_end + 2..];

        if size == 0 {
            return Ok(output.freeze());
        }
        let data_end = size
            .checked_add(2)
            .filter(|end| *end <= rest.len())
            .ok_or_else(|| malformed("chunk data truncated"))?;
        let (data, crlf) = rest[..data_end].split_at(size);
        if crlf != b"\r\n" {
            return Err(malformed("missing CRLF after chunk data"));
        }
        output.extend_from_slice(data);
        rest = &rest[data_end..];
    }
}
