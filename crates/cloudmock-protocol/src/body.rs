//! Mock service response body type.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Frame, SizeHint};

/// Response body shared by every mock service.
///
/// Mock responses are JSON or XML documents, object payloads, or nothing, so
/// the body is always a single buffered frame. The frame is taken on first poll.
#[derive(Debug, Default)]
pub struct MockResponseBody {
    data: Option<Bytes>,
}

impl MockResponseBody {
    /// Create a response body from raw bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        Self {
            data: (!data.is_empty()).then_some(data),
        }
    }

    /// Create a response body from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::from_bytes(s.into())
    }

    /// Body for `204 No Content` and `HEAD` responses.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl http_body::Body for MockResponseBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        Poll::Ready(self.get_mut().data.take().map(|data| Ok(Frame::data(data))))
    }

    fn is_end_stream(&self) -> bool {
        self.data.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.data.as_ref().map_or(0, |d| d.len() as u64))
    }
}

/// Take the whole payload out of a response body.
pub async fn collect_bytes(body: MockResponseBody) -> Bytes {
    body.data.unwrap_or_default()
}
