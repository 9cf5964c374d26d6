//! Body capture for logging.
//!
//! [`CaptureBody`] wraps a body stream. Every data frame is handed on to the
//! real destination unchanged. In copy mode a copy is appended to an internal
//! buffer; in count mode only the byte total is kept. When the stream ends,
//! the result is sent once through a oneshot channel to whoever does the
//! logging.
//!
//! # Data Flow
//! ```text
//! origin ──frames──▶ CaptureBody ──frames──▶ client
//!                        │
//!                        └── buffer or count ──(end of stream)──▶ Captured
//! ```

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};
use http_body::{Body as HttpBody, Frame, SizeHint};
use tokio::sync::oneshot;

/// A captured response, assembled by the logging task.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// What a capture delivers once its stream has ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedBody {
    /// Every byte the stream carried.
    Copied(Bytes),
    /// Only the number of bytes the stream carried.
    Counted(u64),
}

impl CapturedBody {
    pub fn len(&self) -> u64 {
        match self {
            CapturedBody::Copied(body) => body.len() as u64,
            CapturedBody::Counted(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receiving end of a capture. Resolves once the stream has ended, or to an
/// error if the stream failed or was dropped first.
pub type Captured = oneshot::Receiver<CapturedBody>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Copy,
    Count,
}

/// Forwarding body wrapper that copies or counts every data frame.
pub struct CaptureBody {
    inner: Body,
    mode: Mode,
    buffer: BytesMut,
    counted: u64,
    done: Option<oneshot::Sender<CapturedBody>>,
}

impl CaptureBody {
    /// Capture that keeps a full copy of the body.
    pub fn new(inner: Body) -> (Self, Captured) {
        Self::with_mode(inner, Mode::Copy)
    }

    /// Capture that only counts bytes and never buffers them.
    pub fn counting(inner: Body) -> (Self, Captured) {
        Self::with_mode(inner, Mode::Count)
    }

    fn with_mode(inner: Body, mode: Mode) -> (Self, Captured) {
        let (tx, rx) = oneshot::channel();
        let mut body = Self {
            inner,
            mode,
            buffer: BytesMut::new(),
            counted: 0,
            done: Some(tx),
        };
        // An empty body may never be polled at all.
        if body.inner.is_end_stream() {
            body.finish();
        }
        (body, rx)
    }

    fn finish(&mut self) {
        if let Some(done) = self.done.take() {
            let captured = match self.mode {
                Mode::Copy => CapturedBody::Copied(std::mem::take(&mut self.buffer).freeze()),
                Mode::Count => CapturedBody::Counted(self.counted),
            };
            let _ = done.send(captured);
        }
    }
}

impl HttpBody for CaptureBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.counted += data.len() as u64;
                    if this.mode == Mode::Copy {
                        this.buffer.extend_from_slice(data);
                    }
                }
                // hyper may stop polling once the inner body reports its end.
                if this.inner.is_end_stream() {
                    this.finish();
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(e)) => {
                // Incomplete capture: drop the sender so the receiver sees an error.
                this.done.take();
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.finish();
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::poll_fn;
    use futures_util::stream;

    #[tokio::test]
    async fn test_capture_matches_delivered_bytes() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"streamed ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let (body, captured) = CaptureBody::new(Body::from_stream(stream::iter(chunks)));

        let delivered = axum::body::to_bytes(Body::new(body), usize::MAX).await.unwrap();
        let captured = captured.await.unwrap();

        assert_eq!(delivered, Bytes::from_static(b"hello streamed world"));
        assert_eq!(captured, CapturedBody::Copied(delivered));
    }

    #[tokio::test]
    async fn test_capture_full_body() {
        let (body, captured) = CaptureBody::new(Body::from("single frame"));

        let delivered = axum::body::to_bytes(Body::new(body), usize::MAX).await.unwrap();
        assert_eq!(captured.await.unwrap(), CapturedBody::Copied(delivered));
    }

    #[tokio::test]
    async fn test_capture_empty_body() {
        let (body, captured) = CaptureBody::new(Body::empty());

        let delivered = axum::body::to_bytes(Body::new(body), usize::MAX).await.unwrap();
        assert!(delivered.is_empty());
        assert!(captured.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counting_mode_keeps_no_copy() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(vec![7u8; 64 * 1024])),
            Ok(Bytes::from(vec![9u8; 64 * 1024])),
        ];
        let (mut body, captured) = CaptureBody::counting(Body::from_stream(stream::iter(chunks)));

        let mut delivered = 0;
        while let Some(frame) = poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await {
            delivered += frame.unwrap().into_data().unwrap().len();
            assert_eq!(body.buffer.capacity(), 0);
        }

        assert_eq!(delivered, 128 * 1024);
        assert_eq!(captured.await.unwrap(), CapturedBody::Counted(128 * 1024));
    }

    #[tokio::test]
    async fn test_stream_error_abandons_capture() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let (body, captured) = CaptureBody::new(Body::from_stream(stream::iter(chunks)));

        assert!(axum::body::to_bytes(Body::new(body), usize::MAX).await.is_err());
        assert!(captured.await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_body_abandons_capture() {
        let (body, captured) = CaptureBody::new(Body::from("never read"));
        drop(body);
        assert!(captured.await.is_err());
    }
}
