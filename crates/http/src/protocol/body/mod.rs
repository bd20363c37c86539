//! Streaming request bodies.
//!
//! The connection never buffers a whole request body. Instead the handler
//! gets a [`ReqBody`] whose frames are pulled from the connection's decoder
//! one at a time: every poll on the body sends a read request to a pump
//! running next to the handler, the pump decodes exactly one payload item and
//! hands it back. Whatever the handler leaves unread is drained afterwards so
//! keep-alive connections stay in sync.

mod body_channel;

pub(crate) use body_channel::body_channel;

use body_channel::BodyReceiver;
use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::protocol::ParseError;

/// The body of a request as seen by a handler.
///
/// Bodies read from a connection are streamed; bodies built in memory with
/// [`ReqBody::empty`] or [`ReqBody::full`] are mostly useful in tests and
/// when a handler is invoked without a socket.
#[derive(Debug)]
pub struct ReqBody {
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    Full(Option<Bytes>),
    Channel(BodyReceiver),
}

impl ReqBody {
    pub fn empty() -> Self {
        Self { kind: Kind::Full(None) }
    }

    pub fn full(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() { Self::empty() } else { Self { kind: Kind::Full(Some(bytes)) } }
    }

    pub(crate) fn streaming(receiver: BodyReceiver) -> Self {
        Self { kind: Kind::Channel(receiver) }
    }
}

impl From<Bytes> for ReqBody {
    fn from(bytes: Bytes) -> Self {
        Self::full(bytes)
    }
}

impl From<&'static str> for ReqBody {
    fn from(value: &'static str) -> Self {
        Self::full(value)
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Full(bytes) => Poll::Ready(bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Channel(receiver) => receiver.poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Full(bytes) => bytes.is_none(),
            Kind::Channel(receiver) => receiver.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Full(None) => SizeHint::with_exact(0),
            Kind::Full(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Channel(receiver) => receiver.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn check_send<T: Send>() {}

    #[test]
    fn is_send() {
        check_send::<ReqBody>();
    }

    #[tokio::test]
    async fn full_body_yields_once() {
        let mut body = ReqBody::full("hi");
        assert_eq!(body.size_hint().exact(), Some(2));
        assert!(!body.is_end_stream());

        let bytes = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(&bytes[..], b"hi");
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn empty_body_is_finished() {
        let body = ReqBody::full(Bytes::new());
        assert!(body.is_end_stream());
        assert_eq!(body.collect().await.unwrap().to_bytes(), Bytes::new());
    }
}
