use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};
use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, Stream, StreamExt};
use http_body::{Frame, SizeHint};
use std::task::{Context, Poll};
use tracing::{error, info};

/// Creates the two halves of a request body: the receiver handed to the
/// handler and the pump that feeds it from the connection's payload stream.
pub(crate) fn body_channel<S>(payload_stream: &mut S, payload_size: PayloadSize) -> (BodyReceiver, BodyPump<'_, S>)
where
    S: Stream<Item = Result<Message<(RequestHeader, PayloadSize)>, ParseError>> + Unpin,
{
    // capacity 0 still leaves one slot per sender: at most one item in flight
    let (signal_sender, signal_receiver) = mpsc::channel(0);
    let (data_sender, data_receiver) = mpsc::channel(0);

    let receiver = BodyReceiver { signal_sender, data_receiver, payload_size, in_flight: false, finished: payload_size.is_empty() };
    let pump = BodyPump { payload_stream, signal_receiver, data_sender, eof: false, broken: false };
    (receiver, pump)
}

/// Producer side: reads payload items from the decoder only when the
/// receiver asks for one.
pub(crate) struct BodyPump<'conn, S> {
    payload_stream: &'conn mut S,
    signal_receiver: mpsc::Receiver<()>,
    data_sender: mpsc::Sender<Result<PayloadItem, ParseError>>,
    eof: bool,
    broken: bool,
}

impl<S> BodyPump<'_, S>
where
    S: Stream<Item = Result<Message<(RequestHeader, PayloadSize)>, ParseError>> + Unpin,
{
    /// Serves read requests until the payload ends or the receiver is dropped.
    pub(crate) async fn pump(&mut self) -> Result<(), ParseError> {
        while !self.eof {
            if self.signal_receiver.next().await.is_none() {
                // the handler dropped the body, the rest is drained later
                return Ok(());
            }

            match self.read_item().await {
                Ok(payload_item) => {
                    self.eof = payload_item.is_eof();
                    if self.data_sender.send(Ok(payload_item)).await.is_err() {
                        return Ok(());
                    }
                }
                Err(e) => {
                    error!(cause = %e, "failed to read request body");
                    self.broken = true;
                    let forwarded = ParseError::invalid_body(&e);
                    if self.data_sender.send(Err(forwarded)).await.is_err() {
                        error!("request body receiver is gone, can't forward the error");
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Discards whatever the handler left unread so the next request on the
    /// connection starts at a message boundary.
    pub(crate) async fn drain(&mut self) -> Result<(), ParseError> {
        if self.broken {
            return Err(ParseError::invalid_body("request body is broken, connection can't be reused"));
        }

        let mut skipped: usize = 0;
        while !self.eof {
            match self.read_item().await? {
                PayloadItem::Chunk(bytes) => skipped += bytes.len(),
                PayloadItem::Eof => self.eof = true,
            }
        }

        if skipped > 0 {
            info!(size = skipped, "skipped unread request body");
        }
        Ok(())
    }

    async fn read_item(&mut self) -> Result<PayloadItem, ParseError> {
        match self.payload_stream.next().await {
            Some(Ok(Message::Payload(payload_item))) => Ok(payload_item),
            Some(Ok(Message::Header(_))) => Err(ParseError::invalid_body("received request header while reading body")),
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEof),
        }
    }
}

/// Consumer side of the channel, polled through [`ReqBody`](super::ReqBody).
#[derive(Debug)]
pub(crate) struct BodyReceiver {
    signal_sender: mpsc::Sender<()>,
    data_receiver: mpsc::Receiver<Result<PayloadItem, ParseError>>,
    payload_size: PayloadSize,
    in_flight: bool,
    finished: bool,
}

impl BodyReceiver {
    pub(crate) fn poll_frame(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, ParseError>>> {
        if self.finished {
            return Poll::Ready(None);
        }

        if !self.in_flight {
            match self.signal_sender.poll_ready(cx) {
                Poll::Ready(Ok(())) => {
                    if let Err(e) = self.signal_sender.start_send(()) {
                        self.finished = true;
                        return Poll::Ready(Some(Err(ParseError::invalid_body(e))));
                    }
                    self.in_flight = true;
                }
                Poll::Ready(Err(e)) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(ParseError::invalid_body(e))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }

        let polled = match self.data_receiver.poll_next_unpin(cx) {
            Poll::Ready(polled) => polled,
            Poll::Pending => return Poll::Pending,
        };

        self.in_flight = false;
        match polled {
            Some(Ok(PayloadItem::Chunk(bytes))) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Some(Ok(PayloadItem::Eof)) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Some(Err(e)) => {
                self.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            None => {
                self.finished = true;
                Poll::Ready(Some(Err(ParseError::UnexpectedEof)))
            }
        }
    }

    pub(crate) fn is_end_stream(&self) -> bool {
        self.finished
    }

    pub(crate) fn size_hint(&self) -> SizeHint {
        match self.payload_size {
            PayloadSize::Length(length) => SizeHint::with_exact(length),
            PayloadSize::Chunked => SizeHint::new(),
            PayloadSize::Empty => SizeHint::with_exact(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;
    use futures::FutureExt;

    fn receiver() -> (BodyReceiver, mpsc::Receiver<()>, mpsc::Sender<Result<PayloadItem, ParseError>>) {
        let (signal_sender, signal_receiver) = mpsc::channel(0);
        let (data_sender, data_receiver) = mpsc::channel(0);
        let receiver = BodyReceiver { signal_sender, data_receiver, payload_size: PayloadSize::Chunked, in_flight: false, finished: false };
        (receiver, signal_receiver, data_sender)
    }

    #[tokio::test]
    async fn asks_once_per_item() {
        let (mut body, mut signals, mut data) = receiver();
        let mut cx = Context::from_waker(noop_waker_ref());

        assert!(body.poll_frame(&mut cx).is_pending());
        assert!(signals.next().await.is_some());

        // still waiting on the same item, no second request
        assert!(body.poll_frame(&mut cx).is_pending());
        assert!(signals.next().now_or_never().is_none());

        data.try_send(Ok(PayloadItem::Chunk(Bytes::from_static(b"hello")))).unwrap();
        match body.poll_frame(&mut cx) {
            Poll::Ready(Some(Ok(frame))) => assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"hello")),
            other => panic!("unexpected poll result: {other:?}"),
        }

        assert!(body.poll_frame(&mut cx).is_pending());
        assert!(signals.next().await.is_some());
        data.try_send(Ok(PayloadItem::Eof)).unwrap();

        assert!(matches!(body.poll_frame(&mut cx), Poll::Ready(None)));
        assert!(body.is_end_stream());
        assert!(matches!(body.poll_frame(&mut cx), Poll::Ready(None)));
    }

    #[tokio::test]
    async fn pump_closed_mid_body_is_an_error() {
        let (mut body, mut signals, data) = receiver();
        let mut cx = Context::from_waker(noop_waker_ref());

        assert!(body.poll_frame(&mut cx).is_pending());
        assert!(signals.next().await.is_some());
        drop(data);

        assert!(matches!(body.poll_frame(&mut cx), Poll::Ready(Some(Err(ParseError::UnexpectedEof)))));
        assert!(matches!(body.poll_frame(&mut cx), Poll::Ready(None)));
    }

    #[tokio::test]
    async fn pump_feeds_and_drains() {
        let items: Vec<Result<Message<(RequestHeader, PayloadSize)>, ParseError>> = vec![
            Ok(Message::Payload(PayloadItem::Chunk(Bytes::from_static(b"ab")))),
            Ok(Message::Payload(PayloadItem::Chunk(Bytes::from_static(b"cd")))),
            Ok(Message::Payload(PayloadItem::Eof)),
        ];
        let mut stream = futures::stream::iter(items);

        let (mut body, mut pump) = body_channel(&mut stream, PayloadSize::Chunked);

        let read_one = async {
            let frame = std::future::poll_fn(|cx| body.poll_frame(cx)).await;
            drop(body);
            frame
        };
        let (frame, pumped) = futures::join!(read_one, pump.pump());

        assert_eq!(frame.unwrap().unwrap().into_data().unwrap(), Bytes::from_static(b"ab"));
        assert!(pumped.is_ok());

        // the unread chunk and the eof are skipped
        assert!(pump.drain().await.is_ok());
        assert!(stream.next().await.is_none());
    }
}
