use std::error::Error;
use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::{CONNECTION, EXPECT};
use http::{HeaderValue, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Empty};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::body::{ReqBody, body_channel};
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize, RequestHeader, ResponseHead, SendError};

/// Read buffer reserved per connection
const READ_BUFFER_SIZE: usize = 8 * 1024;

const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

type ResponseMessage = Message<(ResponseHead, PayloadSize)>;

/// One client connection, split into its read and write halves.
///
/// Requests are served strictly in order. The connection stays open after a
/// response unless the request asked to close it, or it was HTTP/1.0 without
/// `keep-alive`, or its body could not be read to the end.
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), READ_BUFFER_SIZE),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    /// Serves requests until the peer goes away or the connection must close.
    ///
    /// Malformed requests are answered with `400 Bad Request` and end the
    /// connection with the parse error.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Header((header, payload_size)))) => {
                    if !self.serve(header, payload_size, handler.as_ref()).await? {
                        debug!("connection not kept alive, closing");
                        return Ok(());
                    }
                }

                Some(Ok(Message::Payload(_))) => {
                    error!("received a payload item where a request head was expected");
                    self.reject(StatusCode::BAD_REQUEST).await?;
                    return Err(ParseError::invalid_body("payload without request head").into());
                }

                Some(Err(e @ ParseError::Io { .. })) => {
                    info!(cause = %e, "connection read failed");
                    return Err(e.into());
                }

                Some(Err(e)) => {
                    warn!(cause = %e, "malformed request");
                    self.reject(StatusCode::BAD_REQUEST).await?;
                    return Err(e.into());
                }

                None => {
                    debug!("peer closed the connection");
                    return Ok(());
                }
            }
        }
    }

    /// Runs one request through the handler and writes its response.
    /// Returns whether the connection may serve another request.
    async fn serve<H>(&mut self, header: RequestHeader, payload_size: PayloadSize, handler: &H) -> Result<bool, HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        let keep_alive = header.keep_alive();

        if !payload_size.is_empty() && expects_continue(&header) {
            let writer = self.framed_write.get_mut();
            writer.write_all(CONTINUE).await.map_err(SendError::io)?;
            writer.flush().await.map_err(SendError::io)?;
            debug!("sent 100 continue");
        }

        let (receiver, mut pump) = body_channel(&mut self.framed_read, payload_size);
        let request = header.body(ReqBody::streaming(receiver));

        // the handler pulls its body through the pump, so both run together
        let response = {
            let call = handler.call(request);
            tokio::pin!(call);

            let mut pumping = true;
            loop {
                select! {
                    biased;
                    response = &mut call => break response,
                    pumped = pump.pump(), if pumping => {
                        pumping = false;
                        if let Err(e) = pumped {
                            warn!(cause = %e, "request body failed while the handler was reading it");
                        }
                    }
                }
            }
        };

        let drained = pump.drain().await;
        let keep_alive = keep_alive && drained.is_ok();

        let sent = match response {
            Ok(response) => self.send(response, keep_alive).await,
            Err(e) => {
                let e: Box<dyn Error + Send + Sync> = e.into();
                error!(cause = %e, "handler failed");
                self.send(bare_response(StatusCode::INTERNAL_SERVER_ERROR)?, keep_alive).await
            }
        };

        drained?;
        sent?;
        Ok(keep_alive)
    }

    /// Sends a bodiless response and asks the peer to close.
    async fn reject(&mut self, status: StatusCode) -> Result<(), HttpError> {
        self.send(bare_response(status)?, false).await
    }

    async fn send<T>(&mut self, response: Response<T>, keep_alive: bool) -> Result<(), HttpError>
    where
        T: Body<Data = Bytes> + Unpin,
        T::Error: Display,
    {
        let (mut parts, mut body) = response.into_parts();
        if !keep_alive {
            parts.headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }

        let payload_size = match body.size_hint().exact() {
            Some(length) => PayloadSize::new_length(length),
            None => PayloadSize::new_chunked(),
        };

        self.framed_write.feed(ResponseMessage::Header((ResponseHead::from_parts(parts, ()), payload_size))).await?;

        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|e| SendError::invalid_body(format!("response body failed: {e}")))?;
            // trailers are not sent
            if let Ok(data) = frame.into_data() {
                self.framed_write.feed(ResponseMessage::Payload(PayloadItem::Chunk(data))).await?;
            }
        }

        self.framed_write.feed(ResponseMessage::Payload(PayloadItem::Eof)).await?;
        SinkExt::<ResponseMessage>::flush(&mut self.framed_write).await?;
        Ok(())
    }
}

fn bare_response(status: StatusCode) -> Result<Response<Empty<Bytes>>, SendError> {
    Response::builder().status(status).body(Empty::new()).map_err(SendError::invalid_body)
}

fn expects_continue(header: &RequestHeader) -> bool {
    header.headers().get(EXPECT).is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"100-continue"))
}
