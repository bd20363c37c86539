use bytes::{Bytes, BytesMut};
use criterion::{Criterion, criterion_group, criterion_main};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use micro_fs_http::codec::{RequestDecoder, ResponseEncoder};
use micro_fs_http::connection::HttpConnection;
use micro_fs_http::handler::make_handler;
use micro_fs_http::protocol::body::ReqBody;
use micro_fs_http::protocol::{Message, PayloadItem, PayloadSize, ResponseHead};
use std::error::Error;
use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::codec::{Decoder, Encoder};

/// Serves canned request bytes and swallows everything written.
struct MockIO {
    input: Bytes,
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let amt = self.input.len().min(buf.remaining());
        let chunk = self.input.split_to(amt);
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIO {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

async fn store(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, Box<dyn Error + Send + Sync>> {
    let body = request.into_body().collect().await?.to_bytes();
    Ok(Response::builder().status(StatusCode::NO_CONTENT).body(Full::new(body))?)
}

fn put_request(body_len: usize) -> Vec<u8> {
    let mut request = format!("PUT /data/file.bin HTTP/1.1\r\nHost: localhost\r\nContent-Length: {body_len}\r\n\r\n").into_bytes();
    request.resize(request.len() + body_len, b'x');
    request
}

fn bench_request_decoder(c: &mut Criterion) {
    let request = put_request(4096);

    c.bench_function("decode_put_request", |b| {
        b.iter(|| {
            let mut decoder = RequestDecoder::new();
            let mut bytes = BytesMut::from(&request[..]);
            while let Some(message) = decoder.decode(&mut bytes).unwrap() {
                if matches!(message, Message::Payload(PayloadItem::Eof)) {
                    break;
                }
                black_box(message);
            }
        });
    });
}

fn bench_response_encoder(c: &mut Criterion) {
    let body = Bytes::from(vec![b'x'; 4096]);

    c.bench_function("encode_chunked_response", |b| {
        b.iter(|| {
            let mut encoder = ResponseEncoder::new();
            let mut dst = BytesMut::new();
            let head: ResponseHead = Response::builder().status(StatusCode::OK).body(()).unwrap();

            encoder.encode(Message::<_, Bytes>::Header((head, PayloadSize::Chunked)), &mut dst).unwrap();
            encoder.encode(Message::<(ResponseHead, PayloadSize), _>::Payload(PayloadItem::Chunk(body.clone())), &mut dst).unwrap();
            encoder.encode(Message::<(ResponseHead, PayloadSize), Bytes>::Payload(PayloadItem::Eof), &mut dst).unwrap();
            black_box(dst);
        });
    });
}

fn bench_connection(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let handler = Arc::new(make_handler(store));
    let request = Bytes::from(put_request(64 * 1024));

    c.bench_function("serve_put_request", |b| {
        b.to_async(&runtime).iter(|| {
            let handler = Arc::clone(&handler);
            let reader = MockIO { input: request.clone() };
            let writer = MockIO { input: Bytes::new() };
            async move {
                HttpConnection::new(reader, writer).process(handler).await.unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_request_decoder, bench_response_encoder, bench_connection);
criterion_main!(benches);
