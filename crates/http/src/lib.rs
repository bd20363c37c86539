//! The HTTP/1.1 transport behind `micro-fs`.
//!
//! A small server-side HTTP/1.1 implementation on top of tokio: requests are
//! decoded with `httparse`, request bodies are streamed to the handler as they
//! arrive, responses are framed with `Content-Length` or chunked encoding
//! depending on what the response body knows about its size.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use http_body_util::{BodyExt, Full};
//! use micro_fs_http::connection::HttpConnection;
//! use micro_fs_http::handler::make_handler;
//! use micro_fs_http::protocol::body::ReqBody;
//! use std::error::Error;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! async fn echo(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, Box<dyn Error + Send + Sync>> {
//!     let body = request.into_body().collect().await?.to_bytes();
//!     Ok(Response::new(Full::new(body)))
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8000").await?;
//!     let handler = Arc::new(make_handler(echo));
//!
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let handler = Arc::clone(&handler);
//!         tokio::spawn(async move {
//!             let (reader, writer) = stream.into_split();
//!             let _ = HttpConnection::new(reader, writer).process(handler).await;
//!         });
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! - [`connection`]: the per-connection request loop
//! - [`handler`]: the [`Handler`](handler::Handler) trait applications implement
//! - [`protocol`]: request/response types, payload framing and errors
//! - [`codec`]: the `tokio_util` decoder and encoder used by the connection
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 requests, HTTP/1.1 responses only
//! - no TLS
//! - request heads are limited to [`codec::MAX_HEADER_BYTES`] bytes and
//!   [`codec::MAX_HEADER_NUM`] headers
//! - response trailers are dropped

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
