//! Per-connection request processing.
//!
//! [`HttpConnection`] reads requests off a byte stream one after the other,
//! hands each to a [`Handler`](crate::handler::Handler) and writes the
//! response back before reading the next one.

mod http_connection;

pub use http_connection::HttpConnection;
