//! Payload framing.
//!
//! Requests are decoded by [`PayloadDecoder`], responses encoded by
//! [`PayloadEncoder`]. Both pick `Content-Length` or chunked framing from the
//! [`PayloadSize`](crate::protocol::PayloadSize) the head announced.

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
