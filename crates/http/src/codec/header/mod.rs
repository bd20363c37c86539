//! Request head decoding and response head encoding.
//!
//! - [`HeaderDecoder`]: bytes → [`RequestHeader`](crate::protocol::RequestHeader) plus payload framing
//! - [`HeaderEncoder`]: [`ResponseHead`](crate::protocol::ResponseHead) plus payload framing → bytes

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_decoder::{MAX_HEADER_BYTES, MAX_HEADER_NUM};
pub use header_encoder::HeaderEncoder;
