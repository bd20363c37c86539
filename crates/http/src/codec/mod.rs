//! Wire codecs for `tokio_util::codec::{FramedRead, FramedWrite}`.
//!
//! [`RequestDecoder`] turns bytes into a request head followed by payload
//! items; [`ResponseEncoder`] does the reverse for responses. The [`header`]
//! and [`body`] modules hold the pieces they are built from.

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use header::{MAX_HEADER_BYTES, MAX_HEADER_NUM};
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
