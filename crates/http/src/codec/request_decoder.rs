//! Request decoding: one head, then the payload items that belong to it.

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Yields `Message::Header` for each request head and `Message::Payload` for
/// the body that follows it, ending with `PayloadItem::Eof`.
///
/// While a payload decoder is installed the decoder is between a head and
/// its `Eof`; otherwise it waits for the next head.
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { header_decoder: HeaderDecoder, payload_decoder: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHeader, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            if matches!(item, Some(PayloadItem::Eof)) {
                self.payload_decoder = None;
            }
            return Ok(item.map(Message::Payload));
        }

        let Some((header, payload_size)) = self.header_decoder.decode(src)? else {
            return Ok(None);
        };
        self.payload_decoder = Some(payload_size.into());
        Ok(Some(Message::Header((header, payload_size))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Method;

    #[test]
    fn pipelined_requests() {
        let mut buffer = BytesMut::from(&b"PUT /a HTTP/1.1\r\nContent-Length: 2\r\n\r\nhiGET /a HTTP/1.1\r\n\r\n"[..]);
        let mut decoder = RequestDecoder::new();

        let Some(Message::Header((header, payload_size))) = decoder.decode(&mut buffer).unwrap() else {
            panic!("expected a head");
        };
        assert_eq!(header.method(), &Method::PUT);
        assert_eq!(payload_size, PayloadSize::Length(2));

        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().into_payload_item(), Some(PayloadItem::Chunk(Bytes::from_static(b"hi"))));
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().into_payload_item(), Some(PayloadItem::Eof));

        let Some(Message::Header((header, payload_size))) = decoder.decode(&mut buffer).unwrap() else {
            panic!("expected a second head");
        };
        assert_eq!(header.method(), &Method::GET);
        assert!(payload_size.is_empty());
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().into_payload_item(), Some(PayloadItem::Eof));
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }
}
