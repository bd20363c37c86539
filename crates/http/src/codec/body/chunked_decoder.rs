//! `Transfer-Encoding: chunked` payload decoding (RFC 9112 section 7.1).
//!
//! Chunk extensions are accepted and ignored, trailer fields are read and
//! discarded.

use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, BytesMut};
use std::cmp;
use tokio_util::codec::Decoder;
use tracing::trace;

/// Longest size line or trailer line accepted
const MAX_LINE_BYTES: usize = 4 * 1024;

/// Hex digits of a chunk size that still fit in a `u64`
const MAX_SIZE_DIGITS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for `size [; ext] CRLF`
    SizeLine,
    /// Inside chunk data, with this many bytes left
    Data(u64),
    /// Expecting the CRLF that closes chunk data
    DataEnd,
    /// After the last chunk, reading trailer lines up to the empty one
    Trailers,
    /// The whole payload has been read
    Done,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: State::SizeLine }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                State::SizeLine => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    let size = parse_chunk_size(&line)?;
                    trace!(size, "read chunk size");
                    self.state = if size == 0 { State::Trailers } else { State::Data(size) };
                }

                State::Data(remaining) => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    let len = cmp::min(remaining, src.len() as u64);
                    #[allow(clippy::cast_possible_truncation, reason = "len is bounded by src.len()")]
                    let bytes = src.split_to(len as usize).freeze();

                    let remaining = remaining - len;
                    self.state = if remaining == 0 { State::DataEnd } else { State::Data(remaining) };
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                State::DataEnd => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    if &src[..2] != b"\r\n" {
                        return Err(ParseError::invalid_chunk("missing CRLF after chunk data"));
                    }
                    src.advance(2);
                    self.state = State::SizeLine;
                }

                State::Trailers => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        self.state = State::Done;
                    }
                }

                State::Done => return Ok(Some(PayloadItem::Eof)),
            }
        }
    }
}

/// Splits one CRLF-terminated line off the front of `src`, without the CRLF.
fn take_line(src: &mut BytesMut) -> Result<Option<BytesMut>, ParseError> {
    let Some(lf) = src.iter().position(|b| *b == b'\n') else {
        if src.len() > MAX_LINE_BYTES {
            return Err(ParseError::invalid_chunk("line too long"));
        }
        return Ok(None);
    };

    if lf == 0 || src[lf - 1] != b'\r' {
        return Err(ParseError::invalid_chunk("line not terminated by CRLF"));
    }
    if lf > MAX_LINE_BYTES {
        return Err(ParseError::invalid_chunk("line too long"));
    }

    let line = src.split_to(lf - 1);
    src.advance(2);
    Ok(Some(line))
}

fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let size = line.split(|b| *b == b';').next().unwrap_or_default();
    let size = size.trim_ascii_end();

    if size.is_empty() || size.len() > MAX_SIZE_DIGITS || !size.iter().all(u8::is_ascii_hexdigit) {
        return Err(ParseError::invalid_chunk("invalid chunk size"));
    }

    let size = std::str::from_utf8(size).map_err(|_e| ParseError::invalid_chunk("invalid chunk size"))?;
    u64::from_str_radix(size, 16).map_err(|_e| ParseError::invalid_chunk("invalid chunk size"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn decode_all(decoder: &mut ChunkedDecoder, buffer: &mut BytesMut) -> Result<(Vec<u8>, bool), ParseError> {
        let mut body = Vec::new();
        loop {
            match decoder.decode(buffer)? {
                Some(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
                Some(PayloadItem::Eof) => return Ok((body, true)),
                None => return Ok((body, false)),
            }
        }
    }

    #[test]
    fn single_chunk() {
        let mut buffer = BytesMut::from(&b"5\r\nhello\r\n0\r\n\r\nGET"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"hello"))));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
        // the next request stays untouched
        assert_eq!(&buffer[..], b"GET");
    }

    #[test]
    fn multiple_chunks() {
        let mut buffer = BytesMut::from(&b"3\r\nabc\r\nA\r\n0123456789\r\n0\r\n\r\n"[..]);
        let (body, eof) = decode_all(&mut ChunkedDecoder::new(), &mut buffer).unwrap();
        assert!(eof);
        assert_eq!(body, b"abc0123456789");
    }

    #[test]
    fn extensions_and_trailers() {
        let mut buffer = BytesMut::from(&b"4;name=value\r\nwiki\r\n0\r\nExpires: never\r\n\r\n"[..]);
        let (body, eof) = decode_all(&mut ChunkedDecoder::new(), &mut buffer).unwrap();
        assert!(eof);
        assert_eq!(body, b"wiki");
        assert!(buffer.is_empty());
    }

    #[test]
    fn split_across_reads() {
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"a\r\n01234"[..]);

        let (body, eof) = decode_all(&mut decoder, &mut buffer).unwrap();
        assert_eq!(body, b"01234");
        assert!(!eof);

        buffer.extend_from_slice(b"56789\r");
        let (body, eof) = decode_all(&mut decoder, &mut buffer).unwrap();
        assert_eq!(body, b"56789");
        assert!(!eof);

        buffer.extend_from_slice(b"\n0\r\n\r\n");
        let (body, eof) = decode_all(&mut decoder, &mut buffer).unwrap();
        assert!(body.is_empty());
        assert!(eof);
    }

    #[test]
    fn invalid_size() {
        let mut buffer = BytesMut::from(&b"xyz\r\n"[..]);
        assert!(matches!(ChunkedDecoder::new().decode(&mut buffer), Err(ParseError::InvalidChunk { .. })));

        let mut buffer = BytesMut::from(&b"+5\r\nhello\r\n"[..]);
        assert!(matches!(ChunkedDecoder::new().decode(&mut buffer), Err(ParseError::InvalidChunk { .. })));
    }

    #[test]
    fn size_overflow() {
        let mut buffer = BytesMut::from(&b"1ffffffffffffffff\r\n"[..]);
        assert!(matches!(ChunkedDecoder::new().decode(&mut buffer), Err(ParseError::InvalidChunk { .. })));
    }

    #[test]
    fn missing_crlf_after_data() {
        let mut buffer = BytesMut::from(&b"3\r\nabcXY0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();
        assert!(decoder.decode(&mut buffer).unwrap().is_some());
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::InvalidChunk { .. })));
    }

    #[test]
    fn bare_lf_rejected() {
        let mut buffer = BytesMut::from(&b"3\nabc\r\n"[..]);
        assert!(matches!(ChunkedDecoder::new().decode(&mut buffer), Err(ParseError::InvalidChunk { .. })));
    }
}
