//! Line framing for the IRC byte stream.
//!
//! [`LineCodec`] splits received bytes on `\n` (dropping an optional `\r`),
//! decodes each line with the configured text encoding and never buffers
//! more than one maximum-length line: anything longer is cut at the limit
//! and the rest of it skipped up to the next terminator.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};
use crate::message::Message;
use crate::session::MAX_IRC_LINE_LEN;

/// Codec between raw bytes and decoded lines / outgoing messages.
#[derive(Clone, Debug)]
pub struct LineCodec {
    encoding: &'static encoding::Encoding,
    max_len: usize,
    /// Bytes already searched for a terminator.
    next_index: usize,
    /// Skipping the tail of an overlong line.
    discarding: bool,
}

impl LineCodec {
    /// Codec for the encoding named by `label`, with the default length limit.
    pub fn new(label: &str) -> Result<Self> {
        let encoding = encoding::Encoding::for_label(label.as_bytes())
            .ok_or_else(|| ProtocolError::UnknownEncoding(label.to_string()))?;
        Ok(Self::with_encoding(encoding, MAX_IRC_LINE_LEN))
    }

    pub fn with_encoding(encoding: &'static encoding::Encoding, max_len: usize) -> Self {
        LineCodec {
            encoding,
            max_len,
            next_index: 0,
            discarding: false,
        }
    }

    pub fn encoding(&self) -> &'static encoding::Encoding {
        self.encoding
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn decode_line(&self, bytes: &[u8]) -> String {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        let bytes = &bytes[..bytes.len().min(self.max_len)];
        let (text, had_errors) = self.encoding.decode_without_bom_handling(bytes);
        if had_errors {
            debug!(encoding = self.encoding.name(), "replaced undecodable bytes");
        }
        text.into_owned()
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::with_encoding(encoding::UTF_8, MAX_IRC_LINE_LEN)
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        loop {
            // Room for the line, its `\r` and its `\n`.
            let window = if self.discarding {
                src.len()
            } else {
                src.len().min(self.max_len + 2)
            };
            let newline = src[self.next_index.min(window)..window]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| offset + self.next_index.min(window));

            match (self.discarding, newline) {
                (true, Some(pos)) => {
                    src.advance(pos + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    src.advance(window);
                    self.next_index = 0;
                    return Ok(None);
                }
                (false, Some(pos)) => {
                    let line = src.split_to(pos + 1);
                    self.next_index = 0;
                    return Ok(Some(self.decode_line(&line[..pos])));
                }
                (false, None) if window >= self.max_len + 2 => {
                    let line = src.split_to(self.max_len);
                    self.discarding = true;
                    self.next_index = 0;
                    warn!(limit = self.max_len, "truncating overlong line");
                    return Ok(Some(self.decode_line(&line)));
                }
                (false, None) => {
                    self.next_index = window;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if self.discarding || src.is_empty() {
            self.discarding = false;
            src.clear();
            return Ok(None);
        }
        let line = src.split_to(src.len());
        Ok(Some(self.decode_line(&line)))
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<()> {
        let line: String = message
            .to_string()
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n' | '\0'))
            .collect();
        let (bytes, _, _) = self.encoding.encode(&line);
        dst.reserve(bytes.len() + 2);
        dst.put_slice(&bytes);
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<String> {
        std::iter::from_fn(|| codec.decode(buf).unwrap()).collect()
    }

    #[test]
    fn test_splits_crlf_and_lf() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from(&b"PING :a\r\nPING :b\nPING :c"[..]);
        assert_eq!(decode_all(&mut codec, &mut buf), vec!["PING :a", "PING :b"]);
        assert_eq!(&buf[..], b"PING :c");
    }

    #[test]
    fn test_partial_line_across_reads() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from(&b":srv 001 me :Wel"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"come\r");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some(":srv 001 me :Welcome")
        );
    }

    #[test]
    fn test_overlong_line_is_truncated() {
        let mut codec = LineCodec::with_encoding(encoding::UTF_8, 16);
        let mut buf = BytesMut::from(&b"0123456789abcdefXXXXXXXX"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("0123456789abcdef")
        );
        buf.extend_from_slice(b"YYYY\r\nPING :ok\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :ok"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_line_at_limit_is_kept_whole() {
        let mut codec = LineCodec::with_encoding(encoding::UTF_8, 8);
        let mut buf = BytesMut::from(&b"12345678\r\nnext\r\n"[..]);
        assert_eq!(decode_all(&mut codec, &mut buf), vec!["12345678", "next"]);
    }

    #[test]
    fn test_decodes_configured_encoding() {
        let mut codec = LineCodec::new("latin1").unwrap();
        let mut buf = BytesMut::from(&b"caf\xe9\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("caf\u{e9}"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from(&b"bad \xff byte\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("bad \u{fffd} byte")
        );
    }

    #[test]
    fn test_eof_yields_trailing_fragment() {
        let mut codec = LineCodec::default();
        let mut buf = BytesMut::from(&b"PING :a\r\nERROR :bye"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("PING :a"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("ERROR :bye"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            LineCodec::new("klingon"),
            Err(ProtocolError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_encoder_terminates_and_strips() {
        let mut codec = LineCodec::default();
        let mut dst = BytesMut::new();
        codec
            .encode(Message::new("PRIVMSG", ["#rust", "hi\r\nQUIT"]), &mut dst)
            .unwrap();
        assert_eq!(&dst[..], b"PRIVMSG #rust hiQUIT\r\n");
    }
}
