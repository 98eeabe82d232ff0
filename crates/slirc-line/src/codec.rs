//! Tokio codecs for framing protocol lines.
//!
//! [`LineCodec`] frames CR-LF-terminated UTF-8 lines with a hard length
//! cap; [`MessageCodec`] layers message parsing and encoding on top. Bot
//! read loops typically frame with `LineCodec` and parse per line, so one
//! malformed line can be logged and skipped without tearing the stream
//! down. Every decode error here leaves the buffer positioned at the next
//! line; the stream stays usable after reporting it.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::Message;

/// Maximum length of one protocol line in bytes, terminator included.
pub const MAX_LINE_LEN: usize = 512;

/// A [`Decoder`]/[`Encoder`] for CR-LF-terminated UTF-8 lines.
#[derive(Debug, Clone)]
pub struct LineCodec {
    // Where to resume the newline scan, so partial reads are not rescanned.
    next_index: usize,
    max_length: usize,
    // Set after an unterminated over-length run; input is dropped until the
    // next newline.
    discarding: bool,
}

impl LineCodec {
    /// A codec with the standard 512-byte frame limit.
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LEN)
    }

    /// A codec with a custom frame limit.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length,
            discarding: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            if self.discarding {
                match buf.iter().position(|&b| b == b'\n') {
                    Some(offset) => {
                        buf.advance(offset + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        buf.clear();
                        return Ok(None);
                    }
                }
            }

            match buf[self.next_index..].iter().position(|&b| b == b'\n') {
                Some(offset) => {
                    let end = self.next_index + offset + 1;
                    self.next_index = 0;
                    if end > self.max_length {
                        buf.advance(end);
                        return Err(ProtocolError::LineTooLong {
                            actual: end,
                            limit: self.max_length,
                        });
                    }
                    let mut line = buf.split_to(end);
                    line.truncate(line.len() - 1);
                    if line.last() == Some(&b'\r') {
                        let stripped = line.len() - 1;
                        line.truncate(stripped);
                    }
                    return match std::str::from_utf8(&line) {
                        Ok(s) => Ok(Some(s.to_string())),
                        Err(e) => Err(ProtocolError::InvalidUtf8 {
                            byte_pos: e.valid_up_to(),
                            details: e.to_string(),
                        }),
                    };
                }
                None if buf.len() > self.max_length => {
                    let actual = buf.len();
                    buf.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Err(ProtocolError::LineTooLong {
                        actual,
                        limit: self.max_length,
                    });
                }
                None => {
                    self.next_index = buf.len();
                    return Ok(None);
                }
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// A codec for whole [`Message`] frames.
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    inner: LineCodec,
}

impl MessageCodec {
    /// A codec with the standard 512-byte frame limit.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Message>, ProtocolError> {
        match self.inner.decode(buf)? {
            Some(line) => Message::parse(&line)
                .map(Some)
                .map_err(|source| ProtocolError::Invalid { line, source }),
            None => Ok(None),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        self.inner.encode(sanitize(msg.to_string()), dst)
    }
}

/// Truncate at the first embedded line terminator so a crafted payload
/// cannot smuggle extra protocol lines into the stream, then clamp to the
/// frame limit on a character boundary.
fn sanitize(mut line: String) -> String {
    if let Some(pos) = line.find(['\r', '\n']) {
        line.truncate(pos);
    }
    let max = MAX_LINE_LEN - 2;
    if line.len() > max {
        let mut end = max;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        line.truncate(end);
    }
    line
}

// ============================================================================
// Tests
// ============================================================================
