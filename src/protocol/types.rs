//! Packet and Message Types

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

use super::constants::*;

/// Errors raised by the framing and decoding layer.
///
/// Unlike an incomplete buffer, which is steady-state and retried, any of
/// these means the stream can no longer be trusted and the connection
/// carrying it should be dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The declared packet length exceeds the configured bound.
    #[error("declared packet length {declared} exceeds the {max} byte limit")]
    PacketTooLarge { declared: usize, max: usize },

    /// The declared packet length is smaller than the fixed 12 byte header.
    #[error("declared packet length {declared} is smaller than the packet header")]
    InvalidLength { declared: usize },

    /// The packet body ended before its declared words did.
    #[error("packet truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
}

/// Decode a little-endian u32 at `offset`. Caller guarantees the bounds.
pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

/// One complete packet lifted off the wire, header included.
///
/// A `Packet` holds exactly the bytes the peer sent, so decoding works on a
/// copy and never touches the forwarded stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    bytes: Bytes,
}

impl Packet {
    pub(crate) fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// Raw wire bytes of this packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total length in bytes, header included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Interpret the packet as a protocol message.
    ///
    /// The first header field carries the origin and response flags in its
    /// top two bits and the sequence number in the rest. The third field is
    /// the word count; each word is a u32 length, the word bytes, and a NUL
    /// terminator. Word lengths are checked against the packet bounds, so a
    /// packet lying about its words fails with [`ProtocolError::Truncated`].
    pub fn decode(&self) -> Result<Message, ProtocolError> {
        let buf = self.as_bytes();
        if buf.len() < HEADER_LEN {
            return Err(ProtocolError::Truncated {
                needed: HEADER_LEN,
                available: buf.len(),
            });
        }

        let header = read_u32(buf, 0);
        let word_count = read_u32(buf, WORD_COUNT_OFFSET) as usize;

        let mut words = Vec::with_capacity(word_count.min(32));
        let mut offset = HEADER_LEN;
        for _ in 0..word_count {
            if buf.len() < offset + 4 {
                return Err(ProtocolError::Truncated {
                    needed: offset + 4,
                    available: buf.len(),
                });
            }
            let word_len = read_u32(buf, offset) as usize;
            // word bytes plus the NUL terminator
            let end = offset + 4 + word_len;
            if buf.len() < end + 1 {
                return Err(ProtocolError::Truncated {
                    needed: end + 1,
                    available: buf.len(),
                });
            }
            words.push(String::from_utf8_lossy(&buf[offset + 4..end]).into_owned());
            offset = end + 1;
        }

        Ok(Message {
            from_server: header & ORIGIN_FLAG != 0,
            response: header & RESPONSE_FLAG != 0,
            sequence: header & SEQUENCE_MASK,
            words,
        })
    }
}

/// A decoded protocol message.
///
/// Produced per packet and consumed immediately by formatting; nothing in
/// the relay keeps these around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// True when the packet was sent by the game server.
    pub from_server: bool,
    /// True for responses, false for queries.
    pub response: bool,
    pub sequence: u32,
    pub words: Vec<String>,
}

impl fmt::Display for Message {
    /// Render as a single human-readable line fragment: a two character
    /// origin/kind tag, the sequence number centered in ten columns, then
    /// each word quoted with a trailing space.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:^10}",
            if self.from_server { 's' } else { 'c' },
            if self.response { 'R' } else { 'Q' },
            self.sequence,
        )?;
        if !self.words.is_empty() {
            write!(f, " : ")?;
            for word in &self.words {
                write!(f, "\"{}\" ", word)?;
            }
        }
        Ok(())
    }
}
