//! Stream Packet Reader
//!
//! The protocol has no delimiter other than the length embedded in each
//! packet header, so packet boundaries have nothing to do with TCP segment
//! boundaries: a single receive may hold half a packet or several packets
//! back to back. The reader accumulates whatever the socket delivers and
//! hands back complete packets, one at a time, as soon as they exist.

use bytes::BytesMut;

use super::constants::*;
use super::types::{read_u32, Packet, ProtocolError};

/// Outcome of a [`PacketReader::next_packet`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPacket {
    /// A complete packet was split off the front of the buffer.
    Ready(Packet),
    /// Bytes are buffered but do not yet form a complete packet. Retry
    /// after the next append. The buffer is left untouched.
    Incomplete,
    /// Nothing is buffered.
    Empty,
}

/// Accumulates one direction of a connection's byte stream and extracts
/// complete packets from it.
///
/// Each reader owns its buffer exclusively; readers are never shared across
/// directions or connections. The buffer grows on [`append`] and shrinks by
/// exactly one packet's length on each successful [`next_packet`], keeping
/// any trailing bytes in order for the next round.
///
/// [`append`]: PacketReader::append
/// [`next_packet`]: PacketReader::next_packet
#[derive(Debug)]
pub struct PacketReader {
    buffer: BytesMut,
    max_packet_len: usize,
}

impl PacketReader {
    /// Create a reader with the documented protocol packet bound.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_PACKET_LEN)
    }

    /// Create a reader that rejects packets declaring more than
    /// `max_packet_len` bytes.
    ///
    /// Without the bound a corrupt or hostile length field would make the
    /// buffer wait, and grow, forever for bytes that never arrive.
    pub fn with_limit(max_packet_len: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_packet_len,
        }
    }

    /// Append received bytes to the buffer.
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Try to extract the next complete packet from the front of the buffer.
    ///
    /// Call in a loop until it reports [`NextPacket::Incomplete`] or
    /// [`NextPacket::Empty`]; a single append may have buffered any number
    /// of packets. An error means the length field itself is unusable and
    /// the stream cannot be resynchronized.
    pub fn next_packet(&mut self) -> Result<NextPacket, ProtocolError> {
        if self.buffer.is_empty() {
            return Ok(NextPacket::Empty);
        }
        if self.buffer.len() < HEADER_LEN {
            return Ok(NextPacket::Incomplete);
        }

        let declared = read_u32(&self.buffer, LENGTH_OFFSET) as usize;
        if declared > self.max_packet_len {
            return Err(ProtocolError::PacketTooLarge {
                declared,
                max: self.max_packet_len,
            });
        }
        if declared < HEADER_LEN {
            return Err(ProtocolError::InvalidLength { declared });
        }
        if self.buffer.len() < declared {
            return Ok(NextPacket::Incomplete);
        }

        let bytes = self.buffer.split_to(declared).freeze();
        Ok(NextPacket::Ready(Packet::new(bytes)))
    }
}

impl Default for PacketReader {
    fn default() -> Self {
        Self::new()
    }
}
