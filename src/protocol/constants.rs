//! Protocol Constants

/// Size of the fixed packet header in bytes.
pub const HEADER_LEN: usize = 12;

/// Byte offset of the little-endian total packet length within the header.
///
/// The length counts the header itself, so a complete packet occupies
/// exactly this many bytes on the wire.
pub const LENGTH_OFFSET: usize = 4;

/// Byte offset of the little-endian word count within the header.
pub const WORD_COUNT_OFFSET: usize = 8;

/// Bit in the first header field marking a packet sent by the game server.
pub const ORIGIN_FLAG: u32 = 0x8000_0000;

/// Bit in the first header field marking a response rather than a query.
pub const RESPONSE_FLAG: u32 = 0x4000_0000;

/// Mask selecting the sequence number from the first header field.
pub const SEQUENCE_MASK: u32 = 0x3FFF_FFFF;

/// Largest packet the game server is documented to emit. Anything claiming
/// to be bigger is treated as stream corruption.
pub const DEFAULT_MAX_PACKET_LEN: usize = 16384;
