//! BFBC2 Wire Protocol
//!
//! Framing and decoding for the length-prefixed remote admin protocol.

pub mod constants;
pub mod reader;
pub mod types;

pub use constants::*;
pub use reader::{NextPacket, PacketReader};
pub use types::{Message, Packet, ProtocolError};
