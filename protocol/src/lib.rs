//! Wire serialization primitives for the ITC token subsystem.
//!
//! The node's ambient wire format: little-endian fixed-width integers,
//! compact-size varints, and varint-length-prefixed UTF-8 strings. Every
//! structure that crosses the wire or the disk is built from these
//! primitives so that encoding is deterministic byte for byte.

pub mod codec;
pub mod error;

pub use codec::{ByteReader, ByteWriter};
pub use error::CodecError;
