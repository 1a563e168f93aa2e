//! Wire constants of the serialized-object stream format.
//!
//! Every serialized stream opens with a fixed magic/version pair and then
//! carries a sequence of tagged records:
//!
//! ```text
//! ┌────────┬─────────┬─────────────────────────────────────┐
//! │ Offset │ Size    │ Description                         │
//! ├────────┼─────────┼─────────────────────────────────────┤
//! │ 0x00   │ 2 bytes │ Magic: 0xACED                       │
//! │ 0x02   │ 2 bytes │ Version: 0x0005                     │
//! │ 0x04   │ ...     │ Tagged records (TC_* codes below)   │
//! └────────┴─────────┴─────────────────────────────────────┘
//! ```
//!
//! All multi-byte integers are big-endian, two's complement.

/// First two bytes of every serialized stream.
pub const STREAM_MAGIC: u16 = 0xACED;

/// Stream format version, immediately after the magic.
pub const STREAM_VERSION: u16 = 0x0005;

/// Lowest assigned tag code. Tags outside `TC_BASE..=TC_MAX` are invalid.
pub const TC_BASE: u8 = 0x70;

/// Null object reference.
pub const TC_NULL: u8 = 0x70;

/// Back-reference to an object already written to the stream.
pub const TC_REFERENCE: u8 = 0x71;

/// Class descriptor.
pub const TC_CLASSDESC: u8 = 0x72;

/// New object.
pub const TC_OBJECT: u8 = 0x73;

/// String with an unsigned 16-bit length prefix.
pub const TC_STRING: u8 = 0x74;

/// New array.
pub const TC_ARRAY: u8 = 0x75;

/// Reference to a class.
pub const TC_CLASS: u8 = 0x76;

/// Block data with an unsigned 8-bit length prefix.
pub const TC_BLOCKDATA: u8 = 0x77;

/// End of optional block data for an object.
pub const TC_ENDBLOCKDATA: u8 = 0x78;

/// Writer-side handle-table reset. May appear between data blocks.
pub const TC_RESET: u8 = 0x79;

/// Block data with a signed 32-bit length prefix.
pub const TC_BLOCKDATALONG: u8 = 0x7A;

/// Exception during write.
pub const TC_EXCEPTION: u8 = 0x7B;

/// String with a signed 64-bit length prefix.
pub const TC_LONGSTRING: u8 = 0x7C;

/// Proxy class descriptor: interface list plus a regular descriptor tail.
pub const TC_PROXYCLASSDESC: u8 = 0x7D;

/// Enum constant.
pub const TC_ENUM: u8 = 0x7E;

/// Highest assigned tag code.
pub const TC_MAX: u8 = 0x7E;

/// Wire value of the first handle a writer assigns. Handle indexes are
/// offsets from this value.
pub const BASE_WIRE_HANDLE: i32 = 0x007E_0000;

/// Descriptor flag: the class defines its own write method.
pub const SC_WRITE_METHOD: u8 = 0x01;

/// Descriptor flag: the class is serializable.
pub const SC_SERIALIZABLE: u8 = 0x02;

/// Descriptor flag: the class is externalizable.
pub const SC_EXTERNALIZABLE: u8 = 0x04;

/// Descriptor flag: externalizable data is written in block-data form.
pub const SC_BLOCK_DATA: u8 = 0x08;

/// Descriptor flag: the class is an enum type.
pub const SC_ENUM: u8 = 0x10;

/// Largest payload of a single block-data frame.
pub const MAX_BLOCK_SIZE: usize = 1024;

/// Largest block-data framing header: tag byte plus a 4-byte length.
pub const MAX_HEADER_SIZE: usize = 5;
