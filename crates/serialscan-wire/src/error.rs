/// Errors produced by the wire-level readers.
///
/// ```text
///   WireError
///   ├── UnexpectedEof     ← input ran out mid-element
///   ├── MalformedUtf      ← string body fails modified-UTF-8 decoding
///   ├── BadBlockLength    ← negative long block-data length
///   ├── InvalidTypeCode   ← tag outside the assigned TC_* range
///   ├── UnreadBlockData   ← left block mode with buffered bytes unconsumed
///   ├── NotInBlockMode    ← block-mode-only operation called in raw mode
///   └── Io                ← from the underlying byte source
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The byte source ended before a complete element could be read.
    ///
    /// `offset` is the number of bytes consumed from the source when the
    /// shortfall was observed.
    #[error("unexpected end of stream at offset {offset}")]
    UnexpectedEof { offset: u64 },

    /// A string body failed modified-UTF-8 decoding.
    ///
    /// The reader consumes the full declared body before decoding, so the
    /// cursor is positioned exactly past the body when this is returned.
    /// `offset` is the index of the offending byte within the body.
    #[error("malformed modified UTF-8 at byte {offset} of string body")]
    MalformedUtf { offset: usize },

    /// A long block-data header declared a negative length.
    #[error("illegal block data header length: {len}")]
    BadBlockLength { len: i32 },

    /// A tag code outside the assigned range appeared where block framing
    /// was expected.
    #[error("invalid type code: {code:02X}")]
    InvalidTypeCode { code: u8 },

    /// Block data mode was switched off while unconsumed block bytes were
    /// still buffered. This is a caller bug, not a stream defect.
    #[error("cannot leave block data mode with unread block data")]
    UnreadBlockData,

    /// A block-mode-only operation was invoked in raw mode.
    #[error("not in block data mode")]
    NotInBlockMode,

    /// An I/O error from the underlying byte source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
