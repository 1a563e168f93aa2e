use serialscan_wire::WireError;

use crate::events::UnsafeReason;

/// Errors that can occur while scanning a serialized-object stream.
///
/// The scanner validates at two levels: wire structure (delegated to
/// [`WireError`]) and grammar/analysis rules. Two variants double as DoS
/// findings: the driver converts them into an unsafe verdict instead of
/// surfacing them.
///
/// ```text
///   ScanError
///   ├── Wire(WireError)       ← framing, UTF, EOF, block-mode violations
///   ├── BadStreamHeader       ← magic or version mismatch
///   ├── InvalidHandle         ← back-reference outside the handle table
///   ├── InvalidTypeCode       ← tag not valid at this grammar position
///   ├── ClassFlagConflict     ← serializable + externalizable both set
///   ├── EnumWithSuid          ← enum descriptor with non-zero suid
///   ├── EnumWithFields        ← enum descriptor with declared fields
///   ├── ArrayTooLarge         ← DoS finding (allocation ceiling)
///   └── ReferenceTooComplex   ← DoS finding (traversal budget)
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A wire-level failure from the framed reader.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The stream does not open with the expected magic and version.
    #[error("invalid stream header: {magic:04X}{version:04X}")]
    BadStreamHeader { magic: u16, version: u16 },

    /// A back-reference named a handle outside the table built so far.
    /// `handle` is the raw wire value.
    #[error("invalid handle value: {handle:08X}")]
    InvalidHandle { handle: i32 },

    /// A tag code that is not valid at the current grammar position.
    #[error("invalid type code: {code:02X}")]
    InvalidTypeCode { code: u8 },

    /// A descriptor set both the serializable and externalizable flags.
    #[error("class {name}: serializable and externalizable flags conflict")]
    ClassFlagConflict { name: String },

    /// An enum descriptor carried a non-zero serialVersionUID.
    #[error("enum descriptor {name} has non-zero serialVersionUID: {suid}")]
    EnumWithSuid { name: String, suid: i64 },

    /// An enum descriptor declared fields.
    #[error("enum descriptor {name} has non-zero field count: {num_fields}")]
    EnumWithFields { name: String, num_fields: i16 },

    /// The running sum of declared array lengths and proxy interface
    /// counts crossed the allocation ceiling.
    #[error("declared array sizes total {total}, over the allocation ceiling")]
    ArrayTooLarge { total: i64 },

    /// A reference-graph traversal crossed the edge budget.
    #[error("reference traversal from handle {start} crossed the edge budget at {count}")]
    ReferenceTooComplex { start: usize, count: u32 },
}

impl ScanError {
    /// True when the walk simply ran out of bytes mid-record. The driver
    /// downgrades this to a warning and still runs the graph analysis.
    #[must_use]
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::Wire(WireError::UnexpectedEof { .. }))
    }

    /// The verdict reason this error corresponds to, when it is one of the
    /// two DoS findings rather than a structural failure.
    #[must_use]
    pub fn unsafe_reason(&self) -> Option<UnsafeReason> {
        match self {
            Self::ArrayTooLarge { .. } => Some(UnsafeReason::ArrayTooLarge),
            Self::ReferenceTooComplex { .. } => Some(UnsafeReason::ReferenceTooComplex),
            _ => None,
        }
    }
}
