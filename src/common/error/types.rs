//! Error taxonomy for EMF+ decoding.
//!
//! Decoding is fail-fast: any of these aborts the current metafile. The only
//! tolerated irregularity, a well-framed record of an unknown type, is not an
//! error at all and is captured verbatim instead.
use thiserror::Error;

/// Main error type for EMF+ decoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Truncated input, declared-vs-consumed byte mismatch, or a value that
    /// breaks the record layout (including a singular transform basis).
    #[error("Malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },

    /// A type code that must name a known kind does not.
    #[error("Unsupported {kind} type 0x{code:08X} at offset {offset}")]
    UnsupportedObjectType {
        offset: usize,
        kind: &'static str,
        code: u32,
    },

    /// Mutually exclusive optional-field bits are both set.
    #[error("Invalid flag combination 0x{flags:08X} at offset {offset}: {reason}")]
    InvalidFlagCombination {
        offset: usize,
        flags: u32,
        reason: &'static str,
    },

    /// A length read from the stream exceeds the configured ceiling.
    #[error("Allocation of {requested} exceeds ceiling {ceiling} at offset {offset}")]
    OversizedAllocation {
        offset: usize,
        requested: u64,
        ceiling: u64,
    },

    /// An object split across records was not completed.
    #[error("Incomplete continuation for object slot {slot} at offset {offset}: {reason}")]
    IncompleteContinuation {
        offset: usize,
        slot: u8,
        reason: String,
    },
}

impl Error {
    /// Shorthand for [`Error::MalformedRecord`].
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            offset,
            reason: reason.into(),
        }
    }

    /// Absolute byte offset at which the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            Error::MalformedRecord { offset, .. }
            | Error::UnsupportedObjectType { offset, .. }
            | Error::InvalidFlagCombination { offset, .. }
            | Error::OversizedAllocation { offset, .. }
            | Error::IncompleteContinuation { offset, .. } => *offset,
        }
    }
}

/// Result type for EMF+ operations.
pub type Result<T> = std::result::Result<T, Error>;
