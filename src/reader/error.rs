use crate::ParseError;
use thiserror::Error;

#[doc = r#"
A decode failure, stamped with the byte offset the cursor had reached
when it occurred.

The position doubles as a consumption report: everything before it was
consumed by the failing decode, so policy-driven callers know exactly
where to resume or bail.
"#]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("reading at position {position}: {kind}")]
pub struct ReadError {
    position: usize,
    kind: ReadErrorKind,
}

/// A kind of error a read can produce
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadErrorKind {
    /// The source ended in the middle of a field
    #[error("not enough bytes ({needed} needed, {available} available)")]
    NotEnoughBytes {
        /// Bytes the field required
        needed: usize,
        /// Bytes actually left in the source
        available: usize,
    },
    /// The bytes were there but did not parse
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl ReadError {
    /// Create a read error from a position and kind
    pub const fn new(position: usize, kind: ReadErrorKind) -> Self {
        Self { position, kind }
    }

    /// Create a truncation error
    pub const fn not_enough_bytes(position: usize, needed: usize, available: usize) -> Self {
        Self {
            position,
            kind: ReadErrorKind::NotEnoughBytes { needed, available },
        }
    }

    /// Create a parse error at a position
    pub fn parse(position: usize, error: impl Into<ParseError>) -> Self {
        Self {
            position,
            kind: ReadErrorKind::Parse(error.into()),
        }
    }

    /// The byte offset at which the read failed
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The error kind
    pub const fn kind(&self) -> &ReadErrorKind {
        &self.kind
    }

    /// True if the source ran out of bytes
    pub const fn is_not_enough_bytes(&self) -> bool {
        matches!(self.kind, ReadErrorKind::NotEnoughBytes { .. })
    }
}

/// The Read Result type (see [`ReadError`])
pub type ReadResult<T> = Result<T, ReadError>;
