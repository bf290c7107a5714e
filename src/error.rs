use crate::file::ChunkId;
use thiserror::Error;

#[doc = r#"
Anything that can go wrong while interpreting bytes that were
successfully pulled off the underlying source.

Truncation is not a parse error; see
[`ReadErrorKind`](crate::reader::ReadErrorKind).
"#]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A value does not fit the bounded integer it was meant for
    #[error("value {value} does not fit in a {bits}-bit number")]
    OutOfRange {
        /// Bit width of the target type
        bits: u8,
        /// The offending value
        value: u16,
    },
    /// Event-level errors
    #[error("event: {0}")]
    Event(#[from] EventError),
    /// Chunk-level errors
    #[error("chunk: {0}")]
    Chunk(#[from] ChunkError),
    /// File-level errors
    #[error("file: {0}")]
    File(#[from] FileError),
}

/// An error produced while decoding or encoding a single event.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    /// A data byte appeared in status position before any status byte
    /// was established for the track.
    #[error("data byte in status position with no running status established")]
    MissingStatusByte,
    /// A channel event data byte has its high bit set and the
    /// configured policy is
    /// [`Abort`](crate::settings::InvalidChannelEventParameterValuePolicy::Abort).
    #[error("channel event data byte {value:#04x} is outside the 7-bit range")]
    InvalidParameterValue {
        /// The offending byte
        value: u8,
    },
    /// The status byte does not introduce any known event kind.
    #[error("status byte {0:#04x} does not introduce a known event")]
    InvalidStatusByte(u8),
    /// A value cannot be represented as a variable-length quantity
    /// (or a decoded one ran past the four-byte maximum).
    #[error("value {0} exceeds the variable-length-quantity range")]
    ValueTooLarge(u32),
}

/// An error produced while decoding a chunk envelope.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChunkError {
    /// The chunk id is not `MThd`, `MTrk`, or a registered custom id,
    /// and [`UnknownChunkIdPolicy::Abort`](crate::settings::UnknownChunkIdPolicy::Abort)
    /// is in effect.
    #[error("no reader registered for chunk id `{0}`")]
    UnknownChunk(ChunkId),
}

/// An error produced while assembling chunks into a file.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FileError {
    /// The first chunk of the stream is not a header chunk
    #[error("first chunk is not a header chunk")]
    NoHeaderChunk,
    /// More than one header chunk is present
    #[error("duplicate header chunk")]
    DuplicateHeader,
    /// The header declares a format other than 0, 1 or 2
    #[error("unknown file format {0}")]
    InvalidFormat(u16),
    /// The header's SMPTE frame-rate byte is not -24, -25, -29 or -30
    #[error("invalid smpte frame rate byte {0}")]
    InvalidSmpteFps(i8),
}

/// An error produced while encoding a file back into bytes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// Event-level encode failure
    #[error("event: {0}")]
    Event(#[from] EventError),
    /// A chunk payload does not fit the 4-byte big-endian length field
    #[error("chunk payload of {0} bytes exceeds the 4-byte length field")]
    ChunkTooLong(usize),
    /// A format 0 file was asked to carry more than one track
    #[error("format 0 file cannot carry {0} tracks")]
    MultipleTracksForSingleMultiChannel(usize),
}

/// The Write Result type (see [`WriteError`])
pub type WriteResult<T> = Result<T, WriteError>;
