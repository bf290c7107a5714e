#![doc = r#"
Reading and writing configuration.

A [`ReadSettings`] is a set of independent policies describing what to
do with malformed or unknown input, plus a registry of custom chunk
types. It is immutable for the duration of a decode call: policies are
consulted, never updated, as bytes are read.
"#]

use crate::file::ChunkTypeRegistry;

/// What to do when the source ends in the middle of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotEnoughBytesPolicy {
    /// Fail the whole read with a truncation error.
    #[default]
    Abort,
    /// Treat the truncation point as the end of the file and return
    /// what was read so far, tagged with
    /// [`Advisory::TruncatedStream`](crate::file::Advisory::TruncatedStream).
    Ignore,
}

/// What to do with a chunk id that is neither standard nor registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownChunkIdPolicy {
    /// Keep the chunk as an opaque [`UnknownChunk`](crate::file::UnknownChunk),
    /// preserving its id and payload for round-trips.
    #[default]
    ReadAsUnknownChunk,
    /// Consume the declared payload and move on to the next chunk.
    Skip,
    /// Fail the whole read with
    /// [`ChunkError::UnknownChunk`](crate::ChunkError::UnknownChunk).
    Abort,
}

/// What to do when a channel event data byte has its high bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidChannelEventParameterValuePolicy {
    /// Fail the whole read with
    /// [`EventError::InvalidParameterValue`](crate::EventError::InvalidParameterValue).
    #[default]
    Abort,
    /// Replace the value with the nearest legal one (127).
    SnapToLimits,
    /// Keep the low seven bits and continue.
    ReadValid,
}

/// Policies and extensions applied while decoding.
#[derive(Debug, Clone, Default)]
pub struct ReadSettings {
    /// Truncation handling, see [`NotEnoughBytesPolicy`]
    pub not_enough_bytes_policy: NotEnoughBytesPolicy,
    /// Unknown chunk id handling, see [`UnknownChunkIdPolicy`]
    pub unknown_chunk_id_policy: UnknownChunkIdPolicy,
    /// Out-of-range channel data handling, see
    /// [`InvalidChannelEventParameterValuePolicy`]
    pub invalid_channel_event_parameter_value_policy: InvalidChannelEventParameterValuePolicy,
    /// Caller-supplied chunk types, consulted for ids that are not
    /// `MThd` or `MTrk`
    pub custom_chunk_types: ChunkTypeRegistry,
}

/// Options applied while encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSettings {
    /// Omit the status byte of a channel event when it repeats the
    /// previous one (running-status compression). Enabled by default;
    /// disable for byte-exact reproduction of uncompressed sources.
    pub use_running_status: bool,
}

impl Default for WriteSettings {
    fn default() -> Self {
        Self {
            use_running_status: true,
        }
    }
}
