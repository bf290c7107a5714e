#![doc = r#"
The chunk envelope.

A file is a sequence of chunks: a 4-byte ASCII id, a 4-byte big-endian
payload length, then exactly that many payload bytes. `MThd` and `MTrk`
are the two standard ids; everything else is either a caller-registered
custom chunk or an unknown one, handled per
[`UnknownChunkIdPolicy`](crate::settings::UnknownChunkIdPolicy).
"#]

use super::{Advisory, HeaderChunk, Track};
use crate::{
    ChunkError, WriteError, WriteResult,
    reader::{ReadError, ReadResult, Reader},
    settings::{NotEnoughBytesPolicy, ReadSettings, UnknownChunkIdPolicy, WriteSettings},
    writer::Writer,
};
use alloc::{borrow::Cow, boxed::Box, collections::BTreeMap, vec::Vec};
use core::fmt;

/// A four-byte ASCII chunk identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkId(pub(crate) [u8; 4]);

impl ChunkId {
    /// `MThd`, the header chunk id
    pub const HEADER: Self = Self(*b"MThd");
    /// `MTrk`, the track chunk id
    pub const TRACK: Self = Self(*b"MTrk");

    /// Create an id from its four bytes.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// The four id bytes.
    pub const fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{}", byte.escape_ascii())?;
        }
        Ok(())
    }
}

#[doc = r#"
A chunk type supplied by the caller for ids outside the standard two.

Registered through [`ChunkTypeRegistry`]; the registry maps an id to a
factory so decoding stays a table lookup, with no runtime type
inspection anywhere.

```
use smfio::prelude::*;
use std::borrow::Cow;

#[derive(Debug, Clone, Default)]
struct AuthorChunk(Vec<u8>);

impl CustomChunk for AuthorChunk {
    fn id(&self) -> ChunkId {
        ChunkId::new(*b"Auth")
    }
    fn read_payload(
        &mut self,
        reader: &mut Reader<'_>,
        length: u32,
        _settings: &ReadSettings,
    ) -> smfio::reader::ReadResult<()> {
        self.0 = reader.read_exact(length as usize)?.to_vec();
        Ok(())
    }
    fn payload(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }
    fn clone_box(&self) -> Box<dyn CustomChunk> {
        Box::new(self.clone())
    }
}

let mut settings = ReadSettings::default();
settings
    .custom_chunk_types
    .register(ChunkId::new(*b"Auth"), || Box::new(AuthorChunk::default()));
```
"#]
pub trait CustomChunk: fmt::Debug {
    /// The id this chunk is written under.
    fn id(&self) -> ChunkId;

    /// Decode a payload of `length` bytes.
    ///
    /// The cursor is positioned at the first payload byte; wherever
    /// this leaves it, the chunk layer re-seats it at the payload end
    /// so a misbehaving implementation cannot drift subsequent reads.
    fn read_payload(
        &mut self,
        reader: &mut Reader<'_>,
        length: u32,
        settings: &ReadSettings,
    ) -> ReadResult<()>;

    /// The payload bytes to write.
    fn payload(&self) -> Cow<'_, [u8]>;

    /// Clone into a fresh box, letting containers of chunks be
    /// cloned.
    fn clone_box(&self) -> Box<dyn CustomChunk>;
}

impl Clone for Box<dyn CustomChunk> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Creates a blank chunk ready to have its payload read.
pub type CustomChunkFactory = fn() -> Box<dyn CustomChunk>;

/// The id-to-factory table consulted for non-standard chunk ids.
///
/// The standard ids take priority: registering `MThd` or `MTrk` has no
/// effect.
#[derive(Debug, Clone, Default)]
pub struct ChunkTypeRegistry {
    types: BTreeMap<ChunkId, CustomChunkFactory>,
}

impl ChunkTypeRegistry {
    /// Bind a chunk id to a factory, replacing any previous binding.
    pub fn register(&mut self, id: ChunkId, factory: CustomChunkFactory) {
        self.types.insert(id, factory);
    }

    /// The factory bound to `id`, if any.
    pub fn get(&self, id: &ChunkId) -> Option<CustomChunkFactory> {
        self.types.get(id).copied()
    }
}

/// A chunk with an id this crate has no reading for, kept opaque so a
/// round-trip preserves it byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChunk<'a> {
    id: ChunkId,
    data: Cow<'a, [u8]>,
}

impl<'a> UnknownChunk<'a> {
    /// Create an unknown chunk from an id and raw payload.
    pub fn new(id: ChunkId, data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    /// The original chunk id.
    pub const fn id(&self) -> ChunkId {
        self.id
    }

    /// The raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copy any borrowed payload so the chunk can outlive its source
    /// buffer.
    pub fn into_owned(self) -> UnknownChunk<'static> {
        UnknownChunk {
            id: self.id,
            data: Cow::Owned(self.data.into_owned()),
        }
    }
}

/// A decoded top-level chunk.
#[derive(Debug, Clone)]
pub enum Chunk<'a> {
    /// The `MThd` header
    Header(HeaderChunk),
    /// An `MTrk` event sequence
    Track(Track<'a>),
    /// An unrecognized chunk kept opaque
    Unknown(UnknownChunk<'a>),
    /// A caller-registered chunk
    Custom(Box<dyn CustomChunk>),
}

impl Chunk<'_> {
    /// The id this chunk is written under.
    pub fn id(&self) -> ChunkId {
        match self {
            Self::Header(_) => ChunkId::HEADER,
            Self::Track(_) => ChunkId::TRACK,
            Self::Unknown(chunk) => chunk.id(),
            Self::Custom(chunk) => chunk.id(),
        }
    }

    /// Emit the chunk: id, payload length, payload.
    ///
    /// Lengths come from the size pre-pass, so nothing is encoded
    /// twice.
    pub fn write(&self, writer: &mut Writer, settings: &WriteSettings) -> WriteResult<()> {
        match self {
            Self::Header(header) => {
                writer.write_slice(&ChunkId::HEADER.bytes());
                writer.write_u32_be(6);
                header.write_payload(writer);
            }
            Self::Track(track) => {
                let length = track.payload_len(settings);
                let length =
                    u32::try_from(length).map_err(|_| WriteError::ChunkTooLong(length))?;
                writer.write_slice(&ChunkId::TRACK.bytes());
                writer.write_u32_be(length);
                track.write_payload(writer, settings)?;
            }
            Self::Unknown(chunk) => write_opaque(writer, chunk.id(), chunk.data())?,
            Self::Custom(chunk) => write_opaque(writer, chunk.id(), &chunk.payload())?,
        }
        Ok(())
    }
}

fn write_opaque(writer: &mut Writer, id: ChunkId, payload: &[u8]) -> WriteResult<()> {
    let length = u32::try_from(payload.len()).map_err(|_| WriteError::ChunkTooLong(payload.len()))?;
    writer.write_slice(&id.bytes());
    writer.write_u32_be(length);
    writer.write_slice(payload);
    Ok(())
}

/// Read the next chunk id, or `None` when the source has no more
/// chunks to offer.
///
/// A source with one to three bytes left is truncated mid-id; the
/// configured [`NotEnoughBytesPolicy`] decides whether that aborts the
/// read or counts as the end of the stream.
pub fn read_chunk_id(
    reader: &mut Reader<'_>,
    settings: &ReadSettings,
) -> ReadResult<Option<ChunkId>> {
    let remaining = reader.remaining();
    if remaining == 0 {
        return Ok(None);
    }
    if remaining < 4 {
        return match settings.not_enough_bytes_policy {
            NotEnoughBytesPolicy::Abort => Err(ReadError::not_enough_bytes(
                reader.buffer_position(),
                4,
                remaining,
            )),
            NotEnoughBytesPolicy::Ignore => Ok(None),
        };
    }
    reader.read_array::<4>().map(ChunkId).map(Some)
}

/// Read the next chunk, or `None` when the source has no more chunks
/// to offer.
///
/// Standard ids dispatch to their payload decoders; other ids consult
/// the registry, then the configured
/// [`UnknownChunkIdPolicy`](crate::settings::UnknownChunkIdPolicy).
/// Skipped chunks are consumed silently and the next chunk is
/// returned in their place, so the cursor never drifts off a chunk
/// boundary.
pub fn read_chunk<'a>(
    reader: &mut Reader<'a>,
    settings: &ReadSettings,
    advisories: &mut Vec<Advisory>,
) -> ReadResult<Option<Chunk<'a>>> {
    loop {
        let Some(id) = read_chunk_id(reader, settings)? else {
            return Ok(None);
        };

        if id == ChunkId::HEADER {
            let length = reader.read_u32_be()?;
            return HeaderChunk::read(reader, length)
                .map(Chunk::Header)
                .map(Some);
        }
        if id == ChunkId::TRACK {
            let length = reader.read_u32_be()?;
            return Track::read(reader, length, settings, advisories)
                .map(Chunk::Track)
                .map(Some);
        }
        if let Some(factory) = settings.custom_chunk_types.get(&id) {
            let length = reader.read_u32_be()?;
            if reader.remaining() < length as usize {
                return Err(ReadError::not_enough_bytes(
                    reader.buffer_position(),
                    length as usize,
                    reader.remaining(),
                ));
            }
            let payload_end = reader.buffer_position() + length as usize;
            let mut chunk = factory();
            chunk.read_payload(reader, length, settings)?;
            reader.set_position(payload_end);
            return Ok(Some(Chunk::Custom(chunk)));
        }

        match settings.unknown_chunk_id_policy {
            UnknownChunkIdPolicy::ReadAsUnknownChunk => {
                let length = reader.read_u32_be()?;
                let data = reader.read_exact(length as usize)?;
                return Ok(Some(Chunk::Unknown(UnknownChunk::new(id, data))));
            }
            UnknownChunkIdPolicy::Skip => {
                let length = reader.read_u32_be()?;
                reader.skip(length as usize)?;
                #[cfg(feature = "tracing")]
                tracing::debug!(id = %id, length, "skipping unregistered chunk");
            }
            UnknownChunkIdPolicy::Abort => {
                return Err(reader.parse_error(ChunkError::UnknownChunk(id)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ReadErrorKind;
    use pretty_assertions::assert_eq;

    // an unregistered chunk followed by a track-free header
    fn unknown_then_header() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"Xtra");
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE]);
        bytes.extend_from_slice(b"MThd");
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0xE0]);
        bytes
    }

    #[test]
    fn unknown_chunk_is_preserved() {
        let bytes = unknown_then_header();
        let mut reader = Reader::from_byte_slice(&bytes);
        let mut advisories = Vec::new();
        let settings = ReadSettings::default();

        let Some(Chunk::Unknown(chunk)) =
            read_chunk(&mut reader, &settings, &mut advisories).unwrap()
        else {
            panic!("expected an unknown chunk");
        };
        assert_eq!(chunk.id(), ChunkId::new(*b"Xtra"));
        assert_eq!(chunk.data(), &[0xDE, 0xAD, 0xBE]);

        // round-trip preserves the envelope byte for byte
        let mut writer = Writer::new();
        Chunk::Unknown(chunk)
            .write(&mut writer, &WriteSettings::default())
            .unwrap();
        assert_eq!(writer.as_slice(), &bytes[..11]);
    }

    #[test]
    fn skipped_chunk_lands_on_the_next_id() {
        let bytes = unknown_then_header();
        let mut reader = Reader::from_byte_slice(&bytes);
        let mut advisories = Vec::new();
        let settings = ReadSettings {
            unknown_chunk_id_policy: UnknownChunkIdPolicy::Skip,
            ..ReadSettings::default()
        };

        let Some(Chunk::Header(header)) =
            read_chunk(&mut reader, &settings, &mut advisories).unwrap()
        else {
            panic!("expected the header after the skipped chunk");
        };
        assert_eq!(header.declared_tracks(), 0);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn unknown_chunk_aborts_when_asked() {
        let bytes = unknown_then_header();
        let mut reader = Reader::from_byte_slice(&bytes);
        let mut advisories = Vec::new();
        let settings = ReadSettings {
            unknown_chunk_id_policy: UnknownChunkIdPolicy::Abort,
            ..ReadSettings::default()
        };

        let err = read_chunk(&mut reader, &settings, &mut advisories).unwrap_err();
        assert_eq!(
            err.kind(),
            &ReadErrorKind::Parse(ChunkError::UnknownChunk(ChunkId::new(*b"Xtra")).into())
        );
    }

    #[test]
    fn truncated_chunk_id_follows_policy() {
        let bytes = [0x4D, 0x54];

        let mut reader = Reader::from_byte_slice(&bytes);
        let err = read_chunk_id(&mut reader, &ReadSettings::default()).unwrap_err();
        assert!(err.is_not_enough_bytes());

        let mut reader = Reader::from_byte_slice(&bytes);
        let settings = ReadSettings {
            not_enough_bytes_policy: NotEnoughBytesPolicy::Ignore,
            ..ReadSettings::default()
        };
        assert_eq!(read_chunk_id(&mut reader, &settings).unwrap(), None);
    }

    #[test]
    fn chunk_id_displays_ascii() {
        use alloc::string::ToString;
        assert_eq!(ChunkId::HEADER.to_string(), "MThd");
    }
}
