#![doc = r#"
File assembly: chunks in, [`MidiFile`] out, and back again.

Reading walks the chunk stream until it is exhausted, requiring the
header to come first and cross-checking its declared track count
against the tracks actually found. Conditions worth reporting but not
worth failing over are collected as [`Advisory`] values on the parsed
file instead of being logged internally or silently dropped.

Writing reverses the flow: the header goes out first with the track
count recomputed from the tracks actually present, then each track
with its length computed by the size pre-pass, then any preserved
unknown or custom chunks.
"#]

mod chunk;
pub use chunk::*;

mod header;
pub use header::*;

mod timing;
pub use timing::*;

mod track;
pub use track::*;

use crate::{
    FileError, WriteError, WriteResult,
    reader::{ReadError, ReadResult, Reader},
    settings::{NotEnoughBytesPolicy, ReadSettings, WriteSettings},
    writer::Writer,
};
use alloc::vec::Vec;

/// A reportable-but-not-fatal condition found while reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Advisory {
    /// The header declared one track count, the file delivered
    /// another
    TrackCountMismatch {
        /// What the header claimed
        declared: u16,
        /// How many track chunks were present
        actual: u16,
    },
    /// A track chunk carried bytes after its End of Track event;
    /// they were skipped
    TrailingDataAfterEndOfTrack {
        /// Byte offset of the first skipped byte
        position: usize,
        /// How many bytes were skipped
        bytes: usize,
    },
    /// The source ended mid-chunk and
    /// [`NotEnoughBytesPolicy::Ignore`] turned the truncation into an
    /// early end of file
    TruncatedStream {
        /// Byte offset at which reading stopped
        position: usize,
    },
}

#[doc = r#"
A complete Standard MIDI File: format, time division, tracks, and any
non-standard chunks worth preserving.

```
use smfio::prelude::*;

let mut file = MidiFile::new(FormatType::Simultaneous, Timing::new_ticks_per_quarter_note(480));
file.add_track(Track::default());
let bytes = file.write(&WriteSettings::default())?;

let reread = MidiFile::read(&bytes, &ReadSettings::default())?;
assert_eq!(reread.tracks().len(), 1);
# Ok::<(), Box<dyn std::error::Error>>(())
```
"#]
#[derive(Debug, Clone)]
pub struct MidiFile<'a> {
    format: FormatType,
    timing: Timing,
    tracks: Vec<Track<'a>>,
    other_chunks: Vec<Chunk<'a>>,
    advisories: Vec<Advisory>,
}

impl<'a> MidiFile<'a> {
    /// Create an empty file with the given format and time division.
    pub const fn new(format: FormatType, timing: Timing) -> Self {
        Self {
            format,
            timing,
            tracks: Vec::new(),
            other_chunks: Vec::new(),
            advisories: Vec::new(),
        }
    }

    /// Decode a byte source into a file.
    ///
    /// The first chunk must be the header. Chunks after it are taken
    /// in order; policies in `settings` decide what happens to
    /// unknown ids and truncation. A fatal error never yields a
    /// partial file.
    pub fn read(bytes: &'a [u8], settings: &ReadSettings) -> ReadResult<Self> {
        let mut reader = Reader::from_byte_slice(bytes);
        let mut advisories = Vec::new();
        let mut header: Option<HeaderChunk> = None;
        let mut tracks = Vec::new();
        let mut other_chunks = Vec::new();
        let mut first = true;

        loop {
            match read_chunk(&mut reader, settings, &mut advisories) {
                Ok(Some(chunk)) => {
                    if first && !matches!(chunk, Chunk::Header(_)) {
                        return Err(reader.parse_error(FileError::NoHeaderChunk));
                    }
                    first = false;
                    match chunk {
                        Chunk::Header(h) => {
                            if header.is_some() {
                                return Err(reader.parse_error(FileError::DuplicateHeader));
                            }
                            header = Some(h);
                        }
                        Chunk::Track(track) => tracks.push(track),
                        other => other_chunks.push(other),
                    }
                }
                Ok(None) => break,
                Err(e)
                    if e.is_not_enough_bytes()
                        && settings.not_enough_bytes_policy == NotEnoughBytesPolicy::Ignore =>
                {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        position = e.position(),
                        "treating truncated stream as end of file"
                    );
                    advisories.push(Advisory::TruncatedStream {
                        position: e.position(),
                    });
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let Some(header) = header else {
            return Err(ReadError::parse(
                reader.buffer_position(),
                FileError::NoHeaderChunk,
            ));
        };

        if usize::from(header.declared_tracks()) != tracks.len() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                declared = header.declared_tracks(),
                actual = tracks.len(),
                "track count mismatch"
            );
            advisories.push(Advisory::TrackCountMismatch {
                declared: header.declared_tracks(),
                actual: tracks.len() as u16,
            });
        }

        Ok(Self {
            format: header.format(),
            timing: header.timing(),
            tracks,
            other_chunks,
            advisories,
        })
    }

    /// Encode the file.
    ///
    /// The header's track count is recomputed from the tracks
    /// actually present, never trusted from a stale value.
    pub fn write(&self, settings: &WriteSettings) -> WriteResult<Vec<u8>> {
        if self.format == FormatType::SingleMultiChannel && self.tracks.len() > 1 {
            return Err(WriteError::MultipleTracksForSingleMultiChannel(
                self.tracks.len(),
            ));
        }

        let mut writer = Writer::new();
        let header = HeaderChunk::new(self.format, self.tracks.len() as u16, self.timing);
        Chunk::Header(header).write(&mut writer, settings)?;
        for track in &self.tracks {
            let length = track.payload_len(settings);
            let length = u32::try_from(length).map_err(|_| WriteError::ChunkTooLong(length))?;
            writer.write_slice(&ChunkId::TRACK.bytes());
            writer.write_u32_be(length);
            track.write_payload(&mut writer, settings)?;
        }
        for chunk in &self.other_chunks {
            chunk.write(&mut writer, settings)?;
        }
        Ok(writer.into_bytes())
    }

    /// The file's format type.
    pub const fn format(&self) -> FormatType {
        self.format
    }

    /// The file's time division.
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// The track chunks in file order.
    pub fn tracks(&self) -> &[Track<'a>] {
        &self.tracks
    }

    /// Mutable access to the track chunks.
    pub fn tracks_mut(&mut self) -> &mut Vec<Track<'a>> {
        &mut self.tracks
    }

    /// Append a track.
    pub fn add_track(&mut self, track: Track<'a>) {
        self.tracks.push(track);
    }

    /// Unknown and custom chunks, in file order.
    pub fn other_chunks(&self) -> &[Chunk<'a>] {
        &self.other_chunks
    }

    /// Append an unknown or custom chunk, written after the tracks.
    pub fn add_chunk(&mut self, chunk: Chunk<'a>) {
        self.other_chunks.push(chunk);
    }

    /// Conditions found while reading that did not stop the decode.
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Copy any borrowed payloads so the file can outlive its source
    /// buffer.
    pub fn into_owned(self) -> MidiFile<'static> {
        MidiFile {
            format: self.format,
            timing: self.timing,
            tracks: self.tracks.into_iter().map(Track::into_owned).collect(),
            other_chunks: self
                .other_chunks
                .into_iter()
                .map(|chunk| match chunk {
                    Chunk::Header(h) => Chunk::Header(h),
                    Chunk::Track(t) => Chunk::Track(t.into_owned()),
                    Chunk::Unknown(u) => Chunk::Unknown(u.into_owned()),
                    Chunk::Custom(c) => Chunk::Custom(c),
                })
                .collect(),
            advisories: self.advisories,
        }
    }
}
