use super::Timing;
use crate::{
    FileError,
    reader::{ReadError, ReadResult, Reader},
    writer::Writer,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// How the tracks of a file relate to each other, the first word of
/// the header payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum FormatType {
    /// Format 0: a single track carrying every channel
    SingleMultiChannel = 0,
    /// Format 1: tracks played simultaneously
    Simultaneous = 1,
    /// Format 2: independent single-track patterns
    SequentiallyIndependent = 2,
}

/// The decoded `MThd` payload: format, declared track count, and time
/// division.
///
/// The declared count is what the header claimed, not necessarily what
/// the file delivered; the file layer cross-checks the two and the
/// writer recomputes the count from the tracks actually present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderChunk {
    format: FormatType,
    declared_tracks: u16,
    timing: Timing,
}

impl HeaderChunk {
    /// Create a new header.
    pub const fn new(format: FormatType, declared_tracks: u16, timing: Timing) -> Self {
        Self {
            format,
            declared_tracks,
            timing,
        }
    }

    /// The file's format type.
    pub const fn format(&self) -> FormatType {
        self.format
    }

    /// The track count the header declares.
    pub const fn declared_tracks(&self) -> u16 {
        self.declared_tracks
    }

    /// The file's time division.
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// Decode a header payload of `length` bytes.
    ///
    /// Lengths beyond the six defined bytes are tolerated; the extra
    /// bytes are skipped so the cursor still lands on the next chunk.
    pub(crate) fn read(reader: &mut Reader<'_>, length: u32) -> ReadResult<Self> {
        let length = length as usize;
        if length < 6 {
            return Err(ReadError::not_enough_bytes(
                reader.buffer_position(),
                6,
                length,
            ));
        }

        let raw_format = reader.read_u16_be()?;
        let format = FormatType::try_from(raw_format)
            .map_err(|_| reader.parse_error(FileError::InvalidFormat(raw_format)))?;
        let declared_tracks = reader.read_u16_be()?;
        let timing = Timing::read(reader)?;

        if length > 6 {
            reader.skip(length - 6)?;
        }

        Ok(Self {
            format,
            declared_tracks,
            timing,
        })
    }

    /// Emit the six payload bytes; the envelope is the caller's
    /// business.
    pub(crate) fn write_payload(&self, writer: &mut Writer) {
        writer.write_u16_be(self.format.into());
        writer.write_u16_be(self.declared_tracks);
        self.timing.write(writer);
    }
}

#[test]
fn oversized_header_is_tolerated() {
    use pretty_assertions::assert_eq;

    let bytes = [0x00, 0x01, 0x00, 0x02, 0x01, 0xE0, 0xAA, 0xBB];
    let mut reader = Reader::from_byte_slice(&bytes);
    let header = HeaderChunk::read(&mut reader, 8).unwrap();
    assert_eq!(header.format(), FormatType::Simultaneous);
    assert_eq!(header.declared_tracks(), 2);
    assert_eq!(header.timing(), Timing::TicksPerQuarterNote(480));
    // the extra bytes were consumed
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn unknown_format_is_rejected() {
    let bytes = [0x00, 0x03, 0x00, 0x01, 0x01, 0xE0];
    let mut reader = Reader::from_byte_slice(&bytes);
    let err = HeaderChunk::read(&mut reader, 6).unwrap_err();
    assert_eq!(
        err.kind(),
        &crate::reader::ReadErrorKind::Parse(FileError::InvalidFormat(3).into())
    );
}
