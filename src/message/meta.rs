use crate::{
    EventError,
    bytes::{Channel, DataByte},
    file::SmpteFps,
    reader::{ReadResult, Reader},
    vlq::{read_vlq, vlq_len, write_vlq},
    writer::Writer,
};
use alloc::borrow::Cow;

/// Microseconds per quarter note, the payload of the tempo meta event.
///
/// The wire representation is three bytes, so values are masked to 24
/// bits on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tempo(u32);

impl Tempo {
    /// 500 000 µs per quarter note (120 BPM), in effect whenever a
    /// file carries no tempo event.
    pub const DEFAULT: Self = Self(500_000);

    /// Create a tempo from microseconds per quarter note.
    pub const fn new(micros_per_quarter_note: u32) -> Self {
        Self(micros_per_quarter_note & 0xFF_FFFF)
    }

    /// Decode from the three payload bytes.
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32)
    }

    /// The three payload bytes.
    pub const fn to_bytes(&self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    /// Microseconds per quarter note.
    pub const fn micros_per_quarter_note(&self) -> u32 {
        self.0
    }

    /// Create a tempo from beats per minute.
    pub fn from_beats_per_minute(bpm: f64) -> Self {
        Self::new((60_000_000.0 / bpm) as u32)
    }

    /// Beats (quarter notes) per minute.
    pub fn beats_per_minute(&self) -> f64 {
        60_000_000.0 / self.0 as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The payload of the time signature meta event.
///
/// The denominator is stored the way the wire stores it, as a power of
/// two; [`TimeSignature::denominator`] computes the musical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,
    /// Base-2 logarithm of the beat unit (2 means quarter notes)
    pub denominator_log2: u8,
    /// MIDI clocks per metronome click
    pub clocks_per_metronome_click: u8,
    /// Notated 32nd notes per MIDI quarter note
    pub thirty_seconds_per_quarter_note: u8,
}

impl TimeSignature {
    /// Common time, 4/4, in effect whenever a file carries no time
    /// signature event.
    pub const DEFAULT: Self = Self {
        numerator: 4,
        denominator_log2: 2,
        clocks_per_metronome_click: 24,
        thirty_seconds_per_quarter_note: 8,
    };

    /// Create a signature from its musical reading, keeping the
    /// default metronome fields.
    ///
    /// A denominator that is not a power of two is rounded down to
    /// one.
    pub const fn new(numerator: u8, denominator: u8) -> Self {
        let denominator_log2 = match denominator {
            0 => 2,
            d => d.ilog2() as u8,
        };
        Self {
            numerator,
            denominator_log2,
            ..Self::DEFAULT
        }
    }

    /// The musical beat unit (4 for quarter notes).
    pub const fn denominator(&self) -> u16 {
        1 << self.denominator_log2
    }

    /// Decode from the four payload bytes.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            numerator: bytes[0],
            denominator_log2: bytes[1],
            clocks_per_metronome_click: bytes[2],
            thirty_seconds_per_quarter_note: bytes[3],
        }
    }

    /// The four payload bytes.
    pub const fn to_bytes(&self) -> [u8; 4] {
        [
            self.numerator,
            self.denominator_log2,
            self.clocks_per_metronome_click,
            self.thirty_seconds_per_quarter_note,
        ]
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The payload of the key signature meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeySignature {
    /// Number of sharps (positive) or flats (negative)
    pub accidentals: i8,
    /// True for a minor key
    pub minor: bool,
}

/// A track's starting position in SMPTE time code, the payload of the
/// SMPTE offset meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmpteOffset {
    /// The frame rate the position is counted in
    pub fps: SmpteFps,
    /// Hours (0-23)
    pub hour: u8,
    /// Minutes (0-59)
    pub minute: u8,
    /// Seconds (0-59)
    pub second: u8,
    /// Frames within the second
    pub frame: u8,
    /// Hundredths of a frame
    pub subframe: u8,
}

impl SmpteOffset {
    /// Decode from the five payload bytes.
    ///
    /// The first byte packs the frame rate into bits 5-6 and the hour
    /// into the low five bits.
    pub const fn from_bytes(bytes: [u8; 5]) -> Self {
        Self {
            fps: SmpteFps::from_code((bytes[0] >> 5) & 0b11),
            hour: bytes[0] & 0b0001_1111,
            minute: bytes[1],
            second: bytes[2],
            frame: bytes[3],
            subframe: bytes[4],
        }
    }

    /// The five payload bytes.
    pub const fn to_bytes(&self) -> [u8; 5] {
        [
            (self.fps.code() << 5) | (self.hour & 0b0001_1111),
            self.minute,
            self.second,
            self.frame,
            self.subframe,
        ]
    }
}

#[doc = r#"
The set of meta events.

Meta events never travel to an instrument; they annotate the track with
names, lyrics, tempo and structural markers. On the wire each one is
`FF <type> <length> <payload>`; the length is a variable-length
quantity and is always written, even when zero.

Types this crate has no reading for are preserved raw as
[`MetaMessage::Unknown`], as are recognized types whose payload is
shorter than the reading requires.
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaMessage<'a> {
    /// The sequence's number in a collection; empty payloads default
    /// to the track's position in the file
    SequenceNumber(Option<u16>),
    /// Free text
    Text(Cow<'a, [u8]>),
    /// A copyright notice
    Copyright(Cow<'a, [u8]>),
    /// The name of the sequence or track
    TrackName(Cow<'a, [u8]>),
    /// The name of the instrumentation
    InstrumentName(Cow<'a, [u8]>),
    /// A syllable of the lyric
    Lyric(Cow<'a, [u8]>),
    /// A rehearsal or section marker
    Marker(Cow<'a, [u8]>),
    /// A cue to synchronized media
    CuePoint(Cow<'a, [u8]>),
    /// The name of the program
    ProgramName(Cow<'a, [u8]>),
    /// The name of the output device
    DeviceName(Cow<'a, [u8]>),
    /// The channel subsequent meta events refer to
    ChannelPrefix(Channel),
    /// The port subsequent events route through
    MidiPort(DataByte),
    /// The mandatory final event of a track
    EndOfTrack,
    /// A tempo change
    Tempo(Tempo),
    /// The track's SMPTE start position
    SmpteOffset(SmpteOffset),
    /// A time signature change
    TimeSignature(TimeSignature),
    /// A key signature change
    KeySignature(KeySignature),
    /// Sequencer-proprietary data
    SequencerSpecific(Cow<'a, [u8]>),
    /// A type this crate has no reading for, preserved raw
    Unknown {
        /// The meta type byte
        meta_type: u8,
        /// The raw payload
        data: Cow<'a, [u8]>,
    },
}

impl<'a> MetaMessage<'a> {
    /// The meta type byte.
    pub const fn meta_type(&self) -> u8 {
        match self {
            Self::SequenceNumber(_) => 0x00,
            Self::Text(_) => 0x01,
            Self::Copyright(_) => 0x02,
            Self::TrackName(_) => 0x03,
            Self::InstrumentName(_) => 0x04,
            Self::Lyric(_) => 0x05,
            Self::Marker(_) => 0x06,
            Self::CuePoint(_) => 0x07,
            Self::ProgramName(_) => 0x08,
            Self::DeviceName(_) => 0x09,
            Self::ChannelPrefix(_) => 0x20,
            Self::MidiPort(_) => 0x21,
            Self::EndOfTrack => 0x2F,
            Self::Tempo(_) => 0x51,
            Self::SmpteOffset(_) => 0x54,
            Self::TimeSignature(_) => 0x58,
            Self::KeySignature(_) => 0x59,
            Self::SequencerSpecific(_) => 0x7F,
            Self::Unknown { meta_type, .. } => *meta_type,
        }
    }

    /// Decode the bytes following the `FF` status byte.
    pub(crate) fn read(reader: &mut Reader<'a>) -> ReadResult<Self> {
        let meta_type = reader.read_byte()?;
        let length = read_vlq(reader)? as usize;
        let data = reader.read_exact(length)?;

        Ok(match meta_type {
            0x00 if data.is_empty() => Self::SequenceNumber(None),
            0x00 if data.len() >= 2 => {
                Self::SequenceNumber(Some(u16::from_be_bytes([data[0], data[1]])))
            }
            0x01 => Self::Text(Cow::Borrowed(data)),
            0x02 => Self::Copyright(Cow::Borrowed(data)),
            0x03 => Self::TrackName(Cow::Borrowed(data)),
            0x04 => Self::InstrumentName(Cow::Borrowed(data)),
            0x05 => Self::Lyric(Cow::Borrowed(data)),
            0x06 => Self::Marker(Cow::Borrowed(data)),
            0x07 => Self::CuePoint(Cow::Borrowed(data)),
            0x08 => Self::ProgramName(Cow::Borrowed(data)),
            0x09 => Self::DeviceName(Cow::Borrowed(data)),
            0x20 if !data.is_empty() => Self::ChannelPrefix(Channel::from_status(data[0])),
            0x21 if !data.is_empty() => Self::MidiPort(DataByte::new_unchecked(data[0] & 0x7F)),
            0x2F => Self::EndOfTrack,
            0x51 if data.len() >= 3 => Self::Tempo(Tempo::from_bytes([data[0], data[1], data[2]])),
            0x54 if data.len() >= 5 => Self::SmpteOffset(SmpteOffset::from_bytes([
                data[0], data[1], data[2], data[3], data[4],
            ])),
            0x58 if data.len() >= 4 => Self::TimeSignature(TimeSignature::from_bytes([
                data[0], data[1], data[2], data[3],
            ])),
            0x59 if data.len() >= 2 => Self::KeySignature(KeySignature {
                accidentals: data[0] as i8,
                minor: data[1] != 0,
            }),
            0x7F => Self::SequencerSpecific(Cow::Borrowed(data)),
            _ => Self::Unknown {
                meta_type,
                data: Cow::Borrowed(data),
            },
        })
    }

    /// The payload bytes as they appear after the length field.
    fn payload(&self) -> Cow<'_, [u8]> {
        match self {
            Self::SequenceNumber(None) | Self::EndOfTrack => Cow::Borrowed(&[]),
            Self::SequenceNumber(Some(n)) => Cow::Owned(n.to_be_bytes().to_vec()),
            Self::Text(data)
            | Self::Copyright(data)
            | Self::TrackName(data)
            | Self::InstrumentName(data)
            | Self::Lyric(data)
            | Self::Marker(data)
            | Self::CuePoint(data)
            | Self::ProgramName(data)
            | Self::DeviceName(data)
            | Self::SequencerSpecific(data)
            | Self::Unknown { data, .. } => Cow::Borrowed(data.as_ref()),
            Self::ChannelPrefix(channel) => Cow::Owned([channel.value()].to_vec()),
            Self::MidiPort(port) => Cow::Owned([port.value()].to_vec()),
            Self::Tempo(tempo) => Cow::Owned(tempo.to_bytes().to_vec()),
            Self::SmpteOffset(offset) => Cow::Owned(offset.to_bytes().to_vec()),
            Self::TimeSignature(signature) => Cow::Owned(signature.to_bytes().to_vec()),
            Self::KeySignature(signature) => {
                Cow::Owned([signature.accidentals as u8, signature.minor as u8].to_vec())
            }
        }
    }

    /// Emit `FF <type> <length> <payload>`.
    pub(crate) fn write(&self, writer: &mut Writer) -> Result<(), EventError> {
        let payload = self.payload();
        writer.write_byte(0xFF);
        writer.write_byte(self.meta_type());
        write_vlq(writer, payload.len() as u32)?;
        writer.write_slice(&payload);
        Ok(())
    }

    /// The exact byte count [`MetaMessage::write`] emits.
    pub(crate) fn encoded_len(&self) -> usize {
        let payload_len = self.payload().len();
        2 + vlq_len(payload_len as u32) + payload_len
    }

    /// Copy any borrowed payload so the message can outlive its
    /// source buffer.
    pub fn into_owned(self) -> MetaMessage<'static> {
        fn own(data: Cow<'_, [u8]>) -> Cow<'static, [u8]> {
            Cow::Owned(data.into_owned())
        }
        match self {
            MetaMessage::SequenceNumber(n) => MetaMessage::SequenceNumber(n),
            MetaMessage::Text(d) => MetaMessage::Text(own(d)),
            MetaMessage::Copyright(d) => MetaMessage::Copyright(own(d)),
            MetaMessage::TrackName(d) => MetaMessage::TrackName(own(d)),
            MetaMessage::InstrumentName(d) => MetaMessage::InstrumentName(own(d)),
            MetaMessage::Lyric(d) => MetaMessage::Lyric(own(d)),
            MetaMessage::Marker(d) => MetaMessage::Marker(own(d)),
            MetaMessage::CuePoint(d) => MetaMessage::CuePoint(own(d)),
            MetaMessage::ProgramName(d) => MetaMessage::ProgramName(own(d)),
            MetaMessage::DeviceName(d) => MetaMessage::DeviceName(own(d)),
            MetaMessage::ChannelPrefix(c) => MetaMessage::ChannelPrefix(c),
            MetaMessage::MidiPort(p) => MetaMessage::MidiPort(p),
            MetaMessage::EndOfTrack => MetaMessage::EndOfTrack,
            MetaMessage::Tempo(t) => MetaMessage::Tempo(t),
            MetaMessage::SmpteOffset(o) => MetaMessage::SmpteOffset(o),
            MetaMessage::TimeSignature(s) => MetaMessage::TimeSignature(s),
            MetaMessage::KeySignature(k) => MetaMessage::KeySignature(k),
            MetaMessage::SequencerSpecific(d) => MetaMessage::SequencerSpecific(own(d)),
            MetaMessage::Unknown { meta_type, data } => MetaMessage::Unknown {
                meta_type,
                data: own(data),
            },
        }
    }
}

#[test]
fn tempo_bytes() {
    let tempo = Tempo::new(500_000);
    assert_eq!(tempo.to_bytes(), [0x07, 0xA1, 0x20]);
    assert_eq!(Tempo::from_bytes([0x07, 0xA1, 0x20]), tempo);
    assert_eq!(Tempo::from_beats_per_minute(120.0), tempo);
    assert!((tempo.beats_per_minute() - 120.0).abs() < 1e-9);
}

#[test]
fn time_signature_denominator() {
    let sig = TimeSignature::new(6, 8);
    assert_eq!(sig.denominator_log2, 3);
    assert_eq!(sig.denominator(), 8);
    assert_eq!(TimeSignature::DEFAULT.denominator(), 4);
}

#[test]
fn smpte_offset_bytes() {
    use pretty_assertions::assert_eq;

    // frame rate code 2 (29.97), 01:23:45, frame 12, subframe 34
    let bytes = [0x41, 0x17, 0x2D, 0x0C, 0x22];
    let offset = SmpteOffset::from_bytes(bytes);
    assert_eq!(offset.fps, SmpteFps::TwentyNine);
    assert_eq!(offset.hour, 1);
    assert_eq!(offset.minute, 23);
    assert_eq!(offset.second, 45);
    assert_eq!(offset.frame, 12);
    assert_eq!(offset.subframe, 34);
    assert_eq!(offset.to_bytes(), bytes);
}

#[test]
fn meta_length_always_written() {
    let mut writer = Writer::new();
    MetaMessage::EndOfTrack.write(&mut writer).unwrap();
    assert_eq!(writer.as_slice(), &[0xFF, 0x2F, 0x00]);
    assert_eq!(MetaMessage::EndOfTrack.encoded_len(), 3);
}

#[test]
fn unknown_meta_round_trips() {
    let bytes = [0x60, 0x03, 0xDE, 0xAD, 0xBE];
    let mut reader = Reader::from_byte_slice(&bytes);
    let message = MetaMessage::read(&mut reader).unwrap();
    assert_eq!(
        message,
        MetaMessage::Unknown {
            meta_type: 0x60,
            data: Cow::Borrowed(&[0xDE, 0xAD, 0xBE]),
        }
    );

    let mut writer = Writer::new();
    message.write(&mut writer).unwrap();
    // the status byte leads, then the bytes reproduce exactly
    assert_eq!(writer.as_slice()[0], 0xFF);
    assert_eq!(&writer.as_slice()[1..], &bytes[..]);
}
