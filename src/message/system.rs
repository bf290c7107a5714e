use super::read_data_byte;
use crate::{
    bytes::{DataByte, DataWord},
    reader::{ReadResult, Reader},
    settings::ReadSettings,
    writer::Writer,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A system common message, identified by its own status byte and
/// carrying zero to two data bytes.
///
/// These occasionally appear in files (usually smuggled through escape
/// events); they are decoded like any other event so a stream carrying
/// them survives a round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCommonMessage {
    /// One seven-bit fragment of a running SMPTE time code (`F1`)
    MidiTimeCodeQuarterFrame(DataByte),
    /// The playback position in MIDI beats (sixteenth notes) from the
    /// start of the song (`F2`)
    SongPositionPointer(DataWord),
    /// Which song or sequence to play (`F3`)
    SongSelect(DataByte),
    /// Ask analog synthesizers to retune their oscillators (`F6`)
    TuneRequest,
}

impl SystemCommonMessage {
    /// The status byte.
    pub const fn status(&self) -> u8 {
        match self {
            Self::MidiTimeCodeQuarterFrame(_) => 0xF1,
            Self::SongPositionPointer(_) => 0xF2,
            Self::SongSelect(_) => 0xF3,
            Self::TuneRequest => 0xF6,
        }
    }

    /// The number of data bytes following the status byte.
    pub(crate) const fn data_len(&self) -> usize {
        match self {
            Self::SongPositionPointer(_) => 2,
            Self::TuneRequest => 0,
            _ => 1,
        }
    }

    /// Decode the data bytes following `status`; `None` for the
    /// undefined codepoints `F4`/`F5`.
    pub(crate) fn read(
        reader: &mut Reader<'_>,
        status: u8,
        settings: &ReadSettings,
    ) -> ReadResult<Option<Self>> {
        Ok(match status {
            0xF1 => Some(Self::MidiTimeCodeQuarterFrame(read_data_byte(
                reader, settings,
            )?)),
            0xF2 => {
                let lsb = read_data_byte(reader, settings)?;
                let msb = read_data_byte(reader, settings)?;
                Some(Self::SongPositionPointer(DataWord::from_lsb_msb(lsb, msb)))
            }
            0xF3 => Some(Self::SongSelect(read_data_byte(reader, settings)?)),
            0xF6 => Some(Self::TuneRequest),
            _ => None,
        })
    }

    /// Emit the data bytes; the status byte is the caller's business.
    pub(crate) fn write_data(&self, writer: &mut Writer) {
        match self {
            Self::MidiTimeCodeQuarterFrame(value) | Self::SongSelect(value) => {
                writer.write_byte(value.value());
            }
            Self::SongPositionPointer(position) => {
                writer.write_byte(position.lsb().value());
                writer.write_byte(position.msb().value());
            }
            Self::TuneRequest => {}
        }
    }
}

/// A system real-time message: a single status byte, no payload, and
/// no effect on running status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SystemRealTimeMessage {
    /// The 24-per-quarter-note synchronization pulse
    TimingClock = 0xF8,
    /// Start playback from the beginning
    Start = 0xFA,
    /// Resume playback from the current position
    Continue = 0xFB,
    /// Stop playback
    Stop = 0xFC,
    /// The keep-alive a sender emits when it has nothing else to say
    ActiveSensing = 0xFE,
}

#[test]
fn song_position_pointer_bytes() {
    let mut reader = Reader::from_byte_slice(&[0x45, 0x23]);
    let settings = ReadSettings::default();
    let Some(SystemCommonMessage::SongPositionPointer(position)) =
        SystemCommonMessage::read(&mut reader, 0xF2, &settings).unwrap()
    else {
        panic!("expected a song position pointer");
    };
    assert_eq!(position.value(), (0x23 << 7) | 0x45);

    let mut writer = Writer::new();
    SystemCommonMessage::SongPositionPointer(position).write_data(&mut writer);
    assert_eq!(writer.as_slice(), &[0x45, 0x23]);
}

#[test]
fn real_time_status_bytes() {
    assert_eq!(u8::from(SystemRealTimeMessage::TimingClock), 0xF8);
    assert_eq!(
        SystemRealTimeMessage::try_from(0xFE),
        Ok(SystemRealTimeMessage::ActiveSensing)
    );
    assert!(SystemRealTimeMessage::try_from(0xF9).is_err());
}
