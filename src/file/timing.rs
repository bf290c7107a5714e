use crate::{
    FileError,
    bytes::DataByte,
    reader::{ReadResult, Reader},
    writer::Writer,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The header's time division: what a delta-time tick means.
///
/// Chosen once per file. Stored in the high bit and low fifteen bits
/// of the header's third word: high bit clear is a tick rate per
/// quarter note, high bit set is SMPTE frames per second (negated)
/// plus ticks per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Timing {
    /// Delta-times count fractions of a quarter note; real duration
    /// then depends on the current tempo
    TicksPerQuarterNote(u16),
    /// Delta-times count fractions of an SMPTE frame; real duration
    /// is fixed and tempo-independent
    Smpte(SmpteTiming),
}

impl Timing {
    /// Define the timing as a tick rate per quarter note.
    ///
    /// The leading bit is disregarded, so 1-32767.
    pub const fn new_ticks_per_quarter_note(tpqn: u16) -> Self {
        Self::TicksPerQuarterNote(tpqn & 0x7FFF)
    }

    /// Define the timing in terms of fps and ticks per frame.
    pub const fn new_smpte(fps: SmpteFps, ticks_per_frame: DataByte) -> Self {
        Self::Smpte(SmpteTiming {
            fps,
            ticks_per_frame,
        })
    }

    /// Returns Some if the timing is defined as ticks per quarter
    /// note.
    pub const fn ticks_per_quarter_note(&self) -> Option<u16> {
        match self {
            Self::TicksPerQuarterNote(tpqn) => Some(*tpqn),
            Self::Smpte(_) => None,
        }
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> ReadResult<Self> {
        let bytes = reader.read_array::<2>()?;
        if bytes[0] & 0x80 == 0 {
            return Ok(Self::TicksPerQuarterNote(u16::from_be_bytes(bytes)));
        }
        let fps = SmpteFps::try_from(bytes[0] as i8)
            .map_err(|_| reader.parse_error(FileError::InvalidSmpteFps(bytes[0] as i8)))?;
        let ticks_per_frame = DataByte::new(bytes[1]).map_err(|e| reader.parse_error(e))?;
        Ok(Self::Smpte(SmpteTiming {
            fps,
            ticks_per_frame,
        }))
    }

    pub(crate) fn write(&self, writer: &mut Writer) {
        match self {
            Self::TicksPerQuarterNote(tpqn) => writer.write_u16_be(tpqn & 0x7FFF),
            Self::Smpte(smpte) => {
                writer.write_byte(i8::from(smpte.fps) as u8);
                writer.write_byte(smpte.ticks_per_frame.value());
            }
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::TicksPerQuarterNote(480)
    }
}

/// An SMPTE time division: frames per second times ticks per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmpteTiming {
    pub(crate) fps: SmpteFps,
    pub(crate) ticks_per_frame: DataByte,
}

impl SmpteTiming {
    /// The frames per second.
    pub const fn fps(&self) -> SmpteFps {
        self.fps
    }

    /// The ticks per frame.
    pub const fn ticks_per_frame(&self) -> u8 {
        self.ticks_per_frame.value()
    }

    /// The resulting tick rate per second.
    pub const fn ticks_per_second(&self) -> u32 {
        self.fps.as_division() as u32 * self.ticks_per_frame.value() as u32
    }
}

/// The four SMPTE frame rates the format defines, stored as the
/// negated byte the header carries.
///
/// `TwentyNine` is the NTSC drop-frame rate (29.97 fps); for division
/// arithmetic it counts as the nominal 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i8)]
pub enum SmpteFps {
    /// 24 fps, the film standard
    TwentyFour = -24,
    /// 25 fps, PAL/SECAM video
    TwentyFive = -25,
    /// 29.97 fps, NTSC drop-frame
    TwentyNine = -29,
    /// 30 fps, NTSC black and white
    Thirty = -30,
}

impl SmpteFps {
    /// The nominal frame rate used in division arithmetic.
    ///
    /// Drop-frame 29.97 counts as 30 here.
    pub const fn as_division(&self) -> u8 {
        match self {
            Self::TwentyFour => 24,
            Self::TwentyFive => 25,
            Self::TwentyNine | Self::Thirty => 30,
        }
    }

    /// The rate for the two-bit code used by the SMPTE offset meta
    /// event.
    pub(crate) const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::TwentyFour,
            1 => Self::TwentyFive,
            2 => Self::TwentyNine,
            _ => Self::Thirty,
        }
    }

    /// The two-bit code used by the SMPTE offset meta event.
    pub(crate) const fn code(&self) -> u8 {
        match self {
            Self::TwentyFour => 0,
            Self::TwentyFive => 1,
            Self::TwentyNine => 2,
            Self::Thirty => 3,
        }
    }
}

#[test]
fn timing_dispatches_on_the_high_bit() {
    use pretty_assertions::assert_eq;

    let mut reader = Reader::from_byte_slice(&[0x01, 0xE0]);
    assert_eq!(
        Timing::read(&mut reader).unwrap(),
        Timing::TicksPerQuarterNote(480)
    );

    // -25 fps, 40 ticks per frame
    let mut reader = Reader::from_byte_slice(&[0xE7, 0x28]);
    let timing = Timing::read(&mut reader).unwrap();
    let Timing::Smpte(smpte) = timing else {
        panic!("expected smpte timing");
    };
    assert_eq!(smpte.fps(), SmpteFps::TwentyFive);
    assert_eq!(smpte.ticks_per_frame(), 40);
    assert_eq!(smpte.ticks_per_second(), 1000);

    let mut writer = Writer::new();
    timing.write(&mut writer);
    assert_eq!(writer.as_slice(), &[0xE7, 0x28]);
}

#[test]
fn invalid_fps_byte_is_rejected() {
    let mut reader = Reader::from_byte_slice(&[0xE0, 0x28]);
    let err = Timing::read(&mut reader).unwrap_err();
    assert_eq!(
        err.kind(),
        &crate::reader::ReadErrorKind::Parse(FileError::InvalidSmpteFps(-32).into())
    );
}
