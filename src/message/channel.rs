use super::read_data_byte;
use crate::{
    bytes::{Channel, DataByte, DataWord},
    reader::{ReadResult, Reader},
    settings::ReadSettings,
    writer::Writer,
};

#[doc = r#"
A message bound to one of the sixteen channels.

The status byte packs the event kind into the high nibble and the
channel into the low nibble; one or two data bytes follow depending on
the kind. These are the only messages eligible for running-status
compression.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelVoiceMessage {
    channel: Channel,
    event: VoiceEvent,
}

/// The set of channel voice event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceEvent {
    /// Stop sounding a key
    NoteOff {
        /// The key to release
        key: DataByte,
        /// The release velocity
        velocity: DataByte,
    },
    /// Start sounding a key.
    ///
    /// A velocity of zero is conventionally a note off.
    NoteOn {
        /// The key to press
        key: DataByte,
        /// The press velocity
        velocity: DataByte,
    },
    /// Change the pressure on a key that is already down
    PolyPressure {
        /// The key being re-pressed
        key: DataByte,
        /// The new pressure
        pressure: DataByte,
    },
    /// Change a controller value
    ControlChange {
        /// The controller number
        controller: DataByte,
        /// The new value
        value: DataByte,
    },
    /// Select a program (instrument) for the channel
    ProgramChange {
        /// The new program number
        program: DataByte,
    },
    /// Change the pressure for the whole channel
    ChannelPressure {
        /// The new pressure
        pressure: DataByte,
    },
    /// Deflect the channel's pitch
    PitchBend {
        /// The deflection; [`DataWord::MID`] is no bend
        bend: DataWord,
    },
}

impl VoiceEvent {
    /// The high nibble of the status byte for this event kind.
    pub const fn status_nibble(&self) -> u8 {
        match self {
            Self::NoteOff { .. } => 0x8,
            Self::NoteOn { .. } => 0x9,
            Self::PolyPressure { .. } => 0xA,
            Self::ControlChange { .. } => 0xB,
            Self::ProgramChange { .. } => 0xC,
            Self::ChannelPressure { .. } => 0xD,
            Self::PitchBend { .. } => 0xE,
        }
    }

    /// The number of data bytes following the status byte.
    pub const fn data_len(&self) -> usize {
        match self {
            Self::ProgramChange { .. } | Self::ChannelPressure { .. } => 1,
            _ => 2,
        }
    }
}

impl ChannelVoiceMessage {
    /// Create a new channel voice message.
    pub const fn new(channel: Channel, event: VoiceEvent) -> Self {
        Self { channel, event }
    }

    /// The channel the message addresses.
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// The event the message carries.
    pub const fn event(&self) -> &VoiceEvent {
        &self.event
    }

    /// The full status byte: kind nibble plus channel nibble.
    pub const fn status(&self) -> u8 {
        (self.event.status_nibble() << 4) | self.channel.value()
    }

    /// The number of data bytes following the status byte.
    pub(crate) const fn data_len(&self) -> usize {
        self.event.data_len()
    }

    /// Decode the data bytes following `status`.
    pub(crate) fn read(
        reader: &mut Reader<'_>,
        status: u8,
        settings: &ReadSettings,
    ) -> ReadResult<Self> {
        let channel = Channel::from_status(status);
        let event = match status >> 4 {
            0x8 => VoiceEvent::NoteOff {
                key: read_data_byte(reader, settings)?,
                velocity: read_data_byte(reader, settings)?,
            },
            0x9 => VoiceEvent::NoteOn {
                key: read_data_byte(reader, settings)?,
                velocity: read_data_byte(reader, settings)?,
            },
            0xA => VoiceEvent::PolyPressure {
                key: read_data_byte(reader, settings)?,
                pressure: read_data_byte(reader, settings)?,
            },
            0xB => VoiceEvent::ControlChange {
                controller: read_data_byte(reader, settings)?,
                value: read_data_byte(reader, settings)?,
            },
            0xC => VoiceEvent::ProgramChange {
                program: read_data_byte(reader, settings)?,
            },
            0xD => VoiceEvent::ChannelPressure {
                pressure: read_data_byte(reader, settings)?,
            },
            _ => {
                // 0xE is the only nibble left; callers dispatch 0x8..=0xE here
                let lsb = read_data_byte(reader, settings)?;
                let msb = read_data_byte(reader, settings)?;
                VoiceEvent::PitchBend {
                    bend: DataWord::from_lsb_msb(lsb, msb),
                }
            }
        };
        Ok(Self { channel, event })
    }

    /// Emit the data bytes; the caller has already decided whether the
    /// status byte is present.
    pub(crate) fn write_data(&self, writer: &mut Writer) {
        match &self.event {
            VoiceEvent::NoteOff { key, velocity } | VoiceEvent::NoteOn { key, velocity } => {
                writer.write_byte(key.value());
                writer.write_byte(velocity.value());
            }
            VoiceEvent::PolyPressure { key, pressure } => {
                writer.write_byte(key.value());
                writer.write_byte(pressure.value());
            }
            VoiceEvent::ControlChange { controller, value } => {
                writer.write_byte(controller.value());
                writer.write_byte(value.value());
            }
            VoiceEvent::ProgramChange { program } => writer.write_byte(program.value()),
            VoiceEvent::ChannelPressure { pressure } => writer.write_byte(pressure.value()),
            VoiceEvent::PitchBend { bend } => {
                writer.write_byte(bend.lsb().value());
                writer.write_byte(bend.msb().value());
            }
        }
    }
}
