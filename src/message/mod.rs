#![doc = r#"
The event variant set and its codec.

# Hierarchy

```text
                    |---------------|
                    | TrackMessage  |
                    |---------------|
                   /    |      |     \
        |--------------| |  |------| |--------------------|
        | ChannelVoice | |  | Meta | | SystemExclusive /  |
        |  (status     | |  | (FF) | | Common / RealTime  |
        |  80..EF)     | |  |------| |  (F0..FE)          |
        |--------------| |           |--------------------|
```

Decoding threads an explicit [`RunningStatus`] register through every
call: a data byte found in status position reuses the previous channel
status (running-status compression). The register is plain state passed
in and out, never a hidden field, so the codec is reentrant and each
call is testable on its own.
"#]

mod channel;
pub use channel::*;

mod meta;
pub use meta::*;

mod sysex;
pub use sysex::*;

mod system;
pub use system::*;

use crate::{
    EventError,
    bytes::DataByte,
    reader::{ReadResult, Reader},
    settings::{InvalidChannelEventParameterValuePolicy, ReadSettings, WriteSettings},
    vlq::{read_vlq, vlq_len, write_vlq},
    writer::Writer,
};

/// The status register running-status compression revolves around.
///
/// Holds the last channel status byte seen (or emitted). Reset to
/// "none" at the start of every track chunk; never shared across
/// chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunningStatus(Option<u8>);

impl RunningStatus {
    /// The state at the start of a track: no status established.
    pub const fn none() -> Self {
        Self(None)
    }

    /// The established status byte, if any.
    pub const fn get(&self) -> Option<u8> {
        self.0
    }

    pub(crate) const fn set(&mut self, status: u8) {
        self.0 = Some(status);
    }

    pub(crate) const fn clear(&mut self) {
        self.0 = None;
    }
}

/// Read one channel-event data byte, applying the configured policy
/// when its high bit is set.
pub(crate) fn read_data_byte(
    reader: &mut Reader<'_>,
    settings: &ReadSettings,
) -> ReadResult<DataByte> {
    let byte = reader.read_byte()?;
    if byte & 0x80 == 0 {
        return Ok(DataByte::new_unchecked(byte));
    }
    match settings.invalid_channel_event_parameter_value_policy {
        InvalidChannelEventParameterValuePolicy::Abort => {
            Err(reader.parse_error(EventError::InvalidParameterValue { value: byte }))
        }
        InvalidChannelEventParameterValuePolicy::SnapToLimits => {
            #[cfg(feature = "tracing")]
            tracing::warn!(value = byte, "snapping out-of-range data byte to 127");
            Ok(DataByte::MAX)
        }
        InvalidChannelEventParameterValuePolicy::ReadValid => {
            Ok(DataByte::new_unchecked(byte & 0x7F))
        }
    }
}

/// Any event that can appear inside a track chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackMessage<'a> {
    /// A channel voice message
    ChannelVoice(ChannelVoiceMessage),
    /// A meta event
    Meta(MetaMessage<'a>),
    /// A system exclusive event
    SystemExclusive(SystemExclusiveMessage<'a>),
    /// A system common message
    SystemCommon(SystemCommonMessage),
    /// A system real-time message
    SystemRealTime(SystemRealTimeMessage),
}

impl<'a> TrackMessage<'a> {
    /// Decode one message, advancing the cursor past exactly the bytes
    /// that belong to it and updating the running-status register the
    /// way the wire does.
    pub fn read(
        reader: &mut Reader<'a>,
        running_status: &mut RunningStatus,
        settings: &ReadSettings,
    ) -> ReadResult<Self> {
        let first = reader.peek_byte()?;
        let status = if first & 0x80 == 0 {
            match running_status.get() {
                Some(status) => status,
                None => return Err(reader.parse_error(EventError::MissingStatusByte)),
            }
        } else {
            reader.read_byte()?
        };

        match status {
            0x80..=0xEF => {
                running_status.set(status);
                ChannelVoiceMessage::read(reader, status, settings).map(Self::ChannelVoice)
            }
            0xF0 | 0xF7 => {
                running_status.clear();
                SystemExclusiveMessage::read(reader, status).map(Self::SystemExclusive)
            }
            0xFF => {
                running_status.clear();
                MetaMessage::read(reader).map(Self::Meta)
            }
            0xF1..=0xF6 => {
                running_status.clear();
                match SystemCommonMessage::read(reader, status, settings)? {
                    Some(message) => Ok(Self::SystemCommon(message)),
                    None => Err(reader.parse_error(EventError::InvalidStatusByte(status))),
                }
            }
            0xF8..=0xFE => SystemRealTimeMessage::try_from(status)
                .map(Self::SystemRealTime)
                .map_err(|_| reader.parse_error(EventError::InvalidStatusByte(status))),
            _ => Err(reader.parse_error(EventError::InvalidStatusByte(status))),
        }
    }

    /// Encode one message.
    ///
    /// The status byte of a channel event is omitted when `settings`
    /// allows compression and the register already holds it; meta and
    /// sysex events always emit a full status byte.
    pub fn write(
        &self,
        writer: &mut Writer,
        running_status: &mut RunningStatus,
        settings: &WriteSettings,
    ) -> Result<(), EventError> {
        match self {
            Self::ChannelVoice(message) => {
                let status = message.status();
                let omit = settings.use_running_status && running_status.get() == Some(status);
                if !omit {
                    writer.write_byte(status);
                }
                running_status.set(status);
                message.write_data(writer);
                Ok(())
            }
            Self::Meta(message) => {
                running_status.clear();
                message.write(writer)
            }
            Self::SystemExclusive(message) => {
                running_status.clear();
                message.write(writer)
            }
            Self::SystemCommon(message) => {
                running_status.clear();
                writer.write_byte(message.status());
                message.write_data(writer);
                Ok(())
            }
            Self::SystemRealTime(message) => {
                writer.write_byte((*message).into());
                Ok(())
            }
        }
    }

    /// The exact byte count [`TrackMessage::write`] would emit,
    /// without encoding.
    ///
    /// Updates the register exactly as `write` would, so a pre-pass
    /// over a whole track yields the chunk length in one sweep.
    pub fn encoded_len(
        &self,
        running_status: &mut RunningStatus,
        settings: &WriteSettings,
    ) -> usize {
        match self {
            Self::ChannelVoice(message) => {
                let status = message.status();
                let omit = settings.use_running_status && running_status.get() == Some(status);
                running_status.set(status);
                usize::from(!omit) + message.data_len()
            }
            Self::Meta(message) => {
                running_status.clear();
                message.encoded_len()
            }
            Self::SystemExclusive(message) => {
                running_status.clear();
                message.encoded_len()
            }
            Self::SystemCommon(message) => {
                running_status.clear();
                1 + message.data_len()
            }
            Self::SystemRealTime(_) => 1,
        }
    }

    /// Copy any borrowed payload so the message can outlive its
    /// source buffer.
    pub fn into_owned(self) -> TrackMessage<'static> {
        match self {
            Self::ChannelVoice(message) => TrackMessage::ChannelVoice(message),
            Self::Meta(message) => TrackMessage::Meta(message.into_owned()),
            Self::SystemExclusive(message) => TrackMessage::SystemExclusive(message.into_owned()),
            Self::SystemCommon(message) => TrackMessage::SystemCommon(message),
            Self::SystemRealTime(message) => TrackMessage::SystemRealTime(message),
        }
    }
}

impl From<ChannelVoiceMessage> for TrackMessage<'_> {
    fn from(value: ChannelVoiceMessage) -> Self {
        Self::ChannelVoice(value)
    }
}

impl<'a> From<MetaMessage<'a>> for TrackMessage<'a> {
    fn from(value: MetaMessage<'a>) -> Self {
        Self::Meta(value)
    }
}

impl<'a> From<SystemExclusiveMessage<'a>> for TrackMessage<'a> {
    fn from(value: SystemExclusiveMessage<'a>) -> Self {
        Self::SystemExclusive(value)
    }
}

/// A message paired with its delta-time: the tick offset from the
/// previous event in the same track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent<'a> {
    delta_ticks: u32,
    message: TrackMessage<'a>,
}

impl<'a> TrackEvent<'a> {
    /// Create a new timed event.
    pub const fn new(delta_ticks: u32, message: TrackMessage<'a>) -> Self {
        Self {
            delta_ticks,
            message,
        }
    }

    /// Ticks since the previous event in the track.
    pub const fn delta_ticks(&self) -> u32 {
        self.delta_ticks
    }

    /// The message itself.
    pub const fn message(&self) -> &TrackMessage<'a> {
        &self.message
    }

    /// Decode a delta-time and the message that follows it.
    pub fn read(
        reader: &mut Reader<'a>,
        running_status: &mut RunningStatus,
        settings: &ReadSettings,
    ) -> ReadResult<Self> {
        let delta_ticks = read_vlq(reader)?;
        let message = TrackMessage::read(reader, running_status, settings)?;
        Ok(Self {
            delta_ticks,
            message,
        })
    }

    /// Encode the delta-time and the message.
    pub fn write(
        &self,
        writer: &mut Writer,
        running_status: &mut RunningStatus,
        settings: &WriteSettings,
    ) -> Result<(), EventError> {
        write_vlq(writer, self.delta_ticks)?;
        self.message.write(writer, running_status, settings)
    }

    /// The exact byte count [`TrackEvent::write`] would emit.
    pub fn encoded_len(&self, running_status: &mut RunningStatus, settings: &WriteSettings) -> usize {
        vlq_len(self.delta_ticks) + self.message.encoded_len(running_status, settings)
    }

    /// Copy any borrowed payload so the event can outlive its source
    /// buffer.
    pub fn into_owned(self) -> TrackEvent<'static> {
        TrackEvent {
            delta_ticks: self.delta_ticks,
            message: self.message.into_owned(),
        }
    }
}

#[cfg(test)]
use crate::bytes::Channel;

#[cfg(test)]
fn note_on(channel: u8, key: u8, velocity: u8) -> TrackMessage<'static> {
    TrackMessage::ChannelVoice(ChannelVoiceMessage::new(
        Channel::new(channel).unwrap(),
        VoiceEvent::NoteOn {
            key: DataByte::new(key).unwrap(),
            velocity: DataByte::new(velocity).unwrap(),
        },
    ))
}

#[test]
fn decode_note_pair() {
    use pretty_assertions::assert_eq;

    let bytes = [0x90, 0x3C, 0x40, 0x80, 0x3C, 0x40];
    let mut reader = Reader::from_byte_slice(&bytes);
    let mut rs = RunningStatus::none();
    let settings = ReadSettings::default();

    let on = TrackMessage::read(&mut reader, &mut rs, &settings).unwrap();
    assert_eq!(on, note_on(0, 0x3C, 0x40));
    assert_eq!(rs.get(), Some(0x90));

    let TrackMessage::ChannelVoice(off) =
        TrackMessage::read(&mut reader, &mut rs, &settings).unwrap()
    else {
        panic!("expected a channel message");
    };
    assert_eq!(off.status(), 0x80);
    assert_eq!(rs.get(), Some(0x80));
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn running_status_reuses_previous_status() {
    let bytes = [0x90, 0x3C, 0x40, 0x3E, 0x50];
    let mut reader = Reader::from_byte_slice(&bytes);
    let mut rs = RunningStatus::none();
    let settings = ReadSettings::default();

    let first = TrackMessage::read(&mut reader, &mut rs, &settings).unwrap();
    let second = TrackMessage::read(&mut reader, &mut rs, &settings).unwrap();
    assert_eq!(first, note_on(0, 0x3C, 0x40));
    assert_eq!(second, note_on(0, 0x3E, 0x50));
}

#[test]
fn running_status_without_status_byte_fails() {
    let mut reader = Reader::from_byte_slice(&[0x3C, 0x40]);
    let mut rs = RunningStatus::none();
    let err = TrackMessage::read(&mut reader, &mut rs, &ReadSettings::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &crate::reader::ReadErrorKind::Parse(EventError::MissingStatusByte.into())
    );
}

#[test]
fn meta_event_clears_running_status() {
    let bytes = [0x90, 0x3C, 0x40, 0xFF, 0x2F, 0x00];
    let mut reader = Reader::from_byte_slice(&bytes);
    let mut rs = RunningStatus::none();
    let settings = ReadSettings::default();

    TrackMessage::read(&mut reader, &mut rs, &settings).unwrap();
    TrackMessage::read(&mut reader, &mut rs, &settings).unwrap();
    assert_eq!(rs.get(), None);
}

#[test]
fn encode_with_running_status_omits_second_status() {
    let events = [note_on(0, 0x3C, 0x40), note_on(0, 0x3E, 0x50)];
    let compress = WriteSettings {
        use_running_status: true,
    };
    let plain = WriteSettings {
        use_running_status: false,
    };

    let mut writer = Writer::new();
    let mut rs = RunningStatus::none();
    for event in &events {
        event.write(&mut writer, &mut rs, &compress).unwrap();
    }
    assert_eq!(writer.as_slice(), &[0x90, 0x3C, 0x40, 0x3E, 0x50]);

    let mut writer = Writer::new();
    let mut rs = RunningStatus::none();
    for event in &events {
        event.write(&mut writer, &mut rs, &plain).unwrap();
    }
    assert_eq!(writer.as_slice(), &[0x90, 0x3C, 0x40, 0x90, 0x3E, 0x50]);
}

#[test]
fn encoded_len_matches_write() {
    let messages = [
        note_on(2, 0x40, 0x7F),
        note_on(2, 0x41, 0x7F),
        TrackMessage::Meta(MetaMessage::Tempo(Tempo::new(300_000))),
        TrackMessage::SystemExclusive(SystemExclusiveMessage::new(&[0x7E, 0x00, 0xF7][..])),
        note_on(2, 0x42, 0x10),
        TrackMessage::SystemRealTime(SystemRealTimeMessage::TimingClock),
        note_on(2, 0x42, 0x00),
    ];
    let settings = WriteSettings::default();

    let mut size_rs = RunningStatus::none();
    let mut write_rs = RunningStatus::none();
    for message in &messages {
        let predicted = message.encoded_len(&mut size_rs, &settings);
        let mut writer = Writer::new();
        message.write(&mut writer, &mut write_rs, &settings).unwrap();
        assert_eq!(predicted, writer.position(), "size mismatch for {message:?}");
    }
}

#[test]
fn invalid_data_byte_policies() {
    let bytes = [0x90, 0x3C, 0x85];

    // abort
    let mut reader = Reader::from_byte_slice(&bytes);
    let mut rs = RunningStatus::none();
    let err = TrackMessage::read(&mut reader, &mut rs, &ReadSettings::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &crate::reader::ReadErrorKind::Parse(
            EventError::InvalidParameterValue { value: 0x85 }.into()
        )
    );
    // the failure reports how far the cursor got
    assert_eq!(err.position(), 3);

    // snap to limits
    let mut reader = Reader::from_byte_slice(&bytes);
    let mut rs = RunningStatus::none();
    let settings = ReadSettings {
        invalid_channel_event_parameter_value_policy:
            InvalidChannelEventParameterValuePolicy::SnapToLimits,
        ..ReadSettings::default()
    };
    let message = TrackMessage::read(&mut reader, &mut rs, &settings).unwrap();
    assert_eq!(message, note_on(0, 0x3C, 0x7F));

    // keep the valid bits
    let mut reader = Reader::from_byte_slice(&bytes);
    let mut rs = RunningStatus::none();
    let settings = ReadSettings {
        invalid_channel_event_parameter_value_policy:
            InvalidChannelEventParameterValuePolicy::ReadValid,
        ..ReadSettings::default()
    };
    let message = TrackMessage::read(&mut reader, &mut rs, &settings).unwrap();
    assert_eq!(message, note_on(0, 0x3C, 0x05));
}
