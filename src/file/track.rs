use super::Advisory;
use crate::{
    EventError,
    message::{MetaMessage, RunningStatus, TrackEvent, TrackMessage},
    reader::{ReadError, ReadResult, Reader},
    settings::{ReadSettings, WriteSettings},
    writer::Writer,
};
use alloc::vec::Vec;

#[doc = r#"
An ordered sequence of delta-timed events, the payload of an `MTrk`
chunk.

Running status is established afresh for every track: the register
starts the payload as "none" and whatever it ends as is discarded,
never carried into the next chunk.
"#]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Track<'a> {
    events: Vec<TrackEvent<'a>>,
}

impl<'a> Track<'a> {
    /// Create a track from events.
    pub fn new(events: Vec<TrackEvent<'a>>) -> Self {
        Self { events }
    }

    /// The events in track order.
    pub fn events(&self) -> &[TrackEvent<'a>] {
        &self.events
    }

    /// Append an event.
    pub fn push(&mut self, event: TrackEvent<'a>) {
        self.events.push(event);
    }

    /// Walk the events with their delta-times accumulated into
    /// absolute tick positions.
    pub fn iter_absolute(&self) -> impl Iterator<Item = (u64, &TrackMessage<'a>)> {
        self.events.iter().scan(0u64, |tick, event| {
            *tick += u64::from(event.delta_ticks());
            Some((*tick, event.message()))
        })
    }

    /// True if the final event is the End of Track meta event.
    pub fn has_end_of_track(&self) -> bool {
        matches!(
            self.events.last().map(TrackEvent::message),
            Some(TrackMessage::Meta(MetaMessage::EndOfTrack))
        )
    }

    /// Copy any borrowed payloads so the track can outlive its source
    /// buffer.
    pub fn into_owned(self) -> Track<'static> {
        Track {
            events: self
                .events
                .into_iter()
                .map(TrackEvent::into_owned)
                .collect(),
        }
    }

    /// Decode a track payload of `length` bytes.
    ///
    /// An End of Track meta event, if present, must be the final
    /// event; payload bytes after it are skipped and reported as an
    /// advisory rather than parsed or rejected.
    pub(crate) fn read(
        reader: &mut Reader<'a>,
        length: u32,
        settings: &ReadSettings,
        advisories: &mut Vec<Advisory>,
    ) -> ReadResult<Self> {
        let length = length as usize;
        let start = reader.buffer_position();
        if reader.remaining() < length {
            return Err(ReadError::not_enough_bytes(
                start,
                length,
                reader.remaining(),
            ));
        }
        let end = start + length;

        let mut events = Vec::new();
        let mut running_status = RunningStatus::none();

        while reader.buffer_position() < end {
            let event = TrackEvent::read(reader, &mut running_status, settings)?;
            let is_end_of_track =
                matches!(event.message(), TrackMessage::Meta(MetaMessage::EndOfTrack));
            events.push(event);

            if is_end_of_track {
                let position = reader.buffer_position();
                if position < end {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        position,
                        bytes = end - position,
                        "skipping track bytes after end of track"
                    );
                    advisories.push(Advisory::TrailingDataAfterEndOfTrack {
                        position,
                        bytes: end - position,
                    });
                    reader.set_position(end);
                }
                break;
            }
        }

        // a malformed final event can overrun the declared length
        if reader.buffer_position() > end {
            return Err(ReadError::not_enough_bytes(
                end,
                reader.buffer_position() - start,
                length,
            ));
        }

        Ok(Self { events })
    }

    /// The payload byte count [`Track::write_payload`] will emit,
    /// computed with a mirrored running-status pre-pass instead of a
    /// throwaway encode.
    pub(crate) fn payload_len(&self, settings: &WriteSettings) -> usize {
        let mut running_status = RunningStatus::none();
        let events: usize = self
            .events
            .iter()
            .map(|event| event.encoded_len(&mut running_status, settings))
            .sum();
        // a terminating end of track is supplied when missing
        events + if self.has_end_of_track() { 0 } else { 4 }
    }

    /// Emit the payload; the envelope is the caller's business.
    pub(crate) fn write_payload(
        &self,
        writer: &mut Writer,
        settings: &WriteSettings,
    ) -> Result<(), EventError> {
        let mut running_status = RunningStatus::none();
        for event in &self.events {
            event.write(writer, &mut running_status, settings)?;
        }
        if !self.has_end_of_track() {
            TrackEvent::new(0, TrackMessage::Meta(MetaMessage::EndOfTrack)).write(
                writer,
                &mut running_status,
                settings,
            )?;
        }
        Ok(())
    }
}

impl<'a> FromIterator<TrackEvent<'a>> for Track<'a> {
    fn from_iter<T: IntoIterator<Item = TrackEvent<'a>>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

#[test]
fn track_payload_round_trip() {
    use pretty_assertions::assert_eq;

    // 00 90 3C 40 / 60 80 3C 40 / 00 FF 2F 00
    let bytes = [
        0x00, 0x90, 0x3C, 0x40, 0x60, 0x80, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00,
    ];
    let mut reader = Reader::from_byte_slice(&bytes);
    let mut advisories = Vec::new();
    let track = Track::read(
        &mut reader,
        bytes.len() as u32,
        &ReadSettings::default(),
        &mut advisories,
    )
    .unwrap();

    assert_eq!(track.events().len(), 3);
    assert_eq!(track.events()[1].delta_ticks(), 0x60);
    assert!(track.has_end_of_track());
    assert!(advisories.is_empty());

    let settings = WriteSettings {
        use_running_status: false,
    };
    assert_eq!(track.payload_len(&settings), bytes.len());
    let mut writer = Writer::new();
    track.write_payload(&mut writer, &settings).unwrap();
    assert_eq!(writer.as_slice(), &bytes[..]);
}

#[test]
fn trailing_bytes_after_end_of_track_are_advisory() {
    let bytes = [
        0x00, 0xFF, 0x2F, 0x00, // end of track
        0xDE, 0xAD, // junk inside the declared length
    ];
    let mut reader = Reader::from_byte_slice(&bytes);
    let mut advisories = Vec::new();
    let track = Track::read(
        &mut reader,
        bytes.len() as u32,
        &ReadSettings::default(),
        &mut advisories,
    )
    .unwrap();

    assert_eq!(track.events().len(), 1);
    assert_eq!(
        advisories,
        [Advisory::TrailingDataAfterEndOfTrack {
            position: 4,
            bytes: 2
        }]
    );
    // the cursor still lands at the declared end
    assert_eq!(reader.buffer_position(), bytes.len());
}

#[test]
fn missing_end_of_track_is_supplied_on_write() {
    use crate::bytes::{Channel, DataByte};
    use crate::message::{ChannelVoiceMessage, VoiceEvent};

    let track: Track = [TrackEvent::new(
        0,
        TrackMessage::ChannelVoice(ChannelVoiceMessage::new(
            Channel::new(0).unwrap(),
            VoiceEvent::ProgramChange {
                program: DataByte::new(5).unwrap(),
            },
        )),
    )]
    .into_iter()
    .collect();

    let settings = WriteSettings::default();
    let mut writer = Writer::new();
    track.write_payload(&mut writer, &settings).unwrap();
    assert_eq!(writer.as_slice(), &[0x00, 0xC0, 0x05, 0x00, 0xFF, 0x2F, 0x00]);
    assert_eq!(track.payload_len(&settings), 7);
}
