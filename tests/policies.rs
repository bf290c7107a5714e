use pretty_assertions::assert_eq;
use smfio::prelude::*;
use std::borrow::Cow;

const EMPTY_TRACK: [u8; 4] = [0x00, 0xFF, 0x2F, 0x00];

fn header(declared_tracks: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x01]);
    bytes.extend_from_slice(&declared_tracks.to_be_bytes());
    bytes.extend_from_slice(&[0x01, 0xE0]);
    bytes
}

fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(id);
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// A header, one empty track, an unregistered `Xtra` chunk, then
/// another empty track.
fn file_with_stray_chunk() -> Vec<u8> {
    let mut bytes = header(2);
    bytes.extend_from_slice(&chunk(b"MTrk", &EMPTY_TRACK));
    bytes.extend_from_slice(&chunk(b"Xtra", &[0x01, 0x02, 0x03, 0x04]));
    bytes.extend_from_slice(&chunk(b"MTrk", &EMPTY_TRACK));
    bytes
}

#[test]
fn unknown_chunk_read_as_unknown() {
    let bytes = file_with_stray_chunk();
    let file = MidiFile::read(&bytes, &ReadSettings::default()).unwrap();

    assert_eq!(file.tracks().len(), 2);
    assert_eq!(file.other_chunks().len(), 1);
    let Chunk::Unknown(unknown) = &file.other_chunks()[0] else {
        panic!("expected an unknown chunk");
    };
    assert_eq!(unknown.id(), ChunkId::new(*b"Xtra"));
    assert_eq!(unknown.data(), &[0x01, 0x02, 0x03, 0x04]);

    // the stray chunk survives a rewrite (reordered after the tracks)
    let rewritten = file.write(&WriteSettings::default()).unwrap();
    let reread = MidiFile::read(&rewritten, &ReadSettings::default()).unwrap();
    assert_eq!(reread.other_chunks().len(), 1);
}

#[test]
fn unknown_chunk_skipped() {
    let bytes = file_with_stray_chunk();
    let settings = ReadSettings {
        unknown_chunk_id_policy: UnknownChunkIdPolicy::Skip,
        ..ReadSettings::default()
    };
    let file = MidiFile::read(&bytes, &settings).unwrap();

    // both tracks parse, nothing else is kept
    assert_eq!(file.tracks().len(), 2);
    assert!(file.other_chunks().is_empty());
    assert!(file.advisories().is_empty());
}

#[test]
fn unknown_chunk_aborts() {
    let bytes = file_with_stray_chunk();
    let settings = ReadSettings {
        unknown_chunk_id_policy: UnknownChunkIdPolicy::Abort,
        ..ReadSettings::default()
    };
    let err = MidiFile::read(&bytes, &settings).unwrap_err();
    assert_eq!(
        err.kind(),
        &ReadErrorKind::Parse(ChunkError::UnknownChunk(ChunkId::new(*b"Xtra")).into())
    );
}

#[test]
fn missing_header_is_fatal() {
    let bytes = chunk(b"MTrk", &EMPTY_TRACK);
    let err = MidiFile::read(&bytes, &ReadSettings::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &ReadErrorKind::Parse(FileError::NoHeaderChunk.into())
    );

    let err = MidiFile::read(&[], &ReadSettings::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &ReadErrorKind::Parse(FileError::NoHeaderChunk.into())
    );
}

#[test]
fn duplicate_header_is_fatal() {
    let mut bytes = header(0);
    bytes.extend_from_slice(&header(0));
    let err = MidiFile::read(&bytes, &ReadSettings::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &ReadErrorKind::Parse(FileError::DuplicateHeader.into())
    );
}

#[test]
fn track_count_mismatch_is_advisory() {
    let mut bytes = header(3);
    bytes.extend_from_slice(&chunk(b"MTrk", &EMPTY_TRACK));

    let file = MidiFile::read(&bytes, &ReadSettings::default()).unwrap();
    assert_eq!(file.tracks().len(), 1);
    assert_eq!(
        file.advisories(),
        [Advisory::TrackCountMismatch {
            declared: 3,
            actual: 1
        }]
    );

    // the rewrite fixes the count
    let rewritten = file.write(&WriteSettings::default()).unwrap();
    let reread = MidiFile::read(&rewritten, &ReadSettings::default()).unwrap();
    assert!(reread.advisories().is_empty());
}

#[test]
fn truncation_follows_policy() {
    let mut bytes = header(1);
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&100u32.to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x90]); // far fewer than 100 bytes

    let err = MidiFile::read(&bytes, &ReadSettings::default()).unwrap_err();
    assert!(err.is_not_enough_bytes());

    let settings = ReadSettings {
        not_enough_bytes_policy: NotEnoughBytesPolicy::Ignore,
        ..ReadSettings::default()
    };
    let file = MidiFile::read(&bytes, &settings).unwrap();
    assert!(file.tracks().is_empty());
    assert!(
        file.advisories()
            .iter()
            .any(|advisory| matches!(advisory, Advisory::TruncatedStream { .. }))
    );
}

#[derive(Debug, Clone, Default)]
struct AuthorChunk {
    name: Vec<u8>,
}

impl CustomChunk for AuthorChunk {
    fn id(&self) -> ChunkId {
        ChunkId::new(*b"Auth")
    }

    fn read_payload(
        &mut self,
        reader: &mut Reader<'_>,
        length: u32,
        _settings: &ReadSettings,
    ) -> ReadResult<()> {
        self.name = reader.read_exact(length as usize)?.to_vec();
        Ok(())
    }

    fn payload(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.name)
    }

    fn clone_box(&self) -> Box<dyn CustomChunk> {
        Box::new(self.clone())
    }
}

#[test]
fn registered_chunk_takes_priority_over_policy() {
    let mut bytes = header(0);
    bytes.extend_from_slice(&chunk(b"Auth", b"johanna"));

    let mut settings = ReadSettings {
        // Abort would reject the id if the registry were ignored
        unknown_chunk_id_policy: UnknownChunkIdPolicy::Abort,
        ..ReadSettings::default()
    };
    settings
        .custom_chunk_types
        .register(ChunkId::new(*b"Auth"), || {
            Box::new(AuthorChunk::default())
        });

    let file = MidiFile::read(&bytes, &settings).unwrap();
    assert_eq!(file.other_chunks().len(), 1);
    let Chunk::Custom(custom) = &file.other_chunks()[0] else {
        panic!("expected a custom chunk");
    };
    assert_eq!(custom.id(), ChunkId::new(*b"Auth"));
    assert_eq!(custom.payload().as_ref(), b"johanna");

    // writes back under its own id
    let rewritten = file.write(&WriteSettings::default()).unwrap();
    assert!(
        rewritten
            .windows(4)
            .any(|window| window == b"Auth")
    );
}

#[test]
fn snapped_values_produce_a_clean_event() {
    let mut bytes = header(1);
    // velocity 0x90 is out of range for a data byte
    bytes.extend_from_slice(&chunk(b"MTrk", &[0x00, 0x91, 0x3C, 0x90, 0x00, 0xFF, 0x2F, 0x00]));

    let settings = ReadSettings {
        invalid_channel_event_parameter_value_policy:
            InvalidChannelEventParameterValuePolicy::SnapToLimits,
        ..ReadSettings::default()
    };
    let file = MidiFile::read(&bytes, &settings).unwrap();
    let TrackMessage::ChannelVoice(message) = file.tracks()[0].events()[0].message() else {
        panic!("expected a channel message");
    };
    assert_eq!(
        message.event(),
        &VoiceEvent::NoteOn {
            key: DataByte::new(0x3C).unwrap(),
            velocity: DataByte::MAX,
        }
    );
}
