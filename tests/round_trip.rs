use pretty_assertions::assert_eq;
use smfio::prelude::*;

/// Helper to assemble a file from raw track payloads.
///
/// Writes the header, then each payload wrapped in an `MTrk` envelope
/// with its length backpatched.
fn build_file(format: u16, declared_tracks: u16, division: [u8; 2], tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = Vec::new();

    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&declared_tracks.to_be_bytes());
    bytes.extend_from_slice(&division);

    for payload in tracks {
        bytes.extend_from_slice(b"MTrk");
        let length_pos = bytes.len();
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(payload);
        let length = (bytes.len() - length_pos - 4) as u32;
        bytes[length_pos..length_pos + 4].copy_from_slice(&length.to_be_bytes());
    }

    bytes
}

#[test]
fn note_pair_scenario() {
    // note on, then note off 96 ticks later; no end of track
    let payload = [0x00, 0x90, 0x3C, 0x40, 0x60, 0x80, 0x3C, 0x40];
    let bytes = build_file(0, 1, [0x01, 0xE0], &[&payload]);

    let file = MidiFile::read(&bytes, &ReadSettings::default()).unwrap();
    assert_eq!(file.format(), FormatType::SingleMultiChannel);
    assert_eq!(file.timing(), Timing::TicksPerQuarterNote(480));
    assert_eq!(file.tracks().len(), 1);

    let events = file.tracks()[0].events();
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].delta_ticks(), 0);
    let TrackMessage::ChannelVoice(on) = events[0].message() else {
        panic!("expected a channel message");
    };
    assert_eq!(on.channel(), Channel::new(0).unwrap());
    assert_eq!(
        on.event(),
        &VoiceEvent::NoteOn {
            key: DataByte::new(60).unwrap(),
            velocity: DataByte::new(64).unwrap(),
        }
    );

    assert_eq!(events[1].delta_ticks(), 96);
    let TrackMessage::ChannelVoice(off) = events[1].message() else {
        panic!("expected a channel message");
    };
    assert_eq!(off.status(), 0x80);
}

#[test]
fn running_status_does_not_cross_chunks() {
    // the first track establishes a running status; the second opens
    // with a data byte, which must fail because the register resets
    // at every chunk boundary
    let first = [0x00, 0x90, 0x3C, 0x40];
    let second = [0x00, 0x3C, 0x40];
    let bytes = build_file(1, 2, [0x01, 0xE0], &[&first, &second]);

    let err = MidiFile::read(&bytes, &ReadSettings::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &ReadErrorKind::Parse(EventError::MissingStatusByte.into())
    );
}

#[test]
fn compressed_stream_decodes_like_a_plain_one() {
    // second note on omits its status byte
    let compressed_bytes = build_file(0, 1, [0x01, 0xE0], &[&[0x00, 0x90, 0x3C, 0x40, 0x10, 0x3E, 0x50]]);
    let plain_bytes = build_file(
        0,
        1,
        [0x01, 0xE0],
        &[&[0x00, 0x90, 0x3C, 0x40, 0x10, 0x90, 0x3E, 0x50]],
    );

    let compressed = MidiFile::read(&compressed_bytes, &ReadSettings::default()).unwrap();
    let plain = MidiFile::read(&plain_bytes, &ReadSettings::default()).unwrap();

    assert_eq!(compressed.tracks()[0].events(), plain.tracks()[0].events());
}

fn voice(channel: u8, event: VoiceEvent) -> TrackMessage<'static> {
    TrackMessage::ChannelVoice(ChannelVoiceMessage::new(
        Channel::new(channel).unwrap(),
        event,
    ))
}

fn demo_file() -> MidiFile<'static> {
    let mut file = MidiFile::new(
        FormatType::Simultaneous,
        Timing::new_ticks_per_quarter_note(480),
    );

    let conductor: Track = [
        TrackEvent::new(0, TrackMessage::Meta(MetaMessage::Tempo(Tempo::new(600_000)))),
        TrackEvent::new(
            0,
            TrackMessage::Meta(MetaMessage::TimeSignature(TimeSignature::new(3, 4))),
        ),
        TrackEvent::new(
            0,
            TrackMessage::Meta(MetaMessage::TrackName(b"conductor"[..].into())),
        ),
        TrackEvent::new(0, TrackMessage::Meta(MetaMessage::EndOfTrack)),
    ]
    .into_iter()
    .collect();

    let notes: Track = [
        TrackEvent::new(
            0,
            voice(
                3,
                VoiceEvent::ProgramChange {
                    program: DataByte::new(24).unwrap(),
                },
            ),
        ),
        TrackEvent::new(
            0,
            voice(
                3,
                VoiceEvent::NoteOn {
                    key: DataByte::new(60).unwrap(),
                    velocity: DataByte::new(100).unwrap(),
                },
            ),
        ),
        TrackEvent::new(
            240,
            voice(
                3,
                VoiceEvent::NoteOn {
                    key: DataByte::new(64).unwrap(),
                    velocity: DataByte::new(100).unwrap(),
                },
            ),
        ),
        TrackEvent::new(
            240,
            voice(
                3,
                VoiceEvent::NoteOff {
                    key: DataByte::new(60).unwrap(),
                    velocity: DataByte::new(0).unwrap(),
                },
            ),
        ),
        TrackEvent::new(
            0,
            voice(
                3,
                VoiceEvent::PitchBend {
                    bend: DataWord::MID,
                },
            ),
        ),
        TrackEvent::new(
            60,
            TrackMessage::SystemExclusive(SystemExclusiveMessage::new(
                &[0x7E, 0x7F, 0x09, 0x01, 0xF7][..],
            )),
        ),
        TrackEvent::new(0, TrackMessage::Meta(MetaMessage::EndOfTrack)),
    ]
    .into_iter()
    .collect();

    file.add_track(conductor);
    file.add_track(notes);
    file
}

#[test]
fn write_then_reread_is_identity() {
    let file = demo_file();
    let settings = WriteSettings::default();

    let bytes = file.write(&settings).unwrap();
    let reread = MidiFile::read(&bytes, &ReadSettings::default()).unwrap();

    assert_eq!(reread.format(), file.format());
    assert_eq!(reread.timing(), file.timing());
    assert_eq!(reread.tracks().len(), file.tracks().len());
    for (written, read) in file.tracks().iter().zip(reread.tracks()) {
        assert_eq!(written.events(), read.events());
    }
    assert!(reread.advisories().is_empty());

    // a second write reproduces the bytes exactly
    assert_eq!(reread.write(&settings).unwrap(), bytes);
}

#[test]
fn compression_changes_bytes_but_not_meaning() {
    let file = demo_file();
    let compressed = file
        .write(&WriteSettings {
            use_running_status: true,
        })
        .unwrap();
    let plain = file
        .write(&WriteSettings {
            use_running_status: false,
        })
        .unwrap();

    assert!(compressed.len() < plain.len());

    let from_compressed = MidiFile::read(&compressed, &ReadSettings::default()).unwrap();
    let from_plain = MidiFile::read(&plain, &ReadSettings::default()).unwrap();
    for (a, b) in from_compressed.tracks().iter().zip(from_plain.tracks()) {
        assert_eq!(a.events(), b.events());
    }
}

#[test]
fn declared_lengths_match_payloads() {
    let bytes = demo_file().write(&WriteSettings::default()).unwrap();

    // walk the raw chunk structure independently of the parser
    let mut offset = 0;
    let mut chunks = Vec::new();
    while offset < bytes.len() {
        let id: [u8; 4] = bytes[offset..offset + 4].try_into().unwrap();
        let length =
            u32::from_be_bytes(bytes[offset + 4..offset + 8].try_into().unwrap()) as usize;
        chunks.push((id, length));
        offset += 8 + length;
    }

    assert_eq!(offset, bytes.len(), "declared lengths must tile the file");
    assert_eq!(chunks[0], (*b"MThd", 6));
    assert_eq!(chunks.len(), 3);
    assert!(chunks[1..].iter().all(|(id, _)| id == b"MTrk"));
}
