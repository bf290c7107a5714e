use pretty_assertions::assert_eq;
use smfio::prelude::*;

fn tempo_event(delta: u32, micros_per_quarter: u32) -> TrackEvent<'static> {
    TrackEvent::new(
        delta,
        TrackMessage::Meta(MetaMessage::Tempo(Tempo::new(micros_per_quarter))),
    )
}

fn time_signature_event(delta: u32, numerator: u8, denominator: u8) -> TrackEvent<'static> {
    TrackEvent::new(
        delta,
        TrackMessage::Meta(MetaMessage::TimeSignature(TimeSignature::new(
            numerator,
            denominator,
        ))),
    )
}

/// Write and re-read a file so the map is derived from decoded bytes,
/// not from in-memory structures.
fn rebuild(file: &MidiFile<'_>) -> TempoMap {
    let bytes = file.write(&WriteSettings::default()).unwrap();
    let reread = MidiFile::read(&bytes, &ReadSettings::default()).unwrap();
    TempoMap::from_file(&reread)
}

#[test]
fn map_without_meta_events_uses_defaults() {
    let mut file = MidiFile::new(
        FormatType::SingleMultiChannel,
        Timing::new_ticks_per_quarter_note(480),
    );
    file.add_track(Track::default());

    let map = rebuild(&file);
    assert!(map.tempo_changes().is_empty());
    assert_eq!(map.tempo_at(0), Tempo::DEFAULT);
    assert_eq!(map.tempo_at(1 << 30), Tempo::DEFAULT);
    assert_eq!(map.time_signature_at(0), TimeSignature::DEFAULT);
    assert_eq!(map.time_signature_at(1 << 30), TimeSignature::DEFAULT);
}

#[test]
fn map_scans_meta_events_at_absolute_ticks() {
    let mut file = MidiFile::new(
        FormatType::SingleMultiChannel,
        Timing::new_ticks_per_quarter_note(480),
    );
    let track: Track = [
        tempo_event(0, 500_000),
        time_signature_event(0, 4, 4),
        tempo_event(1000, 300_000),
        tempo_event(500, 700_000),
        time_signature_event(0, 6, 8),
        TrackEvent::new(0, TrackMessage::Meta(MetaMessage::EndOfTrack)),
    ]
    .into_iter()
    .collect();
    file.add_track(track);

    let map = rebuild(&file);
    assert_eq!(
        map.tempo_changes(),
        [
            (0, Tempo::new(500_000)),
            (1000, Tempo::new(300_000)),
            (1500, Tempo::new(700_000)),
        ]
    );

    assert_eq!(map.tempo_at(0), Tempo::new(500_000));
    assert_eq!(map.tempo_at(1499), Tempo::new(300_000));
    assert_eq!(map.time_signature_at(1499), TimeSignature::DEFAULT);
    assert_eq!(map.time_signature_at(1500).numerator, 6);
    assert_eq!(map.time_signature_at(1500).denominator(), 8);

    // the documented exactness law, via actual file bytes
    for tick in [0, 999, 1000, 1499, 1500, 5000] {
        assert_eq!(map.micros_to_tick(map.tick_to_micros(tick)), tick);
    }
}

#[test]
fn per_track_histories_merge_into_one_timeline() {
    let mut file = MidiFile::new(
        FormatType::Simultaneous,
        Timing::new_ticks_per_quarter_note(96),
    );
    let first: Track = [
        tempo_event(0, 500_000),
        TrackEvent::new(0, TrackMessage::Meta(MetaMessage::EndOfTrack)),
    ]
    .into_iter()
    .collect();
    let second: Track = [
        // same tick as the first track's change: the later track wins
        tempo_event(0, 250_000),
        tempo_event(384, 125_000),
        TrackEvent::new(0, TrackMessage::Meta(MetaMessage::EndOfTrack)),
    ]
    .into_iter()
    .collect();
    file.add_track(first);
    file.add_track(second);

    let map = rebuild(&file);
    assert_eq!(
        map.tempo_changes(),
        [(0, Tempo::new(250_000)), (384, Tempo::new(125_000))]
    );
    assert_eq!(map.tempo_at(383), Tempo::new(250_000));
    assert_eq!(map.tempo_at(384), Tempo::new(125_000));
}

#[test]
fn manager_edits_round_trip_through_commit() {
    let mut manager = TempoMapManager::new(Timing::new_ticks_per_quarter_note(480));
    manager.set_tempo(0, Tempo::from_beats_per_minute(100.0));
    manager.set_tempo(960, Tempo::from_beats_per_minute(140.0));
    manager.set_time_signature(960, TimeSignature::new(5, 4));

    let map = manager.commit();
    for &(tick, _) in map.tempo_changes() {
        assert_eq!(map.micros_to_tick(map.tick_to_micros(tick)), tick);
    }
    assert_eq!(map.tempo_at(500), Tempo::from_beats_per_minute(100.0));
    assert_eq!(map.time_signature_at(959), TimeSignature::DEFAULT);
    assert_eq!(map.time_signature_at(960).numerator, 5);

    manager.remove_tempo_change(960);
    let map = manager.commit();
    assert_eq!(map.tempo_at(960), Tempo::from_beats_per_minute(100.0));
}
