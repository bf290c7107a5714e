use super::TempoMap;
use crate::{
    file::{MidiFile, Timing},
    message::{MetaMessage, Tempo, TimeSignature, TrackMessage},
};
use alloc::collections::BTreeMap;

#[doc = r#"
A mutable, transactional builder for [`TempoMap`]s.

Edits accumulate in a working copy; nothing published is ever touched.
[`TempoMapManager::commit`] derives a fresh immutable snapshot, so a
reader holding an earlier snapshot keeps a consistent timeline no
matter what the manager does afterwards. The manager itself follows
single-writer discipline: it is not meant to be shared between
concurrently mutating callers.

```
use smfio::prelude::*;

let mut manager = TempoMapManager::new(Timing::new_ticks_per_quarter_note(480));
manager.set_tempo(0, Tempo::from_beats_per_minute(90.0));
manager.set_time_signature(0, TimeSignature::new(3, 4));

let before = manager.commit();
manager.set_tempo(960, Tempo::from_beats_per_minute(180.0));
let after = manager.commit();

assert_eq!(before.tempo_changes().len(), 1);
assert_eq!(after.tempo_changes().len(), 2);
```
"#]
#[derive(Debug, Clone, Default)]
pub struct TempoMapManager {
    timing: Timing,
    tempo_changes: BTreeMap<u64, Tempo>,
    time_signature_changes: BTreeMap<u64, TimeSignature>,
}

impl TempoMapManager {
    /// Create a manager with no recorded changes.
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            tempo_changes: BTreeMap::new(),
            time_signature_changes: BTreeMap::new(),
        }
    }

    /// Seed a manager from the meta events of every track of a
    /// decoded file.
    ///
    /// Tracks are scanned in file order with their delta-times
    /// accumulated to absolute ticks; a later track's change at an
    /// equal tick replaces the earlier one, merging the per-track
    /// histories into one global timeline.
    pub fn from_file(file: &MidiFile<'_>) -> Self {
        let mut manager = Self::new(file.timing());
        for track in file.tracks() {
            for (tick, message) in track.iter_absolute() {
                match message {
                    TrackMessage::Meta(MetaMessage::Tempo(tempo)) => {
                        manager.set_tempo(tick, *tempo);
                    }
                    TrackMessage::Meta(MetaMessage::TimeSignature(signature)) => {
                        manager.set_time_signature(tick, *signature);
                    }
                    _ => {}
                }
            }
        }
        manager
    }

    /// The time division committed snapshots will carry.
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// Record (or replace) a tempo change at `tick`.
    pub fn set_tempo(&mut self, tick: u64, tempo: Tempo) {
        self.tempo_changes.insert(tick, tempo);
    }

    /// Remove the tempo change at `tick`, returning it if present.
    pub fn remove_tempo_change(&mut self, tick: u64) -> Option<Tempo> {
        self.tempo_changes.remove(&tick)
    }

    /// Record (or replace) a time-signature change at `tick`.
    pub fn set_time_signature(&mut self, tick: u64, signature: TimeSignature) {
        self.time_signature_changes.insert(tick, signature);
    }

    /// Remove the time-signature change at `tick`, returning it if
    /// present.
    pub fn remove_time_signature_change(&mut self, tick: u64) -> Option<TimeSignature> {
        self.time_signature_changes.remove(&tick)
    }

    /// Discard every recorded change.
    pub fn clear(&mut self) {
        self.tempo_changes.clear();
        self.time_signature_changes.clear();
    }

    /// Publish the working state as a fresh immutable snapshot.
    ///
    /// The manager stays usable; snapshots handed out earlier are
    /// unaffected by anything recorded after their commit.
    pub fn commit(&self) -> TempoMap {
        TempoMap::from_changes(
            self.timing,
            self.tempo_changes.iter().map(|(tick, tempo)| (*tick, *tempo)),
            self.time_signature_changes
                .iter()
                .map(|(tick, signature)| (*tick, *signature)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn commit_is_copy_on_write() {
        let mut manager = TempoMapManager::new(Timing::new_ticks_per_quarter_note(480));
        manager.set_tempo(0, Tempo::new(400_000));

        let snapshot = manager.commit();
        manager.set_tempo(0, Tempo::new(200_000));
        manager.set_tempo(960, Tempo::new(100_000));

        // the published snapshot still shows the state at commit time
        assert_eq!(snapshot.tempo_at(960), Tempo::new(400_000));
        assert_eq!(snapshot.tempo_changes().len(), 1);

        let replaced = manager.commit();
        assert_eq!(replaced.tempo_at(0), Tempo::new(200_000));
        assert_eq!(replaced.tempo_at(960), Tempo::new(100_000));
    }

    #[test]
    fn remove_restores_the_default() {
        let mut manager = TempoMapManager::new(Timing::new_ticks_per_quarter_note(96));
        manager.set_tempo(10, Tempo::new(100_000));
        manager.set_time_signature(10, TimeSignature::new(7, 8));

        assert_eq!(manager.remove_tempo_change(10), Some(Tempo::new(100_000)));
        assert_eq!(manager.remove_tempo_change(10), None);
        manager.remove_time_signature_change(10);

        let map = manager.commit();
        assert_eq!(map.tempo_at(10), Tempo::DEFAULT);
        assert_eq!(map.time_signature_at(10), TimeSignature::DEFAULT);
    }

    #[test]
    fn snapshots_are_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TempoMap>();
    }
}
