#![doc = r#"
The time-mapping engine.

A [`TempoMap`] is an immutable snapshot of a file's tempo and
time-signature history, keyed by absolute tick position, plus the time
division needed to interpret ticks at all. Queries are pure binary
searches over the snapshot, so a map shared between threads needs no
locking: build it once (from a decoded file, or through a
[`TempoMapManager`]) and read it from anywhere.

Conversion between ticks and microseconds is exact integer arithmetic
with round-half-up division, never floating point, so
[`TempoMap::micros_to_tick`] is a true left inverse of
[`TempoMap::tick_to_micros`] at every change tick.
"#]

mod manager;
pub use manager::*;

use crate::{
    file::{MidiFile, Timing},
    message::{Tempo, TimeSignature},
};
use alloc::{collections::BTreeMap, vec::Vec};

const MICROS_PER_SECOND: u128 = 1_000_000;

fn div_round(numerator: u128, denominator: u128) -> u64 {
    ((numerator + denominator / 2) / denominator) as u64
}

#[doc = r#"
An immutable tick-to-time mapping.

A change recorded at tick `t` governs every tick in `[t, next change)`;
ticks before the first change are governed by [`Tempo::DEFAULT`] and
[`TimeSignature::DEFAULT`]. Change keys are strictly increasing with no
duplicates.

Alongside the change list the map holds the cumulative microsecond
position of every tempo change, computed once at construction, so each
conversion is a single binary search plus one multiplication rather
than a rescan of the whole history.
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TempoMap {
    timing: Timing,
    tempo_changes: Vec<(u64, Tempo)>,
    cumulative_micros: Vec<u64>,
    time_signature_changes: Vec<(u64, TimeSignature)>,
}

impl TempoMap {
    /// An empty map: every tick is governed by the defaults.
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            tempo_changes: Vec::new(),
            cumulative_micros: Vec::new(),
            time_signature_changes: Vec::new(),
        }
    }

    /// Build a map from unordered change lists.
    ///
    /// Changes are sorted by tick; a later entry at the same tick
    /// replaces the earlier one.
    pub fn from_changes(
        timing: Timing,
        tempo_changes: impl IntoIterator<Item = (u64, Tempo)>,
        time_signature_changes: impl IntoIterator<Item = (u64, TimeSignature)>,
    ) -> Self {
        let tempo_changes: BTreeMap<u64, Tempo> = tempo_changes.into_iter().collect();
        let time_signature_changes: BTreeMap<u64, TimeSignature> =
            time_signature_changes.into_iter().collect();

        let tempo_changes: Vec<(u64, Tempo)> = tempo_changes.into_iter().collect();
        let cumulative_micros = cumulative_micros(&timing, &tempo_changes);

        Self {
            timing,
            tempo_changes,
            cumulative_micros,
            time_signature_changes: time_signature_changes.into_iter().collect(),
        }
    }

    /// Derive the map from the meta events of every track of a
    /// decoded file, merged into one global timeline.
    pub fn from_file(file: &MidiFile<'_>) -> Self {
        TempoMapManager::from_file(file).commit()
    }

    /// The time division the map interprets ticks with.
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// The recorded tempo changes, ordered by tick.
    pub fn tempo_changes(&self) -> &[(u64, Tempo)] {
        &self.tempo_changes
    }

    /// The recorded time-signature changes, ordered by tick.
    pub fn time_signature_changes(&self) -> &[(u64, TimeSignature)] {
        &self.time_signature_changes
    }

    /// The tempo in effect at `tick`.
    pub fn tempo_at(&self, tick: u64) -> Tempo {
        match self.tempo_changes.partition_point(|(t, _)| *t <= tick) {
            0 => Tempo::DEFAULT,
            i => self.tempo_changes[i - 1].1,
        }
    }

    /// The time signature in effect at `tick`.
    pub fn time_signature_at(&self, tick: u64) -> TimeSignature {
        match self
            .time_signature_changes
            .partition_point(|(t, _)| *t <= tick)
        {
            0 => TimeSignature::DEFAULT,
            i => self.time_signature_changes[i - 1].1,
        }
    }

    /// The microsecond position of `tick`.
    ///
    /// For a quarter-note division this accumulates every tempo
    /// segment before `tick` (pre-summed at construction) plus the
    /// partial final segment. For an SMPTE division the rate is fixed
    /// by frames times ticks per frame and tempo is ignored entirely.
    pub fn tick_to_micros(&self, tick: u64) -> u64 {
        match self.timing {
            Timing::Smpte(smpte) => {
                let rate = smpte.ticks_per_second();
                if rate == 0 {
                    return 0;
                }
                div_round(tick as u128 * MICROS_PER_SECOND, rate as u128)
            }
            Timing::TicksPerQuarterNote(tpqn) => {
                let tpqn = tpqn.max(1);
                let i = self.tempo_changes.partition_point(|(t, _)| *t <= tick);
                let (segment_tick, tempo, base) = if i == 0 {
                    (0, Tempo::DEFAULT, 0)
                } else {
                    (
                        self.tempo_changes[i - 1].0,
                        self.tempo_changes[i - 1].1,
                        self.cumulative_micros[i - 1],
                    )
                };
                base + div_round(
                    (tick - segment_tick) as u128 * tempo.micros_per_quarter_note() as u128,
                    tpqn as u128,
                )
            }
        }
    }

    /// The tick position of `micros`, the left inverse of
    /// [`TempoMap::tick_to_micros`].
    ///
    /// Finds the tempo segment whose cumulative range contains
    /// `micros` and interpolates within it.
    pub fn micros_to_tick(&self, micros: u64) -> u64 {
        match self.timing {
            Timing::Smpte(smpte) => {
                div_round(micros as u128 * smpte.ticks_per_second() as u128, MICROS_PER_SECOND)
            }
            Timing::TicksPerQuarterNote(tpqn) => {
                let tpqn = tpqn.max(1);
                let i = self.cumulative_micros.partition_point(|c| *c <= micros);
                let (segment_tick, tempo, base) = if i == 0 {
                    (0, Tempo::DEFAULT, 0)
                } else {
                    (
                        self.tempo_changes[i - 1].0,
                        self.tempo_changes[i - 1].1,
                        self.cumulative_micros[i - 1],
                    )
                };
                let tempo = tempo.micros_per_quarter_note();
                if tempo == 0 {
                    return segment_tick;
                }
                segment_tick + div_round((micros - base) as u128 * tpqn as u128, tempo as u128)
            }
        }
    }
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

/// The microsecond position of each tempo change, in change order.
fn cumulative_micros(timing: &Timing, tempo_changes: &[(u64, Tempo)]) -> Vec<u64> {
    let Timing::TicksPerQuarterNote(tpqn) = timing else {
        // smpte conversion never consults tempo
        return Vec::new();
    };
    let tpqn = (*tpqn).max(1) as u128;

    let mut out = Vec::with_capacity(tempo_changes.len());
    let mut micros: u64 = 0;
    let mut previous_tick: u64 = 0;
    let mut previous_tempo = Tempo::DEFAULT;
    for (tick, tempo) in tempo_changes {
        micros += div_round(
            (tick - previous_tick) as u128 * previous_tempo.micros_per_quarter_note() as u128,
            tpqn,
        );
        out.push(micros);
        previous_tick = *tick;
        previous_tempo = *tempo;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::DataByte;
    use crate::file::SmpteFps;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_govern_every_tick() {
        let map = TempoMap::default();
        assert_eq!(map.tempo_at(0), Tempo::DEFAULT);
        assert_eq!(map.tempo_at(u64::MAX), Tempo::DEFAULT);
        assert_eq!(map.time_signature_at(0), TimeSignature::DEFAULT);
        assert_eq!(map.time_signature_at(1 << 40), TimeSignature::DEFAULT);
        assert_eq!(map.time_signature_at(0).denominator(), 4);
    }

    #[test]
    fn change_governs_from_its_tick() {
        let map = TempoMap::from_changes(
            Timing::new_ticks_per_quarter_note(480),
            [(1000, Tempo::new(300_000))],
            [(1000, TimeSignature::new(3, 4))],
        );
        assert_eq!(map.tempo_at(999), Tempo::DEFAULT);
        assert_eq!(map.tempo_at(1000), Tempo::new(300_000));
        assert_eq!(map.tempo_at(5000), Tempo::new(300_000));
        assert_eq!(map.time_signature_at(999), TimeSignature::DEFAULT);
        assert_eq!(map.time_signature_at(1000).numerator, 3);
    }

    #[test]
    fn same_tick_change_last_wins() {
        let map = TempoMap::from_changes(
            Timing::new_ticks_per_quarter_note(480),
            [(0, Tempo::new(400_000)), (0, Tempo::new(250_000))],
            [],
        );
        assert_eq!(map.tempo_changes(), &[(0, Tempo::new(250_000))]);
    }

    #[test]
    fn micros_round_trip_across_segments() {
        let map = TempoMap::from_changes(
            Timing::new_ticks_per_quarter_note(480),
            [
                (0, Tempo::new(500_000)),
                (1000, Tempo::new(300_000)),
                (1500, Tempo::new(700_000)),
            ],
            [],
        );
        for tick in [0, 999, 1000, 1499, 1500, 5000] {
            assert_eq!(
                map.micros_to_tick(map.tick_to_micros(tick)),
                tick,
                "round trip failed at tick {tick}"
            );
        }
    }

    #[test]
    fn constant_tempo_positions() {
        // one quarter note per half second at 480 tpqn
        let map = TempoMap::new(Timing::new_ticks_per_quarter_note(480));
        assert_eq!(map.tick_to_micros(0), 0);
        assert_eq!(map.tick_to_micros(480), 500_000);
        assert_eq!(map.tick_to_micros(720), 750_000);
        assert_eq!(map.micros_to_tick(750_000), 720);
    }

    #[test]
    fn tempo_changes_shift_later_positions() {
        let map = TempoMap::from_changes(
            Timing::new_ticks_per_quarter_note(480),
            [(480, Tempo::new(250_000))],
            [],
        );
        // first quarter at the default rate, second at double speed
        assert_eq!(map.tick_to_micros(480), 500_000);
        assert_eq!(map.tick_to_micros(960), 750_000);
    }

    #[test]
    fn smpte_rate_ignores_tempo() {
        let timing = Timing::new_smpte(SmpteFps::Thirty, DataByte::new(40).unwrap());
        let map = TempoMap::from_changes(timing, [(0, Tempo::new(1))], []);
        // 30 fps x 40 ticks per frame = 1200 ticks per second
        assert_eq!(map.tick_to_micros(1200), 1_000_000);
        assert_eq!(map.tick_to_micros(600), 500_000);
        assert_eq!(map.micros_to_tick(500_000), 600);
    }
}
