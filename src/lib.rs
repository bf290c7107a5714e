#![no_std]
#![doc = r#"
Read, write, and time-interpret Standard MIDI Files.

The crate is split into two cores that everything else consumes:

- the **binary codec** ([`file::MidiFile`], [`message::TrackMessage`]):
  chunk and event decoding/encoding with running-status compression,
  variable-length quantities, and policy-driven handling of malformed or
  unknown input ([`settings::ReadSettings`]);
- the **time-mapping engine** ([`tempo::TempoMap`]): converts event tick
  positions into microseconds (and back) against the tempo and
  time-signature history embedded in a file, or one built from scratch
  with [`tempo::TempoMapManager`].

# Reading a file

```
use smfio::prelude::*;

let bytes: &[u8] = &[
    0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, // MThd, length 6
    0x00, 0x00, 0x00, 0x01, 0x01, 0xE0,             // format 0, 1 track, 480 tpqn
    0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x0C, // MTrk, length 12
    0x00, 0x90, 0x3C, 0x40,                         // note on
    0x60, 0x80, 0x3C, 0x40,                         // note off, 96 ticks later
    0x00, 0xFF, 0x2F, 0x00,                         // end of track
];

let file = MidiFile::read(bytes, &ReadSettings::default())?;
assert_eq!(file.tracks().len(), 1);

let map = TempoMap::from_file(&file);
assert_eq!(map.tempo_at(0), Tempo::DEFAULT);
# Ok::<(), smfio::reader::ReadError>(())
```
"#]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod bytes;
pub mod file;
pub mod message;
pub mod reader;
pub mod settings;
pub mod tempo;
pub mod vlq;
pub mod writer;

mod error;
pub use error::*;

pub mod prelude;
