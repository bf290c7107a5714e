#![doc = r#"
Re-exports of the types most callers need.

```
use smfio::prelude::*;
```
"#]

pub use crate::{
    ChunkError, EventError, FileError, ParseError, WriteError, WriteResult,
    bytes::{Channel, DataByte, DataWord},
    file::{
        Advisory, Chunk, ChunkId, ChunkTypeRegistry, CustomChunk, CustomChunkFactory, FormatType,
        HeaderChunk, MidiFile, SmpteFps, SmpteTiming, Timing, Track, UnknownChunk, read_chunk,
        read_chunk_id,
    },
    message::{
        ChannelVoiceMessage, KeySignature, MetaMessage, RunningStatus, SmpteOffset, SysExForm,
        SystemCommonMessage, SystemExclusiveMessage, SystemRealTimeMessage, Tempo, TimeSignature,
        TrackEvent, TrackMessage, VoiceEvent,
    },
    reader::{ReadError, ReadErrorKind, ReadResult, Reader},
    settings::{
        InvalidChannelEventParameterValuePolicy, NotEnoughBytesPolicy, ReadSettings,
        UnknownChunkIdPolicy, WriteSettings,
    },
    tempo::{TempoMap, TempoMapManager},
    vlq::{read_vlq, vlq_len, write_vlq},
    writer::Writer,
};
