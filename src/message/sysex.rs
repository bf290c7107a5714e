use crate::{
    EventError,
    reader::{ReadResult, Reader},
    vlq::{read_vlq, vlq_len, write_vlq},
    writer::Writer,
};
use alloc::borrow::Cow;

/// How a system exclusive payload entered the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysExForm {
    /// An `F0` event; the leading `F0` of the wire message is implied
    /// and the payload conventionally ends with `F7`.
    Complete,
    /// An `F7` escape event: a continuation of a previous `F0` whose
    /// payload lacked the terminating `F7`, or arbitrary bytes to be
    /// sent verbatim.
    Escape,
}

#[doc = r#"
A system exclusive event.

In a file the payload is length-prefixed rather than terminator-scanned:
`F0 <length> <payload>` or `F7 <length> <payload>`, with the length a
variable-length quantity. A message too long for one event is split, the
first part carrying `F0` and the rest carried by `F7` escape events.
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemExclusiveMessage<'a> {
    form: SysExForm,
    data: Cow<'a, [u8]>,
}

impl<'a> SystemExclusiveMessage<'a> {
    /// Create a complete (`F0`) system exclusive message.
    pub fn new(data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            form: SysExForm::Complete,
            data: data.into(),
        }
    }

    /// Create an `F7` escape continuation.
    pub fn escape(data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            form: SysExForm::Escape,
            data: data.into(),
        }
    }

    /// Which status byte introduced the payload.
    pub const fn form(&self) -> SysExForm {
        self.form
    }

    /// The payload as stored, excluding the introducing status byte.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) const fn status(&self) -> u8 {
        match self.form {
            SysExForm::Complete => 0xF0,
            SysExForm::Escape => 0xF7,
        }
    }

    /// Decode the length-prefixed payload following `status`.
    pub(crate) fn read(reader: &mut Reader<'a>, status: u8) -> ReadResult<Self> {
        let form = if status == 0xF0 {
            SysExForm::Complete
        } else {
            SysExForm::Escape
        };
        let length = read_vlq(reader)? as usize;
        let data = reader.read_exact(length)?;
        Ok(Self {
            form,
            data: Cow::Borrowed(data),
        })
    }

    /// Emit status, length, payload.
    pub(crate) fn write(&self, writer: &mut Writer) -> Result<(), EventError> {
        writer.write_byte(self.status());
        write_vlq(writer, self.data.len() as u32)?;
        writer.write_slice(&self.data);
        Ok(())
    }

    /// The exact byte count [`SystemExclusiveMessage::write`] emits.
    pub(crate) fn encoded_len(&self) -> usize {
        1 + vlq_len(self.data.len() as u32) + self.data.len()
    }

    /// Copy any borrowed payload so the message can outlive its
    /// source buffer.
    pub fn into_owned(self) -> SystemExclusiveMessage<'static> {
        SystemExclusiveMessage {
            form: self.form,
            data: Cow::Owned(self.data.into_owned()),
        }
    }
}

#[test]
fn sysex_length_prefix_round_trip() {
    let bytes = [0x05, 0x43, 0x12, 0x00, 0x07, 0xF7];
    let mut reader = Reader::from_byte_slice(&bytes);
    let message = SystemExclusiveMessage::read(&mut reader, 0xF0).unwrap();
    assert_eq!(message.form(), SysExForm::Complete);
    assert_eq!(message.data(), &[0x43, 0x12, 0x00, 0x07, 0xF7]);

    let mut writer = Writer::new();
    message.write(&mut writer).unwrap();
    assert_eq!(writer.as_slice()[0], 0xF0);
    assert_eq!(&writer.as_slice()[1..], &bytes[..]);
}
