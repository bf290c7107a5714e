#![doc = r#"
Variable-length quantities.

Delta-times and meta/sysex lengths are stored as 1-4 bytes of seven
payload bits each, most significant group first, with the high bit of
every byte except the last set as a continuation flag. The largest
representable value is [`MAX`] (`2^28 - 1`).
"#]

use crate::{
    EventError,
    reader::{ReadResult, Reader},
    writer::Writer,
};

/// The largest value a variable-length quantity can carry.
pub const MAX: u32 = 0x0FFF_FFFF;

/// Decode a variable-length quantity, advancing the reader past
/// exactly the bytes that make it up.
///
/// Fails with `NotEnoughBytes` if the source ends before a byte with
/// a clear high bit, and with
/// [`EventError::ValueTooLarge`] if a fifth continuation byte appears.
pub fn read_vlq(reader: &mut Reader<'_>) -> ReadResult<u32> {
    let mut value: u32 = 0;
    for _ in 0..4 {
        let byte = reader.read_byte()?;
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(reader.parse_error(EventError::ValueTooLarge(value)))
}

/// Encode `value` as a minimal variable-length quantity.
///
/// Fails with [`EventError::ValueTooLarge`] above [`MAX`].
pub fn write_vlq(writer: &mut Writer, value: u32) -> Result<(), EventError> {
    if value > MAX {
        return Err(EventError::ValueTooLarge(value));
    }
    let mut started = false;
    for shift in [21, 14, 7] {
        let group = ((value >> shift) & 0x7F) as u8;
        if started || group != 0 {
            writer.write_byte(group | 0x80);
            started = true;
        }
    }
    writer.write_byte((value & 0x7F) as u8);
    Ok(())
}

/// The number of bytes [`write_vlq`] emits for `value`.
pub const fn vlq_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        _ => 4,
    }
}

#[cfg(test)]
fn round_trip(value: u32) -> (u32, usize) {
    let mut writer = Writer::new();
    write_vlq(&mut writer, value).unwrap();
    let bytes = writer.into_bytes();
    let mut reader = Reader::from_byte_slice(&bytes);
    let decoded = read_vlq(&mut reader).unwrap();
    assert_eq!(reader.remaining(), 0);
    (decoded, bytes.len())
}

#[test]
fn vlq_round_trip_at_group_boundaries() {
    use pretty_assertions::assert_eq;

    for value in [
        0, 1, 0x40, 0x7F, 0x80, 0x2000, 0x3FFF, 0x4000, 0x10_0000, 0x1F_FFFF, 0x20_0000, MAX,
    ] {
        assert_eq!(round_trip(value), (value, vlq_len(value)));
    }
}

#[test]
fn vlq_known_encodings() {
    let mut writer = Writer::new();
    write_vlq(&mut writer, 0x60).unwrap();
    write_vlq(&mut writer, 0xC8).unwrap();
    write_vlq(&mut writer, MAX).unwrap();
    assert_eq!(
        writer.as_slice(),
        &[0x60, 0x81, 0x48, 0xFF, 0xFF, 0xFF, 0x7F]
    );
}

#[test]
fn vlq_encode_overflow() {
    let mut writer = Writer::new();
    assert_eq!(
        write_vlq(&mut writer, MAX + 1),
        Err(EventError::ValueTooLarge(MAX + 1))
    );
}

#[test]
fn vlq_decode_truncated() {
    let mut reader = Reader::from_byte_slice(&[0x81, 0x80]);
    let err = read_vlq(&mut reader).unwrap_err();
    assert!(err.is_not_enough_bytes());
    assert_eq!(err.position(), 2);
}

#[test]
fn vlq_decode_runaway() {
    let mut reader = Reader::from_byte_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
    let err = read_vlq(&mut reader).unwrap_err();
    assert_eq!(
        err,
        crate::reader::ReadError::parse(4, EventError::ValueTooLarge(MAX))
    );
}
