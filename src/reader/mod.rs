#![doc = r#"
The byte cursor that every decode operates on.

A [`Reader`] wraps a borrowed byte slice and hands out bytes while
tracking its absolute position, so that any failure can report exactly
where the stream went wrong. Decoded events borrow from the slice;
nothing is copied until a caller asks for ownership.
"#]

mod error;
pub use error::*;

use crate::ParseError;

/// A positioned cursor over a byte source.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over a byte slice, positioned at the start.
    pub const fn from_byte_slice(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// The current absolute byte offset.
    pub const fn buffer_position(&self) -> usize {
        self.position
    }

    /// Move the cursor to an absolute offset.
    ///
    /// Offsets past the end clamp to the end of the source.
    pub const fn set_position(&mut self, position: usize) {
        self.position = if position > self.bytes.len() {
            self.bytes.len()
        } else {
            position
        };
    }

    /// Bytes left between the cursor and the end of the source.
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> ReadResult<u8> {
        match self.bytes.get(self.position) {
            Some(byte) => {
                self.position += 1;
                Ok(*byte)
            }
            None => Err(ReadError::not_enough_bytes(self.position, 1, 0)),
        }
    }

    /// Look at the next byte without consuming it.
    pub fn peek_byte(&self) -> ReadResult<u8> {
        self.bytes
            .get(self.position)
            .copied()
            .ok_or(ReadError::not_enough_bytes(self.position, 1, 0))
    }

    /// Read exactly `n` bytes, borrowing them from the source.
    pub fn read_exact(&mut self, n: usize) -> ReadResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(ReadError::not_enough_bytes(
                self.position,
                n,
                self.remaining(),
            ));
        }
        let slice = &self.bytes[self.position..self.position + n];
        self.position += n;
        Ok(slice)
    }

    /// Read a fixed-size array of bytes.
    pub fn read_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let slice = self.read_exact(N)?;
        let mut out = [0; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Read a big-endian unsigned 16-bit value.
    pub fn read_u16_be(&mut self) -> ReadResult<u16> {
        self.read_array::<2>().map(u16::from_be_bytes)
    }

    /// Read a big-endian unsigned 32-bit value.
    pub fn read_u32_be(&mut self) -> ReadResult<u32> {
        self.read_array::<4>().map(u32::from_be_bytes)
    }

    /// Advance the cursor by `n` bytes without looking at them.
    pub fn skip(&mut self, n: usize) -> ReadResult<()> {
        self.read_exact(n).map(|_| ())
    }

    /// Stamp a parse error with the current position.
    pub(crate) fn parse_error(&self, error: impl Into<ParseError>) -> ReadError {
        ReadError::parse(self.position, error)
    }
}

#[test]
fn cursor_reports_positions() {
    let mut reader = Reader::from_byte_slice(&[0x4D, 0x54, 0x68, 0x64, 0x00]);
    assert_eq!(reader.read_array::<4>().unwrap(), *b"MThd");
    assert_eq!(reader.buffer_position(), 4);
    assert_eq!(reader.remaining(), 1);

    let err = reader.read_exact(2).unwrap_err();
    assert_eq!(err.position(), 4);
    assert!(err.is_not_enough_bytes());
    // a failed read consumes nothing
    assert_eq!(reader.read_byte().unwrap(), 0x00);
}
