#![doc = r#"
The byte sink that every encode emits into.

Chunk lengths are known before their payloads are written (sizes come
from the `encoded_len` pre-pass, not from encoding twice), but
[`Writer::patch_u32_be`] is still available for callers that prefer to
backpatch a placeholder.
"#]

use alloc::vec::Vec;

/// A growable byte sink with big-endian helpers.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create an empty writer.
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Append a single byte.
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Append a slice of bytes.
    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a big-endian unsigned 16-bit value.
    pub fn write_u16_be(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Append a big-endian unsigned 32-bit value.
    pub fn write_u32_be(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Overwrite four previously written bytes with a big-endian value.
    ///
    /// # Panics
    /// If fewer than `position + 4` bytes have been written.
    pub fn patch_u32_be(&mut self, position: usize, value: u32) {
        self.buf[position..position + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, yielding its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
