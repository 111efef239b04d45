use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::{Error, Result};

/// Growable byte buffer with a read cursor.
///
/// Writes always append at the end. Reads advance the cursor and fail with
/// [`Error::BufferUnderflow`] without moving it when too few bytes are left,
/// so callers can save [`position`](Self::position) and roll back.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    buffer: Vec<u8>,
    cursor: usize,
}

impl ByteBuffer {
    /// Create a new ByteBuffer from bytes
    pub fn new(data: Vec<u8>) -> Self {
        ByteBuffer {
            buffer: data,
            cursor: 0,
        }
    }

    /// Create an empty ByteBuffer with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            buffer: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Get current cursor position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Set cursor position
    pub fn set_position(&mut self, pos: usize) -> Result<()> {
        if pos > self.buffer.len() {
            return Err(Error::underflow(pos, self.buffer.len()));
        }
        self.cursor = pos;
        Ok(())
    }

    /// Get remaining bytes from current position
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.cursor)
    }

    /// Check if buffer has at least n bytes remaining
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if !self.has_remaining(n) {
            return Err(Error::underflow(n, self.remaining()));
        }
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.buffer[start..start + n])
    }

    /// Read bytes into a new vector
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.take(len).map(<[u8]>::to_vec)
    }

    /// Skip `len` bytes
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Look at the next byte without consuming it
    pub fn peek_u8(&self) -> Result<u8> {
        self.buffer
            .get(self.cursor)
            .copied()
            .ok_or(Error::underflow(1, 0))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.take(2).map(BigEndian::read_u16)
    }

    pub fn read_i16_be(&mut self) -> Result<i16> {
        self.take(2).map(BigEndian::read_i16)
    }

    pub fn read_u24_be(&mut self) -> Result<u32> {
        self.take(3).map(BigEndian::read_u24)
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.take(4).map(BigEndian::read_u32)
    }

    /// Read u32 (little endian), used for message stream ids
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.take(4).map(LittleEndian::read_u32)
    }

    pub fn read_f64_be(&mut self) -> Result<f64> {
        self.take(8).map(BigEndian::read_f64)
    }

    /// Append raw bytes
    pub fn put(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u16_be(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.put(&bytes);
    }

    pub fn write_i16_be(&mut self, value: i16) {
        let mut bytes = [0u8; 2];
        BigEndian::write_i16(&mut bytes, value);
        self.put(&bytes);
    }

    /// Write the low 24 bits of `value` (big endian)
    pub fn write_u24_be(&mut self, value: u32) {
        let mut bytes = [0u8; 3];
        BigEndian::write_u24(&mut bytes, value & 0x00FF_FFFF);
        self.put(&bytes);
    }

    pub fn write_u32_be(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        BigEndian::write_u32(&mut bytes, value);
        self.put(&bytes);
    }

    pub fn write_u32_le(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.put(&bytes);
    }

    pub fn write_f64_be(&mut self, value: f64) {
        let mut bytes = [0u8; 8];
        BigEndian::write_f64(&mut bytes, value);
        self.put(&bytes);
    }

    /// Drop everything before the cursor and move the cursor to 0
    pub fn discard_consumed(&mut self) {
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
    }

    /// Unread bytes from the cursor to the end
    pub fn unread(&self) -> &[u8] {
        &self.buffer[self.cursor..]
    }

    /// Get slice of underlying buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }

    /// Clear buffer and reset cursor
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
