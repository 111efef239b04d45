use crate::protocol::{RtmpHeader, MAX_TIMESTAMP};
use crate::{ByteBuffer, Error, Result};

/// Largest chunk stream id the 3-byte basic header can carry
pub const MAX_CHUNK_STREAM_ID: u32 = 64 + 0xFFFF;

/// Message header format (the `fmt` bits of the basic header)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// Full header: timestamp, length, type and stream id
    Zero = 0,
    /// Timestamp delta, length and type
    One = 1,
    /// Timestamp delta only
    Two = 2,
    /// No message header
    Three = 3,
}

impl ChunkType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ChunkType::Zero,
            1 => ChunkType::One,
            2 => ChunkType::Two,
            _ => ChunkType::Three,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Message header size without the extended timestamp
    pub fn header_size(self) -> usize {
        match self {
            ChunkType::Zero => 11,
            ChunkType::One => 7,
            ChunkType::Two => 3,
            ChunkType::Three => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicHeader {
    pub chunk_type: ChunkType,
    pub chunk_stream_id: u32,
}

/// Message header fields exactly as they appear on the wire.
///
/// `timestamp` is absolute for type 0 and a delta for types 1 and 2, with the
/// extended value already substituted when the 3-byte field was saturated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeaderFields {
    pub timestamp: Option<u32>,
    pub extended: bool,
    pub message_length: Option<u32>,
    pub message_type: Option<u8>,
    pub message_stream_id: Option<u32>,
}

/// Read a 1, 2 or 3 byte basic header.
pub fn read_basic_header(buffer: &mut ByteBuffer) -> Result<BasicHeader> {
    let first = buffer.peek_u8()?;
    let chunk_type = ChunkType::from_bits(first >> 6);
    let needed = match first & 0x3F {
        0 => 2,
        1 => 3,
        _ => 1,
    };
    if !buffer.has_remaining(needed) {
        return Err(Error::underflow(needed, buffer.remaining()));
    }

    buffer.skip(1)?;
    let chunk_stream_id = match first & 0x3F {
        0 => 64 + buffer.read_u8()? as u32,
        1 => 64 + buffer.read_u16_be()? as u32,
        id => id as u32,
    };
    Ok(BasicHeader {
        chunk_type,
        chunk_stream_id,
    })
}

/// Write a basic header. Ids below 64 always take the one-byte form.
pub fn write_basic_header(
    buffer: &mut ByteBuffer,
    chunk_type: ChunkType,
    chunk_stream_id: u32,
) -> Result<()> {
    let fmt = chunk_type.bits() << 6;
    match chunk_stream_id {
        0..=63 => buffer.write_u8(fmt | chunk_stream_id as u8),
        64..=319 => {
            buffer.write_u8(fmt);
            buffer.write_u8((chunk_stream_id - 64) as u8);
        }
        320..=MAX_CHUNK_STREAM_ID => {
            buffer.write_u8(fmt | 1);
            buffer.write_u16_be((chunk_stream_id - 64) as u16);
        }
        _ => {
            return Err(Error::malformed_header(
                chunk_stream_id,
                "chunk stream id does not fit a basic header",
            ));
        }
    }
    Ok(())
}

/// Read the message header of a type 0, 1 or 2 chunk.
///
/// Type 3 chunks carry no fields here; whether they repeat an extended
/// timestamp depends on chunk stream state and is left to the caller.
pub fn read_message_header(
    buffer: &mut ByteBuffer,
    chunk_type: ChunkType,
) -> Result<MessageHeaderFields> {
    let size = chunk_type.header_size();
    if !buffer.has_remaining(size) {
        return Err(Error::underflow(size, buffer.remaining()));
    }

    let mut fields = MessageHeaderFields::default();
    if chunk_type == ChunkType::Three {
        return Ok(fields);
    }

    let mut timestamp = buffer.read_u24_be()?;
    if chunk_type != ChunkType::Two {
        fields.message_length = Some(buffer.read_u24_be()?);
        fields.message_type = Some(buffer.read_u8()?);
    }
    if chunk_type == ChunkType::Zero {
        fields.message_stream_id = Some(buffer.read_u32_le()?);
    }
    if timestamp == MAX_TIMESTAMP {
        timestamp = buffer.read_u32_be()?;
        fields.extended = true;
    }
    fields.timestamp = Some(timestamp);
    Ok(fields)
}

/// Write the message header for `chunk_type`.
///
/// `timestamp` is the absolute value for type 0 and the delta otherwise.
/// Values at or above 0xFFFFFF go into the extended field.
pub fn write_message_header(
    buffer: &mut ByteBuffer,
    chunk_type: ChunkType,
    header: &RtmpHeader,
    timestamp: u32,
) {
    if chunk_type == ChunkType::Three {
        return;
    }
    let extended = timestamp >= MAX_TIMESTAMP;
    buffer.write_u24_be(if extended { MAX_TIMESTAMP } else { timestamp });
    if chunk_type != ChunkType::Two {
        buffer.write_u24_be(header.message_length);
        buffer.write_u8(header.message_type);
    }
    if chunk_type == ChunkType::Zero {
        buffer.write_u32_le(header.message_stream_id);
    }
    if extended {
        buffer.write_u32_be(timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(bytes: &[u8]) -> Result<BasicHeader> {
        read_basic_header(&mut ByteBuffer::new(bytes.to_vec()))
    }

    #[test]
    fn test_basic_header_forms() {
        assert_eq!(
            read(&[0x03]).unwrap(),
            BasicHeader { chunk_type: ChunkType::Zero, chunk_stream_id: 3 }
        );
        assert_eq!(
            read(&[0xC0, 0x00]).unwrap(),
            BasicHeader { chunk_type: ChunkType::Three, chunk_stream_id: 64 }
        );
        assert_eq!(
            read(&[0x41, 0x01, 0x00]).unwrap(),
            BasicHeader { chunk_type: ChunkType::One, chunk_stream_id: 64 + 256 }
        );
    }

    #[test]
    fn test_basic_header_underflow_consumes_nothing() {
        let mut buffer = ByteBuffer::new(vec![0x01, 0x05]);
        let err = read_basic_header(&mut buffer).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn test_basic_header_write_sizes() {
        for (id, len) in [(2u32, 1usize), (63, 1), (64, 2), (319, 2), (320, 3), (65599, 3)] {
            let mut buffer = ByteBuffer::default();
            write_basic_header(&mut buffer, ChunkType::Two, id).unwrap();
            assert_eq!(buffer.len(), len, "chunk stream id {}", id);
            assert_eq!(read_basic_header(&mut buffer).unwrap().chunk_stream_id, id);
        }
        let mut buffer = ByteBuffer::default();
        assert!(write_basic_header(&mut buffer, ChunkType::Zero, 65600).is_err());
    }

    #[test]
    fn test_type0_header_layout() {
        let header = RtmpHeader::new(0, 4, 5, 1, 2);
        let mut buffer = ByteBuffer::default();
        write_message_header(&mut buffer, ChunkType::Zero, &header, 0);
        assert_eq!(buffer.as_slice(), &[0, 0, 0, 0, 0, 4, 5, 1, 0, 0, 0]);

        let fields = read_message_header(&mut buffer, ChunkType::Zero).unwrap();
        assert_eq!(fields.timestamp, Some(0));
        assert_eq!(fields.message_length, Some(4));
        assert_eq!(fields.message_type, Some(5));
        assert_eq!(fields.message_stream_id, Some(1));
        assert!(!fields.extended);
    }

    #[test]
    fn test_extended_timestamp() {
        let header = RtmpHeader::new(0x0100_0000, 0, 9, 1, 6);
        let mut buffer = ByteBuffer::default();
        write_message_header(&mut buffer, ChunkType::Two, &header, 0x0100_0000);
        assert_eq!(buffer.as_slice(), &[0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x00]);

        let fields = read_message_header(&mut buffer, ChunkType::Two).unwrap();
        assert_eq!(fields.timestamp, Some(0x0100_0000));
        assert!(fields.extended);
        assert_eq!(fields.message_length, None);
    }

    #[test]
    fn test_message_header_underflow() {
        let mut buffer = ByteBuffer::new(vec![0, 0, 0, 0, 0]);
        assert!(read_message_header(&mut buffer, ChunkType::One).unwrap_err().is_recoverable());

        let mut buffer = ByteBuffer::new(vec![0xFF, 0xFF, 0xFF, 0x00]);
        assert!(read_message_header(&mut buffer, ChunkType::Two).unwrap_err().is_recoverable());
    }
}
