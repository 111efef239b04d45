use std::collections::HashMap;

use crate::chunk::header::{write_basic_header, write_message_header, ChunkType};
use crate::protocol::{RtmpHeader, RtmpPacket, DEFAULT_CHUNK_SIZE, MAX_MESSAGE_LENGTH, MAX_TIMESTAMP};
use crate::{ByteBuffer, Error, Result};

/// Last header sent on a chunk stream
#[derive(Debug, Clone, Copy)]
struct SentHeader {
    header: RtmpHeader,
    /// Delta a type 3 header would imply for the next message
    timestamp_delta: u32,
    /// Value written in the last explicit timestamp field
    timestamp_field: u32,
}

impl SentHeader {
    fn extended(&self) -> bool {
        self.timestamp_field >= MAX_TIMESTAMP
    }
}

/// Splits outbound messages into chunks, compressing headers per chunk stream.
pub struct ChunkWriter {
    prev_headers: HashMap<u32, SentHeader>,
    chunk_size: usize,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkWriter {
    pub fn new() -> Self {
        ChunkWriter {
            prev_headers: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE as usize,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Set outgoing chunk size
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Forget every header sent so far
    pub fn reset(&mut self) {
        self.prev_headers.clear();
        self.chunk_size = DEFAULT_CHUNK_SIZE as usize;
    }

    /// Encode `packet` on `chunk_stream_id` and return its chunks lazily.
    ///
    /// With `chunk_type` of `None` the smallest header that describes the
    /// message given the last one sent on this chunk stream is used. A forced
    /// type that cannot describe the message is an error.
    pub fn put_message<'a>(
        &mut self,
        chunk_type: Option<ChunkType>,
        chunk_stream_id: u32,
        packet: &'a RtmpPacket,
    ) -> Result<Chunks<'a>> {
        let length = packet.payload.len() as u32;
        if packet.payload.len() > MAX_MESSAGE_LENGTH as usize {
            return Err(Error::protocol(format!(
                "Message of {} bytes exceeds the maximum length",
                packet.payload.len()
            )));
        }
        let header = RtmpHeader {
            message_length: length,
            chunk_stream_id,
            ..packet.header
        };

        let prev = self.prev_headers.get(&chunk_stream_id).copied();
        let chunk_type = match chunk_type {
            Some(forced) => {
                if !Self::can_use(forced, prev.as_ref(), &header) {
                    return Err(Error::invalid_state(format!(
                        "Chunk type {} cannot carry this message on chunk stream {}",
                        forced.bits(),
                        chunk_stream_id
                    )));
                }
                forced
            }
            None => Self::select_type(prev.as_ref(), &header),
        };

        let sent = match (chunk_type, prev) {
            (ChunkType::Zero, _) | (_, None) => SentHeader {
                header,
                timestamp_delta: header.timestamp,
                timestamp_field: header.timestamp,
            },
            (ChunkType::Three, Some(prev)) => SentHeader { header, ..prev },
            (_, Some(prev)) => {
                let delta = header.timestamp.wrapping_sub(prev.header.timestamp);
                SentHeader {
                    header,
                    timestamp_delta: delta,
                    timestamp_field: delta,
                }
            }
        };

        let mut first = ByteBuffer::with_capacity(18);
        write_basic_header(&mut first, chunk_type, chunk_stream_id)?;
        write_message_header(&mut first, chunk_type, &header, sent.timestamp_field);
        if chunk_type == ChunkType::Three && sent.extended() {
            first.write_u32_be(sent.timestamp_field);
        }

        let mut continuation = ByteBuffer::with_capacity(7);
        write_basic_header(&mut continuation, ChunkType::Three, chunk_stream_id)?;
        if sent.extended() {
            continuation.write_u32_be(sent.timestamp_field);
        }

        self.prev_headers.insert(chunk_stream_id, sent);
        Ok(Chunks {
            first: Some(first.into_vec()),
            continuation: continuation.into_vec(),
            payload: &packet.payload,
            chunk_size: self.chunk_size,
            offset: 0,
        })
    }

    /// Encode a packet on its own chunk stream id into one contiguous buffer
    pub fn write_packet(&mut self, packet: &RtmpPacket) -> Result<Vec<u8>> {
        let chunks = self.put_message(None, packet.header.chunk_stream_id, packet)?;
        Ok(chunks.flatten().collect())
    }

    fn select_type(prev: Option<&SentHeader>, header: &RtmpHeader) -> ChunkType {
        let Some(prev) = prev else {
            return ChunkType::Zero;
        };
        if prev.header.message_stream_id != header.message_stream_id
            || header.timestamp < prev.header.timestamp
        {
            return ChunkType::Zero;
        }
        if prev.header.message_length != header.message_length
            || prev.header.message_type != header.message_type
        {
            return ChunkType::One;
        }
        if header.timestamp.wrapping_sub(prev.header.timestamp) == prev.timestamp_delta {
            ChunkType::Three
        } else {
            ChunkType::Two
        }
    }

    fn can_use(chunk_type: ChunkType, prev: Option<&SentHeader>, header: &RtmpHeader) -> bool {
        if chunk_type == ChunkType::Zero {
            return true;
        }
        let Some(prev) = prev else {
            return false;
        };
        let same_stream = prev.header.message_stream_id == header.message_stream_id;
        let same_shape = prev.header.message_length == header.message_length
            && prev.header.message_type == header.message_type;
        let delta = header.timestamp.wrapping_sub(prev.header.timestamp);
        match chunk_type {
            ChunkType::One => same_stream,
            ChunkType::Two => same_stream && same_shape,
            _ => same_stream && same_shape && delta == prev.timestamp_delta,
        }
    }
}

/// Lazily produced chunks of one message.
///
/// The first chunk carries the chosen header, later ones a type 3 header.
/// A message with an empty payload still yields one header-only chunk.
pub struct Chunks<'a> {
    first: Option<Vec<u8>>,
    continuation: Vec<u8>,
    payload: &'a [u8],
    chunk_size: usize,
    offset: usize,
}

impl Iterator for Chunks<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let mut chunk = match self.first.take() {
            Some(header) => header,
            None if self.offset < self.payload.len() => self.continuation.clone(),
            None => return None,
        };
        let end = (self.offset + self.chunk_size).min(self.payload.len());
        chunk.extend_from_slice(&self.payload[self.offset..end]);
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.payload.len() - self.offset;
        let count = left.div_ceil(self.chunk_size) + usize::from(self.first.is_some() && left == 0);
        (count, Some(count))
    }
}

impl ExactSizeIterator for Chunks<'_> {}
