use std::collections::HashMap;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace, warn};

use crate::chunk::header::{read_basic_header, read_message_header, ChunkType};
use crate::chunk::stream::ChunkStreamContext;
use crate::protocol::{
    RtmpHeader, RtmpPacket, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MSG_TYPE_ABORT,
    MSG_TYPE_SET_CHUNK_SIZE,
};
use crate::{ByteBuffer, Error, Result};

/// Consumed bytes are dropped once this many have piled up in front of the cursor
const COMPACT_THRESHOLD: usize = 64 * 1024;

/// Reassembles messages from inbound chunks.
///
/// Bytes are pushed with [`feed`](Self::feed) as they arrive. Reading never
/// consumes a partial chunk: when a chunk is incomplete the cursor goes back
/// to where its basic header starts and the chunk stream state is untouched,
/// so the same call can be repeated after more bytes are fed.
///
/// A type 1 chunk on an unknown chunk stream is reported as
/// [`Error::MalformedHeader`] once; its payload and every following message
/// on that chunk stream are skipped until a type 0 header arrives. A type 2
/// or 3 chunk on an unknown chunk stream carries no length, so framing is lost
/// and every later read fails.
pub struct ChunkReader {
    buffer: ByteBuffer,
    chunk_streams: HashMap<u32, ChunkStreamContext>,
    chunk_size: usize,
    framing_lost: bool,
}

/// Copy of the state a chunk needs from its predecessor
#[derive(Clone, Copy)]
struct Previous {
    header: RtmpHeader,
    timestamp_delta: u32,
    extended_timestamp: bool,
    bytes_remaining: usize,
    discarding: bool,
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkReader {
    pub fn new() -> Self {
        ChunkReader {
            buffer: ByteBuffer::with_capacity(8192),
            chunk_streams: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE as usize,
            framing_lost: false,
        }
    }

    /// Append received bytes
    pub fn feed(&mut self, data: &[u8]) {
        if self.buffer.remaining() == 0 {
            self.buffer.clear();
        } else if self.buffer.position() >= COMPACT_THRESHOLD {
            self.buffer.discard_consumed();
        }
        self.buffer.put(data);
    }

    /// Cursor position in the internal buffer
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    /// Check if unread bytes exist
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Set incoming chunk size for every chunk stream
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size;
    }

    /// Drop the partial message of one chunk stream
    pub fn abort(&mut self, chunk_stream_id: u32) {
        if let Some(context) = self.chunk_streams.get_mut(&chunk_stream_id) {
            debug!("Aborting partial message on chunk stream {}", chunk_stream_id);
            context.discard_partial();
        }
    }

    /// Forget all buffered bytes and chunk stream state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.chunk_streams.clear();
        self.chunk_size = DEFAULT_CHUNK_SIZE as usize;
        self.framing_lost = false;
    }

    /// Read the next complete message, if the buffered bytes hold one.
    ///
    /// `Ok(None)` means more bytes are needed.
    pub fn read_packet(&mut self) -> Result<Option<RtmpPacket>> {
        if self.framing_lost {
            return Err(Error::protocol("Chunk framing lost"));
        }
        while self.has_remaining() {
            match self.read_chunk() {
                Ok(Some(packet)) => return Ok(Some(packet)),
                Ok(None) => continue,
                Err(e) if e.is_recoverable() => return Ok(None),
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Read exactly one chunk.
    ///
    /// Returns the message it completes, `Ok(None)` when the message still
    /// needs more chunks, or [`Error::BufferUnderflow`] with the cursor
    /// restored when the chunk is not fully buffered.
    pub fn read_chunk(&mut self) -> Result<Option<RtmpPacket>> {
        let start = self.buffer.position();
        let result = self.parse_chunk();
        if let Err(e) = &result {
            if e.is_recoverable() {
                self.buffer.set_position(start)?;
            }
        }
        result
    }

    fn parse_chunk(&mut self) -> Result<Option<RtmpPacket>> {
        let basic = read_basic_header(&mut self.buffer)?;
        let chunk_stream_id = basic.chunk_stream_id;
        let fields = read_message_header(&mut self.buffer, basic.chunk_type)?;

        let previous = self.chunk_streams.get(&chunk_stream_id).map(|c| Previous {
            header: c.header,
            timestamp_delta: c.timestamp_delta,
            extended_timestamp: c.extended_timestamp,
            bytes_remaining: c.bytes_remaining,
            discarding: c.discarding,
        });
        let mut malformed = None;

        let (header, timestamp_delta, extended_timestamp, continuation) =
            match (basic.chunk_type, previous) {
                (ChunkType::Zero, _) => {
                    let timestamp = fields.timestamp.unwrap_or_default();
                    let header = RtmpHeader::new(
                        timestamp,
                        fields.message_length.unwrap_or_default(),
                        fields.message_type.unwrap_or_default(),
                        fields.message_stream_id.unwrap_or_default(),
                        chunk_stream_id,
                    );
                    (header, timestamp, fields.extended, false)
                }
                (ChunkType::One, Some(prev)) => {
                    let delta = fields.timestamp.unwrap_or_default();
                    let header = RtmpHeader::new(
                        prev.header.timestamp.wrapping_add(delta),
                        fields.message_length.unwrap_or_default(),
                        fields.message_type.unwrap_or_default(),
                        prev.header.message_stream_id,
                        chunk_stream_id,
                    );
                    (header, delta, fields.extended, false)
                }
                (ChunkType::Two, Some(prev)) => {
                    let delta = fields.timestamp.unwrap_or_default();
                    let header = RtmpHeader {
                        timestamp: prev.header.timestamp.wrapping_add(delta),
                        ..prev.header
                    };
                    (header, delta, fields.extended, false)
                }
                (ChunkType::Three, Some(prev)) => {
                    if prev.extended_timestamp {
                        self.buffer.read_u32_be()?;
                    }
                    if prev.bytes_remaining > 0 {
                        (prev.header, prev.timestamp_delta, prev.extended_timestamp, true)
                    } else {
                        let header = RtmpHeader {
                            timestamp: prev.header.timestamp.wrapping_add(prev.timestamp_delta),
                            ..prev.header
                        };
                        (header, prev.timestamp_delta, prev.extended_timestamp, false)
                    }
                }
                (ChunkType::One, None) => {
                    // The length is known, so the payload can still be skipped
                    let delta = fields.timestamp.unwrap_or_default();
                    let header = RtmpHeader::new(
                        delta,
                        fields.message_length.unwrap_or_default(),
                        fields.message_type.unwrap_or_default(),
                        0,
                        chunk_stream_id,
                    );
                    malformed = Some(Error::malformed_header(
                        chunk_stream_id,
                        "type 1 chunk before any type 0 header",
                    ));
                    (header, delta, fields.extended, false)
                }
                (chunk_type, None) => {
                    self.framing_lost = true;
                    return Err(Error::malformed_header(
                        chunk_stream_id,
                        format!("type {} chunk before any type 0 header", chunk_type.bits()),
                    ));
                }
            };
        let discarding = malformed.is_some()
            || (basic.chunk_type != ChunkType::Zero && previous.is_some_and(|p| p.discarding));

        let remaining = match previous {
            Some(prev) if continuation => prev.bytes_remaining,
            _ => header.message_length as usize,
        };
        let size = remaining.min(self.chunk_size);
        if !self.buffer.has_remaining(size) {
            return Err(Error::underflow(size, self.buffer.remaining()));
        }
        let data = self.buffer.read_bytes(size)?;

        // Every read succeeded; only now touch chunk stream state.
        let context = self
            .chunk_streams
            .entry(chunk_stream_id)
            .or_insert_with(|| ChunkStreamContext::new(header, timestamp_delta, extended_timestamp));
        if !continuation {
            if context.is_assembling() {
                warn!(
                    "Chunk stream {}: new message header while {} bytes were missing, dropping partial message",
                    chunk_stream_id, context.bytes_remaining
                );
            }
            context.start_message(header);
        }
        context.timestamp_delta = timestamp_delta;
        context.extended_timestamp = extended_timestamp;
        context.discarding = discarding;

        let packet = context.append(&data);
        if let Some(e) = malformed {
            return Err(e);
        }
        if discarding {
            if let Some(packet) = &packet {
                debug!(
                    "Chunk stream {}: dropped message type {} ({} bytes) without a type 0 header",
                    chunk_stream_id,
                    packet.header.message_type,
                    packet.payload.len()
                );
            }
            return Ok(None);
        }
        if let Some(packet) = &packet {
            trace!(
                "Chunk stream {}: message type {} complete ({} bytes, timestamp {})",
                chunk_stream_id,
                packet.header.message_type,
                packet.payload.len(),
                packet.header.timestamp
            );
            self.apply_protocol_control(packet)?;
        }
        Ok(packet)
    }

    /// Chunk size and abort messages change reader state as soon as they arrive
    fn apply_protocol_control(&mut self, packet: &RtmpPacket) -> Result<()> {
        if packet.payload.len() < 4 {
            return Ok(());
        }
        let value = BigEndian::read_u32(&packet.payload);
        match packet.header.message_type {
            MSG_TYPE_SET_CHUNK_SIZE => {
                let size = value & MAX_CHUNK_SIZE;
                if size == 0 {
                    return Err(Error::protocol("Peer set a chunk size of 0"));
                }
                debug!("Incoming chunk size {} -> {}", self.chunk_size, size);
                self.chunk_size = size as usize;
            }
            MSG_TYPE_ABORT => self.abort(value),
            _ => {}
        }
        Ok(())
    }
}
