use crate::{ByteBuffer, Result};

pub const EVENT_STREAM_BEGIN: u16 = 0;
pub const EVENT_STREAM_EOF: u16 = 1;
pub const EVENT_STREAM_DRY: u16 = 2;
pub const EVENT_SET_BUFFER_LENGTH: u16 = 3;
pub const EVENT_STREAM_IS_RECORDED: u16 = 4;
pub const EVENT_PING_REQUEST: u16 = 6;
pub const EVENT_PING_RESPONSE: u16 = 7;
pub const EVENT_BUFFER_EMPTY: u16 = 0x1F;
pub const EVENT_BUFFER_FULL: u16 = 0x20;

/// User control message (type 4) events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserControlEvent {
    StreamBegin(u32),
    StreamEof(u32),
    StreamDry(u32),
    SetBufferLength { stream_id: u32, buffer_ms: u32 },
    StreamIsRecorded(u32),
    PingRequest(u32),
    PingResponse(u32),
    BufferEmpty(u32),
    BufferFull(u32),
    Unknown { event_type: u16, data: Vec<u8> },
}

impl UserControlEvent {
    pub fn event_type(&self) -> u16 {
        match self {
            UserControlEvent::StreamBegin(_) => EVENT_STREAM_BEGIN,
            UserControlEvent::StreamEof(_) => EVENT_STREAM_EOF,
            UserControlEvent::StreamDry(_) => EVENT_STREAM_DRY,
            UserControlEvent::SetBufferLength { .. } => EVENT_SET_BUFFER_LENGTH,
            UserControlEvent::StreamIsRecorded(_) => EVENT_STREAM_IS_RECORDED,
            UserControlEvent::PingRequest(_) => EVENT_PING_REQUEST,
            UserControlEvent::PingResponse(_) => EVENT_PING_RESPONSE,
            UserControlEvent::BufferEmpty(_) => EVENT_BUFFER_EMPTY,
            UserControlEvent::BufferFull(_) => EVENT_BUFFER_FULL,
            UserControlEvent::Unknown { event_type, .. } => *event_type,
        }
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(payload.to_vec());
        let event_type = buffer.read_u16_be()?;
        let event = match event_type {
            EVENT_STREAM_BEGIN => UserControlEvent::StreamBegin(buffer.read_u32_be()?),
            EVENT_STREAM_EOF => UserControlEvent::StreamEof(buffer.read_u32_be()?),
            EVENT_STREAM_DRY => UserControlEvent::StreamDry(buffer.read_u32_be()?),
            EVENT_SET_BUFFER_LENGTH => UserControlEvent::SetBufferLength {
                stream_id: buffer.read_u32_be()?,
                buffer_ms: buffer.read_u32_be()?,
            },
            EVENT_STREAM_IS_RECORDED => UserControlEvent::StreamIsRecorded(buffer.read_u32_be()?),
            EVENT_PING_REQUEST => UserControlEvent::PingRequest(buffer.read_u32_be()?),
            EVENT_PING_RESPONSE => UserControlEvent::PingResponse(buffer.read_u32_be()?),
            EVENT_BUFFER_EMPTY => UserControlEvent::BufferEmpty(buffer.read_u32_be()?),
            EVENT_BUFFER_FULL => UserControlEvent::BufferFull(buffer.read_u32_be()?),
            _ => UserControlEvent::Unknown {
                event_type,
                data: payload[2..].to_vec(),
            },
        };
        Ok(event)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(10);
        buffer.write_u16_be(self.event_type());
        match self {
            UserControlEvent::StreamBegin(value)
            | UserControlEvent::StreamEof(value)
            | UserControlEvent::StreamDry(value)
            | UserControlEvent::StreamIsRecorded(value)
            | UserControlEvent::PingRequest(value)
            | UserControlEvent::PingResponse(value)
            | UserControlEvent::BufferEmpty(value)
            | UserControlEvent::BufferFull(value) => buffer.write_u32_be(*value),
            UserControlEvent::SetBufferLength {
                stream_id,
                buffer_ms,
            } => {
                buffer.write_u32_be(*stream_id);
                buffer.write_u32_be(*buffer_ms);
            }
            UserControlEvent::Unknown { data, .. } => buffer.put(data),
        }
        buffer.into_vec()
    }
}

/// Limit type of a SetPeerBandwidth message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerBandwidthLimit {
    Hard,
    Soft,
    Dynamic,
    Unknown(u8),
}

impl PeerBandwidthLimit {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => PeerBandwidthLimit::Hard,
            1 => PeerBandwidthLimit::Soft,
            2 => PeerBandwidthLimit::Dynamic,
            other => PeerBandwidthLimit::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            PeerBandwidthLimit::Hard => 0,
            PeerBandwidthLimit::Soft => 1,
            PeerBandwidthLimit::Dynamic => 2,
            PeerBandwidthLimit::Unknown(other) => other,
        }
    }
}
