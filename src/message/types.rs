use log::trace;

use crate::message::control::{PeerBandwidthLimit, UserControlEvent};
use crate::message::shared_object::SharedObjectMessage;
use crate::protocol::*;
use crate::{ByteBuffer, Error, Result};

/// Object encoding announced by the message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectEncoding {
    #[default]
    Amf0,
    /// AMF3 flavoured message; the body still holds AMF0 after a format byte
    Amf3,
}

/// A decoded RTMP message
#[derive(Debug, Clone, PartialEq)]
pub enum RtmpMessage {
    SetChunkSize(u32),
    Abort(u32),
    Acknowledgement(u32),
    UserControl(UserControlEvent),
    WindowAcknowledgementSize(u32),
    SetPeerBandwidth { size: u32, limit: PeerBandwidthLimit },
    Audio(Vec<u8>),
    Video(Vec<u8>),
    Data { data: RtmpData, encoding: ObjectEncoding },
    SharedObject { message: SharedObjectMessage, encoding: ObjectEncoding },
    Command { command: RtmpCommand, encoding: ObjectEncoding },
    Aggregate(Vec<u8>),
    Unknown { type_id: u8, payload: Vec<u8> },
}

impl RtmpMessage {
    /// Interpret a reassembled packet by its message type
    pub fn decode(packet: &RtmpPacket) -> Result<Self> {
        let payload = packet.payload.as_slice();
        let message = match packet.message_type() {
            MSG_TYPE_SET_CHUNK_SIZE => RtmpMessage::SetChunkSize(read_u32(payload)? & MAX_CHUNK_SIZE),
            MSG_TYPE_ABORT => RtmpMessage::Abort(read_u32(payload)?),
            MSG_TYPE_ACK => RtmpMessage::Acknowledgement(read_u32(payload)?),
            MSG_TYPE_USER_CONTROL => RtmpMessage::UserControl(UserControlEvent::decode(payload)?),
            MSG_TYPE_WINDOW_ACK => RtmpMessage::WindowAcknowledgementSize(read_u32(payload)?),
            MSG_TYPE_SET_PEER_BW => {
                let mut buffer = ByteBuffer::new(payload.to_vec());
                RtmpMessage::SetPeerBandwidth {
                    size: buffer.read_u32_be()?,
                    limit: PeerBandwidthLimit::from_u8(buffer.read_u8()?),
                }
            }
            MSG_TYPE_AUDIO => RtmpMessage::Audio(payload.to_vec()),
            MSG_TYPE_VIDEO => RtmpMessage::Video(payload.to_vec()),
            MSG_TYPE_DATA_AMF0 => RtmpMessage::Data {
                data: RtmpData::decode(payload)?,
                encoding: ObjectEncoding::Amf0,
            },
            MSG_TYPE_DATA_AMF3 => RtmpMessage::Data {
                data: RtmpData::decode(skip_format_byte(payload)?)?,
                encoding: ObjectEncoding::Amf3,
            },
            MSG_TYPE_SHARED_OBJECT_AMF0 => RtmpMessage::SharedObject {
                message: SharedObjectMessage::decode(payload)?,
                encoding: ObjectEncoding::Amf0,
            },
            MSG_TYPE_SHARED_OBJECT_AMF3 => RtmpMessage::SharedObject {
                message: SharedObjectMessage::decode(skip_format_byte(payload)?)?,
                encoding: ObjectEncoding::Amf3,
            },
            MSG_TYPE_COMMAND_AMF0 => RtmpMessage::Command {
                command: RtmpCommand::decode(payload)?,
                encoding: ObjectEncoding::Amf0,
            },
            MSG_TYPE_COMMAND_AMF3 => RtmpMessage::Command {
                command: RtmpCommand::decode(skip_format_byte(payload)?)?,
                encoding: ObjectEncoding::Amf3,
            },
            MSG_TYPE_AGGREGATE => RtmpMessage::Aggregate(payload.to_vec()),
            type_id => {
                trace!("Unknown message type {} ({} bytes)", type_id, payload.len());
                RtmpMessage::Unknown {
                    type_id,
                    payload: payload.to_vec(),
                }
            }
        };
        Ok(message)
    }

    pub fn type_id(&self) -> u8 {
        match self {
            RtmpMessage::SetChunkSize(_) => MSG_TYPE_SET_CHUNK_SIZE,
            RtmpMessage::Abort(_) => MSG_TYPE_ABORT,
            RtmpMessage::Acknowledgement(_) => MSG_TYPE_ACK,
            RtmpMessage::UserControl(_) => MSG_TYPE_USER_CONTROL,
            RtmpMessage::WindowAcknowledgementSize(_) => MSG_TYPE_WINDOW_ACK,
            RtmpMessage::SetPeerBandwidth { .. } => MSG_TYPE_SET_PEER_BW,
            RtmpMessage::Audio(_) => MSG_TYPE_AUDIO,
            RtmpMessage::Video(_) => MSG_TYPE_VIDEO,
            RtmpMessage::Data { encoding, .. } => match encoding {
                ObjectEncoding::Amf0 => MSG_TYPE_DATA_AMF0,
                ObjectEncoding::Amf3 => MSG_TYPE_DATA_AMF3,
            },
            RtmpMessage::SharedObject { encoding, .. } => match encoding {
                ObjectEncoding::Amf0 => MSG_TYPE_SHARED_OBJECT_AMF0,
                ObjectEncoding::Amf3 => MSG_TYPE_SHARED_OBJECT_AMF3,
            },
            RtmpMessage::Command { encoding, .. } => match encoding {
                ObjectEncoding::Amf0 => MSG_TYPE_COMMAND_AMF0,
                ObjectEncoding::Amf3 => MSG_TYPE_COMMAND_AMF3,
            },
            RtmpMessage::Aggregate(_) => MSG_TYPE_AGGREGATE,
            RtmpMessage::Unknown { type_id, .. } => *type_id,
        }
    }

    /// Default outgoing chunk stream for this kind of message
    pub fn chunk_stream_id(&self) -> u32 {
        match self {
            RtmpMessage::Audio(_) => CHUNK_STREAM_AUDIO,
            RtmpMessage::Video(_) => CHUNK_STREAM_VIDEO,
            RtmpMessage::Data { .. } | RtmpMessage::Aggregate(_) => CHUNK_STREAM_DATA,
            RtmpMessage::Command { .. } | RtmpMessage::SharedObject { .. } => CHUNK_STREAM_COMMAND,
            _ => CHUNK_STREAM_PROTOCOL,
        }
    }

    pub fn is_protocol_control(&self) -> bool {
        self.type_id() <= MSG_TYPE_SET_PEER_BW
    }

    pub fn encode_payload(&self) -> Result<Vec<u8>> {
        let payload = match self {
            RtmpMessage::SetChunkSize(value)
            | RtmpMessage::Abort(value)
            | RtmpMessage::Acknowledgement(value)
            | RtmpMessage::WindowAcknowledgementSize(value) => value.to_be_bytes().to_vec(),
            RtmpMessage::UserControl(event) => event.encode(),
            RtmpMessage::SetPeerBandwidth { size, limit } => {
                let mut bytes = size.to_be_bytes().to_vec();
                bytes.push(limit.as_u8());
                bytes
            }
            RtmpMessage::Audio(data)
            | RtmpMessage::Video(data)
            | RtmpMessage::Aggregate(data)
            | RtmpMessage::Unknown { payload: data, .. } => data.clone(),
            RtmpMessage::Data { data, encoding } => with_format_byte(*encoding, data.encode()?),
            RtmpMessage::SharedObject { message, encoding } => {
                with_format_byte(*encoding, message.encode()?)
            }
            RtmpMessage::Command { command, encoding } => {
                with_format_byte(*encoding, command.encode()?)
            }
        };
        if payload.len() > MAX_MESSAGE_LENGTH as usize {
            return Err(Error::protocol(format!(
                "Message type {} payload of {} bytes is too long",
                self.type_id(),
                payload.len()
            )));
        }
        Ok(payload)
    }

    /// Build the packet for this message on its default chunk stream
    pub fn into_packet(self, timestamp: u32, message_stream_id: u32) -> Result<RtmpPacket> {
        let header = RtmpHeader::new(
            timestamp,
            0,
            self.type_id(),
            message_stream_id,
            self.chunk_stream_id(),
        );
        let payload = match self {
            RtmpMessage::Audio(data) | RtmpMessage::Video(data) => data,
            other => other.encode_payload()?,
        };
        Ok(RtmpPacket::new(header, payload))
    }
}

impl From<RtmpCommand> for RtmpMessage {
    fn from(command: RtmpCommand) -> Self {
        RtmpMessage::Command {
            command,
            encoding: ObjectEncoding::Amf0,
        }
    }
}

impl From<UserControlEvent> for RtmpMessage {
    fn from(event: UserControlEvent) -> Self {
        RtmpMessage::UserControl(event)
    }
}

fn read_u32(payload: &[u8]) -> Result<u32> {
    ByteBuffer::new(payload.to_vec()).read_u32_be()
}

fn skip_format_byte(payload: &[u8]) -> Result<&[u8]> {
    match payload.split_first() {
        Some((_, rest)) => Ok(rest),
        None => Err(Error::underflow(1, 0)),
    }
}

fn with_format_byte(encoding: ObjectEncoding, payload: Vec<u8>) -> Vec<u8> {
    match encoding {
        ObjectEncoding::Amf0 => payload,
        ObjectEncoding::Amf3 => {
            let mut bytes = Vec::with_capacity(payload.len() + 1);
            bytes.push(0);
            bytes.extend(payload);
            bytes
        }
    }
}
