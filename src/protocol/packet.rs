use crate::protocol::constants::*;

/// A complete message as it travels through the chunk layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmpPacket {
    pub header: RtmpHeader,
    pub payload: Vec<u8>,
}

impl RtmpPacket {
    /// Create a packet; the header length is taken from the payload
    pub fn new(mut header: RtmpHeader, payload: Vec<u8>) -> Self {
        header.message_length = payload.len() as u32;
        RtmpPacket { header, payload }
    }

    pub fn message_type(&self) -> u8 {
        self.header.message_type
    }

    pub fn message_stream_id(&self) -> u32 {
        self.header.message_stream_id
    }

    pub fn chunk_stream_id(&self) -> u32 {
        self.header.chunk_stream_id
    }

    pub fn timestamp(&self) -> u32 {
        self.header.timestamp
    }

    pub fn is_audio(&self) -> bool {
        self.header.message_type == MSG_TYPE_AUDIO
    }

    pub fn is_video(&self) -> bool {
        self.header.message_type == MSG_TYPE_VIDEO
    }

    /// Check if this is a command message
    pub fn is_command(&self) -> bool {
        matches!(
            self.header.message_type,
            MSG_TYPE_COMMAND_AMF0 | MSG_TYPE_COMMAND_AMF3
        )
    }

    /// Check if this is a protocol control message
    pub fn is_control(&self) -> bool {
        matches!(
            self.header.message_type,
            MSG_TYPE_SET_CHUNK_SIZE
                | MSG_TYPE_ABORT
                | MSG_TYPE_ACK
                | MSG_TYPE_USER_CONTROL
                | MSG_TYPE_WINDOW_ACK
                | MSG_TYPE_SET_PEER_BW
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RtmpHeader {
    /// Absolute timestamp in milliseconds
    pub timestamp: u32,
    pub message_length: u32,
    pub message_type: u8,
    pub message_stream_id: u32,
    pub chunk_stream_id: u32,
}

impl RtmpHeader {
    pub fn new(
        timestamp: u32,
        message_length: u32,
        message_type: u8,
        message_stream_id: u32,
        chunk_stream_id: u32,
    ) -> Self {
        RtmpHeader {
            timestamp,
            message_length,
            message_type,
            message_stream_id,
            chunk_stream_id,
        }
    }

    /// Header for a protocol control message on the control chunk stream
    pub fn control(message_type: u8) -> Self {
        RtmpHeader::new(0, 0, message_type, 0, CHUNK_STREAM_PROTOCOL)
    }

    pub fn audio(timestamp: u32, stream_id: u32) -> Self {
        RtmpHeader::new(timestamp, 0, MSG_TYPE_AUDIO, stream_id, CHUNK_STREAM_AUDIO)
    }

    pub fn video(timestamp: u32, stream_id: u32) -> Self {
        RtmpHeader::new(timestamp, 0, MSG_TYPE_VIDEO, stream_id, CHUNK_STREAM_VIDEO)
    }

    pub fn command(stream_id: u32) -> Self {
        RtmpHeader::new(0, 0, MSG_TYPE_COMMAND_AMF0, stream_id, CHUNK_STREAM_COMMAND)
    }

    pub fn data(timestamp: u32, stream_id: u32) -> Self {
        RtmpHeader::new(timestamp, 0, MSG_TYPE_DATA_AMF0, stream_id, CHUNK_STREAM_DATA)
    }

    /// Check if timestamp needs the extended field
    pub fn has_extended_timestamp(&self) -> bool {
        self.timestamp >= MAX_TIMESTAMP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_creation() {
        let packet = RtmpPacket::new(RtmpHeader::audio(1000, 1), vec![0xAF, 0x01, 0x02]);

        assert!(packet.is_audio());
        assert!(!packet.is_video());
        assert_eq!(packet.timestamp(), 1000);
        assert_eq!(packet.message_stream_id(), 1);
        assert_eq!(packet.chunk_stream_id(), CHUNK_STREAM_AUDIO);
        assert_eq!(packet.header.message_length, 3);
    }

    #[test]
    fn test_control_classification() {
        let packet = RtmpPacket::new(RtmpHeader::control(MSG_TYPE_USER_CONTROL), vec![0; 6]);
        assert!(packet.is_control());
        assert!(!packet.is_command());
    }
}
