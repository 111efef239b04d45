use crate::protocol::{RtmpHeader, RtmpPacket};

/// Inbound state of one chunk stream id.
#[derive(Debug, Clone)]
pub struct ChunkStreamContext {
    /// Header of the current (or last) message with an absolute timestamp
    pub header: RtmpHeader,

    /// Delta applied when a type 3 chunk starts a new message
    pub timestamp_delta: u32,

    /// Whether the last explicit timestamp field used the extended form
    pub extended_timestamp: bool,

    /// Payload collected so far for the current message
    pub payload: Vec<u8>,

    /// Bytes still missing from the current message
    pub bytes_remaining: usize,

    /// Messages are consumed and dropped until the next type 0 header
    pub discarding: bool,
}

impl ChunkStreamContext {
    pub fn new(header: RtmpHeader, timestamp_delta: u32, extended_timestamp: bool) -> Self {
        ChunkStreamContext {
            header,
            timestamp_delta,
            extended_timestamp,
            payload: Vec::new(),
            bytes_remaining: 0,
            discarding: false,
        }
    }

    /// Check if a message is partially assembled
    pub fn is_assembling(&self) -> bool {
        self.bytes_remaining > 0
    }

    /// Start collecting a new message described by `header`
    pub fn start_message(&mut self, header: RtmpHeader) {
        self.header = header;
        self.bytes_remaining = header.message_length as usize;
        self.payload.clear();
        self.payload.reserve(self.bytes_remaining);
    }

    /// Append chunk payload and return the message once it is complete
    pub fn append(&mut self, data: &[u8]) -> Option<RtmpPacket> {
        self.payload.extend_from_slice(data);
        self.bytes_remaining = self.bytes_remaining.saturating_sub(data.len());
        if self.is_assembling() {
            return None;
        }
        Some(RtmpPacket {
            header: self.header,
            payload: std::mem::take(&mut self.payload),
        })
    }

    /// Drop the partially assembled message, keeping header state
    pub fn discard_partial(&mut self) {
        self.payload.clear();
        self.bytes_remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembles_over_several_chunks() {
        let header = RtmpHeader::new(10, 5, 8, 1, 4);
        let mut context = ChunkStreamContext::new(header, 10, false);
        context.start_message(header);

        assert!(context.append(&[1, 2, 3]).is_none());
        assert!(context.is_assembling());
        let packet = context.append(&[4, 5]).unwrap();
        assert_eq!(packet.payload, vec![1, 2, 3, 4, 5]);
        assert_eq!(packet.header.timestamp, 10);
        assert!(!context.is_assembling());
    }

    #[test]
    fn test_empty_message_completes_immediately() {
        let header = RtmpHeader::new(0, 0, 8, 1, 4);
        let mut context = ChunkStreamContext::new(header, 0, false);
        context.start_message(header);
        assert_eq!(context.append(&[]).unwrap().payload, Vec::<u8>::new());
    }
}
