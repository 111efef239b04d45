use crate::utils::generate_random_bytes;
use crate::{ByteBuffer, Error, Result};

/// RTMP version byte of C0/S0
pub const RTMP_VERSION: u8 = 3;

/// Size of C1/S1/C2/S2
pub const HANDSHAKE_SIZE: usize = 1536;

/// One 1536-byte handshake block: two time fields and random filler.
///
/// In C1/S1 the second field is zero, in C2/S2 it holds the time the
/// peer's block was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeBlock {
    pub time: u32,
    pub time2: u32,
    pub random: Vec<u8>,
}

impl HandshakeBlock {
    /// A fresh C1/S1 block
    pub fn generate(time: u32) -> Self {
        HandshakeBlock {
            time,
            time2: 0,
            random: generate_random_bytes(HANDSHAKE_SIZE - 8),
        }
    }

    /// The C2/S2 answer to a peer's C1/S1
    pub fn echo(peer: &HandshakeBlock, read_time: u32) -> Self {
        HandshakeBlock {
            time: peer.time,
            time2: read_time,
            random: peer.random.clone(),
        }
    }

    /// Check that this block echoes `sent`
    pub fn echoes(&self, sent: &HandshakeBlock) -> bool {
        self.time == sent.time && self.random == sent.random
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HANDSHAKE_SIZE {
            return Err(Error::handshake(format!(
                "Handshake block too short: {} bytes, expected {}",
                data.len(),
                HANDSHAKE_SIZE
            )));
        }
        let mut buffer = ByteBuffer::new(data[..HANDSHAKE_SIZE].to_vec());
        Ok(HandshakeBlock {
            time: buffer.read_u32_be()?,
            time2: buffer.read_u32_be()?,
            random: buffer.read_bytes(HANDSHAKE_SIZE - 8)?,
        })
    }

    pub fn write_to(&self, buffer: &mut ByteBuffer) {
        buffer.write_u32_be(self.time);
        buffer.write_u32_be(self.time2);
        buffer.put(&self.random);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(HANDSHAKE_SIZE);
        self.write_to(&mut buffer);
        buffer.into_vec()
    }
}

/// Client hello (C0 + C1)
#[derive(Debug, Clone)]
pub struct C0C1 {
    pub version: u8,
    pub c1: HandshakeBlock,
}

impl C0C1 {
    pub fn create_client(time: u32) -> Self {
        C0C1 {
            version: RTMP_VERSION,
            c1: HandshakeBlock::generate(time),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 1 + HANDSHAKE_SIZE {
            return Err(Error::handshake(format!(
                "C0+C1 too short: {} bytes, expected {}",
                data.len(),
                1 + HANDSHAKE_SIZE
            )));
        }
        let version = data[0];
        if version != RTMP_VERSION {
            return Err(Error::handshake(format!(
                "Unsupported RTMP version: {}, expected {}",
                version, RTMP_VERSION
            )));
        }
        Ok(C0C1 {
            version,
            c1: HandshakeBlock::parse(&data[1..])?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(1 + HANDSHAKE_SIZE);
        buffer.write_u8(self.version);
        self.c1.write_to(&mut buffer);
        buffer.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c0c1_creation() {
        let c0c1 = C0C1::create_client(1000);
        assert_eq!(c0c1.version, RTMP_VERSION);
        assert_eq!(c0c1.c1.time2, 0);
        assert_eq!(c0c1.c1.random.len(), HANDSHAKE_SIZE - 8);
    }

    #[test]
    fn test_c0c1_layout() {
        let original = C0C1::create_client(0x0102_0304);
        let bytes = original.encode();
        assert_eq!(bytes.len(), 1537);
        assert_eq!(&bytes[..9], &[3, 1, 2, 3, 4, 0, 0, 0, 0]);

        let parsed = C0C1::parse(&bytes).unwrap();
        assert_eq!(parsed.c1, original.c1);
    }

    #[test]
    fn test_wrong_version() {
        let mut bytes = C0C1::create_client(0).encode();
        bytes[0] = 6;
        assert!(matches!(C0C1::parse(&bytes), Err(Error::Handshake(_))));
        assert!(C0C1::parse(&bytes[..100]).is_err());
    }
}
