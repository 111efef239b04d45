use crate::handshake::c0c1::{HandshakeBlock, C0C1, HANDSHAKE_SIZE, RTMP_VERSION};
use crate::{ByteBuffer, Error, Result};

/// Length of the server's S0 + S1 + S2 reply
pub const S0S1S2_SIZE: usize = 1 + HANDSHAKE_SIZE * 2;

/// Server reply (S0 + S1 + S2)
#[derive(Debug, Clone)]
pub struct S0S1S2 {
    pub version: u8,
    pub s1: HandshakeBlock,
    pub s2: HandshakeBlock,
}

impl S0S1S2 {
    /// Answer a client's C0+C1 the way a plain-handshake server does
    pub fn generate(c0c1: &C0C1, time: u32) -> Self {
        S0S1S2 {
            version: RTMP_VERSION,
            s1: HandshakeBlock::generate(time),
            s2: HandshakeBlock::echo(&c0c1.c1, time),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < S0S1S2_SIZE {
            return Err(Error::handshake(format!(
                "S0+S1+S2 too short: {} bytes",
                data.len()
            )));
        }
        let version = data[0];
        if version != RTMP_VERSION {
            return Err(Error::handshake(format!(
                "Server answered with RTMP version {}",
                version
            )));
        }
        Ok(S0S1S2 {
            version,
            s1: HandshakeBlock::parse(&data[1..1 + HANDSHAKE_SIZE])?,
            s2: HandshakeBlock::parse(&data[1 + HANDSHAKE_SIZE..S0S1S2_SIZE])?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(S0S1S2_SIZE);
        buffer.write_u8(self.version);
        self.s1.write_to(&mut buffer);
        self.s2.write_to(&mut buffer);
        buffer.into_vec()
    }

    /// The client's C2: an echo of S1
    pub fn c2(&self, read_time: u32) -> HandshakeBlock {
        HandshakeBlock::echo(&self.s1, read_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_flow() {
        let c0c1 = C0C1::create_client(10);

        let reply = S0S1S2::generate(&c0c1, 20);
        let parsed = S0S1S2::parse(&reply.encode()).unwrap();
        assert_eq!(parsed.s1, reply.s1);
        assert!(parsed.s2.echoes(&c0c1.c1));
        assert_eq!(parsed.s2.time2, 20);

        let c2 = parsed.c2(30);
        assert!(c2.echoes(&reply.s1));
        assert_eq!(c2.encode().len(), HANDSHAKE_SIZE);
    }

    #[test]
    fn test_short_reply() {
        let reply = S0S1S2::generate(&C0C1::create_client(0), 0).encode();
        assert!(S0S1S2::parse(&reply[..S0S1S2_SIZE - 1]).is_err());
    }
}
