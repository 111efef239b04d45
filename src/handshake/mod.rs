mod c0c1;
mod s0s1s2;
mod state;

pub use c0c1::*;
pub use s0s1s2::*;
pub use state::*;

use std::time::Instant;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::utils::elapsed_ms;
use crate::Result;

/// Run the plain client handshake over `stream`.
///
/// Sends C0+C1, reads S0+S1+S2 and answers with C2. A server whose S2 does
/// not echo C1 is tolerated since several servers skip the echo.
pub async fn client_handshake<S>(stream: &mut S, epoch: Instant) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut state = HandshakeState::default();

    let c0c1 = C0C1::create_client(elapsed_ms(epoch));
    stream.write_all(&c0c1.encode()).await?;
    stream.flush().await?;
    state.transition(HandshakeEvent::SentC0C1)?;
    debug!("Handshake: sent C0+C1");

    let mut reply = vec![0u8; S0S1S2_SIZE];
    if let Err(e) = stream.read_exact(&mut reply).await {
        state.transition(HandshakeEvent::Error)?;
        return Err(e.into());
    }
    let s0s1s2 = S0S1S2::parse(&reply)?;
    state.transition(HandshakeEvent::ReceivedS0S1S2)?;
    if !s0s1s2.s2.echoes(&c0c1.c1) {
        warn!("Handshake: S2 does not echo C1");
    }

    stream.write_all(&s0s1s2.c2(elapsed_ms(epoch)).encode()).await?;
    stream.flush().await?;
    state.transition(HandshakeEvent::SentC2)?;
    debug!("Handshake: sent C2, done");
    Ok(())
}

/// Server half of the plain handshake, used by test peers
pub async fn server_handshake<S>(stream: &mut S, epoch: Instant) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut hello = vec![0u8; 1 + HANDSHAKE_SIZE];
    stream.read_exact(&mut hello).await?;
    let c0c1 = C0C1::parse(&hello)?;

    let reply = S0S1S2::generate(&c0c1, elapsed_ms(epoch));
    stream.write_all(&reply.encode()).await?;
    stream.flush().await?;

    let mut c2 = vec![0u8; HANDSHAKE_SIZE];
    stream.read_exact(&mut c2).await?;
    if !HandshakeBlock::parse(&c2)?.echoes(&reply.s1) {
        warn!("Handshake: C2 does not echo S1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handshake_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(8192);
        let epoch = Instant::now();
        let server = tokio::spawn(async move { server_handshake(&mut server, epoch).await });

        client_handshake(&mut client, epoch).await.unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_handshake_peer_gone() {
        let (mut client, server) = tokio::io::duplex(8192);
        drop(server);
        assert!(client_handshake(&mut client, Instant::now()).await.is_err());
    }
}
