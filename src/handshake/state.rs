use crate::{Error, Result};

/// Client side handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    #[default]
    Uninitialized,

    /// C0+C1 sent, waiting for S0+S1+S2
    VersionSent,

    /// S0+S1+S2 received, C2 not yet written
    AckReceived,

    Done,

    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    SentC0C1,
    ReceivedS0S1S2,
    SentC2,
    Error,
}

impl HandshakeState {
    pub fn is_done(&self) -> bool {
        *self == HandshakeState::Done
    }

    pub fn transition(&mut self, event: HandshakeEvent) -> Result<()> {
        let next = match (*self, event) {
            (_, HandshakeEvent::Error) => HandshakeState::Failed,
            (HandshakeState::Uninitialized, HandshakeEvent::SentC0C1) => HandshakeState::VersionSent,
            (HandshakeState::VersionSent, HandshakeEvent::ReceivedS0S1S2) => HandshakeState::AckReceived,
            (HandshakeState::AckReceived, HandshakeEvent::SentC2) => HandshakeState::Done,
            (state, event) => {
                return Err(Error::handshake(format!(
                    "Invalid transition from {:?} with event {:?}",
                    state, event
                )));
            }
        };
        *self = next;
        Ok(())
    }
}
