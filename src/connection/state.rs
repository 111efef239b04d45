/// Lifecycle of the network connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,

    /// Transport open, handshake or `connect` in flight
    Handshaking,

    /// `connect` answered with `_result`
    Connected,

    Closed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        *self == ConnectionState::Connected
    }

    /// Validate transition
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        matches!(
            (*self, next),
            (ConnectionState::Idle, ConnectionState::Handshaking)
                | (ConnectionState::Handshaking, ConnectionState::Connected)
                | (_, ConnectionState::Closed)
        )
    }
}

/// Lifecycle of the single published or played stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,

    /// `createStream` sent, waiting for the stream id
    CreatingStream,

    Publishing,

    Playing,

    Closed,
}

impl StreamState {
    pub fn is_active(&self) -> bool {
        matches!(self, StreamState::Publishing | StreamState::Playing)
    }

    /// Validate transition
    pub fn can_transition_to(&self, next: StreamState) -> bool {
        matches!(
            (*self, next),
            (StreamState::Idle, StreamState::CreatingStream)
                | (StreamState::CreatingStream, StreamState::Idle)
                | (StreamState::Idle, StreamState::Publishing)
                | (StreamState::Idle, StreamState::Playing)
                | (StreamState::Publishing, StreamState::Idle)
                | (StreamState::Playing, StreamState::Idle)
                | (StreamState::Closed, StreamState::CreatingStream)
                | (_, StreamState::Closed)
        )
    }
}

/// Snapshot published to callers whenever the session changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub connection: ConnectionState,
    pub stream: StreamState,
    pub stream_id: Option<u32>,
}
