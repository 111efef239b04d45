mod connection;
mod event;
mod session;
mod state;
mod stats;

pub use connection::ConnectionHandle;
pub use event::ClientEvent;
pub use session::{CommandResponder, CommandSession, StatusResponder};
pub use state::{ConnectionState, SessionState, StreamState};
pub use stats::TransportStats;
