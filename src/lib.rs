mod utils;
mod amf;
mod protocol;
mod handshake;
mod chunk;
mod message;
mod connection;
mod client;

// Re-export commonly used types at crate root
pub use utils::*;
pub use amf::*;
pub use protocol::*;
pub use message::*;
pub use connection::*;
pub use chunk::*;
pub use handshake::*;

// Client exports
pub use client::{
    ClientConfig, ClientConfigBuilder, ConnectResponse, MediaSample, MediaSource, PlayResponse,
    PublishResponse, ReconnectPolicy, RtmpClient, adobe_response,
};
