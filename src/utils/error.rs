use std::io::Error as IoError;
use thiserror::Error;

use crate::amf::Amf0Value;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Buffer underflow: needed {needed} bytes, {available} available")]
    BufferUnderflow { needed: usize, available: usize },

    #[error("Malformed header on chunk stream {chunk_stream_id}: {reason}")]
    MalformedHeader { chunk_stream_id: u32, reason: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Handshake error: {0}")]
    Handshake(String),

    #[error("AMF decode error: {0}")]
    AmfDecode(String),

    #[error("AMF encode error: {0}")]
    AmfEncode(String),

    #[error("Command '{command}' (transaction {transaction_id}) failed")]
    CommandFailed {
        command: String,
        transaction_id: u32,
        status: Option<Amf0Value>,
    },

    #[error("Transport closed")]
    TransportClosed,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Create a buffer underflow error
    pub fn underflow(needed: usize, available: usize) -> Self {
        Error::BufferUnderflow { needed, available }
    }

    /// Create a malformed header error for a chunk stream
    pub fn malformed_header(chunk_stream_id: u32, reason: impl Into<String>) -> Self {
        Error::MalformedHeader {
            chunk_stream_id,
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create a handshake error
    pub fn handshake(msg: impl Into<String>) -> Self {
        Error::Handshake(msg.into())
    }

    /// Create an AMF decode error
    pub fn amf_decode(msg: impl Into<String>) -> Self {
        Error::AmfDecode(msg.into())
    }

    /// Create an AMF encode error
    pub fn amf_encode(msg: impl Into<String>) -> Self {
        Error::AmfEncode(msg.into())
    }

    pub fn command_failed(
        command: impl Into<String>,
        transaction_id: u32,
        status: Option<Amf0Value>,
    ) -> Self {
        Error::CommandFailed {
            command: command.into(),
            transaction_id,
            status,
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Create a not implemented error
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Error::NotImplemented(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// True when more input may turn this error into a success.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::BufferUnderflow { .. })
    }
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
