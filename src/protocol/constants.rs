// Message types
pub const MSG_TYPE_SET_CHUNK_SIZE: u8 = 1;
pub const MSG_TYPE_ABORT: u8 = 2;
pub const MSG_TYPE_ACK: u8 = 3;
pub const MSG_TYPE_USER_CONTROL: u8 = 4;
pub const MSG_TYPE_WINDOW_ACK: u8 = 5;
pub const MSG_TYPE_SET_PEER_BW: u8 = 6;
pub const MSG_TYPE_AUDIO: u8 = 8;
pub const MSG_TYPE_VIDEO: u8 = 9;
pub const MSG_TYPE_DATA_AMF3: u8 = 15;
pub const MSG_TYPE_SHARED_OBJECT_AMF3: u8 = 16;
pub const MSG_TYPE_COMMAND_AMF3: u8 = 17;
pub const MSG_TYPE_DATA_AMF0: u8 = 18;
pub const MSG_TYPE_SHARED_OBJECT_AMF0: u8 = 19;
pub const MSG_TYPE_COMMAND_AMF0: u8 = 20;
pub const MSG_TYPE_AGGREGATE: u8 = 22;

// Chunk stream IDs used for outgoing traffic
pub const CHUNK_STREAM_PROTOCOL: u32 = 2;
pub const CHUNK_STREAM_COMMAND: u32 = 3;
pub const CHUNK_STREAM_AUDIO: u32 = 4;
pub const CHUNK_STREAM_VIDEO: u32 = 5;
pub const CHUNK_STREAM_DATA: u32 = 8;

// Default values
pub const DEFAULT_CHUNK_SIZE: u32 = 128;
pub const MAX_CHUNK_SIZE: u32 = 0x7FFF_FFFF;
pub const DEFAULT_WINDOW_SIZE: u32 = 2_500_000;
pub const DEFAULT_PORT: u16 = 1935;

/// Largest value that fits the 3-byte timestamp field
pub const MAX_TIMESTAMP: u32 = 0x00FF_FFFF;
/// Largest message length a header can carry
pub const MAX_MESSAGE_LENGTH: u32 = 0x00FF_FFFF;

// Connect command defaults
pub const CONNECT_TRANSACTION_ID: u32 = 1;
pub const DEFAULT_FLASH_VER: &str = "FMLE/3.0 (compatible; FMSc/1.0)";
pub const DEFAULT_CAPABILITIES: f64 = 239.0;
/// AAC
pub const SUPPORTED_AUDIO_CODECS: f64 = 0x0400 as f64;
/// H.264
pub const SUPPORTED_VIDEO_CODECS: f64 = 0x0080 as f64;
/// Client seek
pub const SUPPORTED_VIDEO_FUNCTION: f64 = 1.0;
pub const SUPPORTED_FOUR_CC: &[&str] = &["av01", "vp09", "hvc1"];
