pub mod header;
mod reader;
mod stream;
mod writer;

pub use header::{BasicHeader, ChunkType, MessageHeaderFields, MAX_CHUNK_STREAM_ID};
pub use reader::ChunkReader;
pub use stream::ChunkStreamContext;
pub use writer::{ChunkWriter, Chunks};
