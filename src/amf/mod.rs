mod amf0;
mod decoder;
mod encoder;

pub use amf0::*;
pub use decoder::Amf0Decoder;
pub use encoder::Amf0Encoder;
