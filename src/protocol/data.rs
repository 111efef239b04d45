use crate::amf::{Amf0Decoder, Amf0Encoder, Amf0Value, AmfObject};
use crate::{ByteBuffer, Result};

pub const SET_DATA_FRAME: &str = "@setDataFrame";
pub const ON_METADATA: &str = "onMetaData";

/// A data message: a handler name followed by AMF0 values
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpData {
    pub handler: String,
    pub values: Vec<Amf0Value>,
}

impl RtmpData {
    pub fn new(handler: impl Into<String>) -> Self {
        RtmpData {
            handler: handler.into(),
            values: Vec::new(),
        }
    }

    /// `@setDataFrame("onMetaData", metadata)` as sent by a publisher
    pub fn set_data_frame(metadata: AmfObject) -> Self {
        RtmpData {
            handler: SET_DATA_FRAME.to_string(),
            values: vec![ON_METADATA.into(), Amf0Value::EcmaArray(metadata)],
        }
    }

    /// Metadata carried by `onMetaData` or `@setDataFrame`
    pub fn metadata(&self) -> Option<&AmfObject> {
        match self.handler.as_str() {
            ON_METADATA => self.values.first().and_then(Amf0Value::as_object),
            SET_DATA_FRAME => match self.values.as_slice() {
                [name, value, ..] if name.as_string() == Some(ON_METADATA) => value.as_object(),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::String(self.handler.clone()))?;
        encoder.encode_all(&self.values)?;
        Ok(encoder.into_bytes())
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(data.to_vec());
        let mut decoder = Amf0Decoder::new(&mut buffer);
        let handler = decoder.decode_string()?;
        let values = decoder.decode_all()?;
        Ok(RtmpData { handler, values })
    }
}
