use crate::amf::amf0::{markers, marker_name, Amf0Value, AmfObject};
use crate::{ByteBuffer, Error, Result};

/// Deepest nesting of objects, ECMA arrays and strict arrays accepted
pub const MAX_NESTING: usize = 64;

/// Reads AMF0 values from the cursor of a [`ByteBuffer`].
///
/// On error the cursor may sit anywhere inside the value; callers that need
/// to retry save the position first.
pub struct Amf0Decoder<'a> {
    buffer: &'a mut ByteBuffer,
    depth: usize,
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Amf0Decoder { buffer, depth: 0 }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    pub fn decode(&mut self) -> Result<Amf0Value> {
        let marker = self.buffer.read_u8()?;
        match marker {
            markers::NUMBER => Ok(Amf0Value::Number(self.buffer.read_f64_be()?)),
            markers::BOOLEAN => Ok(Amf0Value::Boolean(self.buffer.read_u8()? != 0)),
            markers::STRING => {
                let len = self.buffer.read_u16_be()? as usize;
                self.read_utf8(len).map(Amf0Value::String)
            }
            markers::OBJECT => self.nested(Self::decode_properties).map(Amf0Value::Object),
            markers::NULL => Ok(Amf0Value::Null),
            markers::UNDEFINED => Ok(Amf0Value::Undefined),
            markers::ECMA_ARRAY => {
                // The count is advisory; the pairs run until the end marker.
                let _count = self.buffer.read_u32_be()?;
                self.nested(Self::decode_properties).map(Amf0Value::EcmaArray)
            }
            markers::STRICT_ARRAY => self.nested(Self::decode_strict_array),
            markers::DATE => {
                let millis = self.buffer.read_f64_be()?;
                let timezone = self.buffer.read_i16_be()?;
                Ok(Amf0Value::Date { millis, timezone })
            }
            markers::LONG_STRING => {
                let len = self.buffer.read_u32_be()? as usize;
                self.read_utf8(len).map(Amf0Value::String)
            }
            markers::UNSUPPORTED => Ok(Amf0Value::Unsupported),
            markers::XML_DOCUMENT => {
                let len = self.buffer.read_u32_be()? as usize;
                self.read_utf8(len).map(Amf0Value::XmlDocument)
            }
            markers::XML => {
                let len = self.buffer.read_u32_be()? as usize;
                self.read_utf8(len).map(Amf0Value::Xml)
            }
            markers::TYPED_OBJECT
            | markers::MOVIE_CLIP
            | markers::REFERENCE
            | markers::RECORDSET => Err(Error::not_implemented(format!(
                "AMF0 {} (0x{:02x})",
                marker_name(marker),
                marker
            ))),
            _ => Err(Error::type_mismatch(
                "AMF0 value marker",
                format!("0x{:02x}", marker),
            )),
        }
    }

    /// Decode values until the buffer is exhausted
    pub fn decode_all(&mut self) -> Result<Vec<Amf0Value>> {
        let mut values = Vec::new();
        while self.has_remaining() {
            values.push(self.decode()?);
        }
        Ok(values)
    }

    /// Decode a value and require it to be a string
    pub fn decode_string(&mut self) -> Result<String> {
        match self.decode()? {
            Amf0Value::String(s) => Ok(s),
            other => Err(Error::type_mismatch(
                "string",
                marker_name(other.marker()),
            )),
        }
    }

    /// Decode a value and require it to be a number
    pub fn decode_number(&mut self) -> Result<f64> {
        match self.decode()? {
            Amf0Value::Number(n) => Ok(n),
            other => Err(Error::type_mismatch(
                "number",
                marker_name(other.marker()),
            )),
        }
    }

    fn nested<T>(&mut self, decode: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(Error::amf_decode(format!(
                "Values nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let result = decode(self);
        self.depth -= 1;
        result
    }

    fn decode_properties(&mut self) -> Result<AmfObject> {
        let mut object = AmfObject::new();
        loop {
            let name_len = self.buffer.read_u16_be()? as usize;
            if name_len == 0 {
                let end = self.buffer.read_u8()?;
                if end != markers::OBJECT_END {
                    return Err(Error::type_mismatch(
                        "object end marker",
                        format!("0x{:02x}", end),
                    ));
                }
                return Ok(object);
            }
            let name = self.read_utf8(name_len)?;
            let value = self.decode()?;
            object.insert(name, value);
        }
    }

    fn decode_strict_array(&mut self) -> Result<Amf0Value> {
        let count = self.buffer.read_u32_be()? as usize;
        // Every element takes at least one byte.
        if !self.buffer.has_remaining(count) {
            return Err(Error::underflow(count, self.buffer.remaining()));
        }
        let mut array = Vec::with_capacity(count);
        for _ in 0..count {
            array.push(self.decode()?);
        }
        Ok(Amf0Value::StrictArray(array))
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.buffer.read_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::amf_decode(format!("Invalid UTF-8 in string: {}", e)))
    }
}
