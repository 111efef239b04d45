use crate::amf::amf0::{markers, Amf0Value, AmfObject};
use crate::{ByteBuffer, Error, Result};

pub struct Amf0Encoder {
    buffer: ByteBuffer,
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Amf0Encoder {
    pub fn new() -> Self {
        Amf0Encoder {
            buffer: ByteBuffer::with_capacity(256),
        }
    }

    pub fn encode(&mut self, value: &Amf0Value) -> Result<()> {
        let marker = value.marker();
        self.buffer.write_u8(marker);
        match value {
            Amf0Value::Number(n) => self.buffer.write_f64_be(*n),
            Amf0Value::Boolean(b) => self.buffer.write_u8(u8::from(*b)),
            Amf0Value::String(s) if marker == markers::LONG_STRING => self.write_long_utf8(s)?,
            Amf0Value::String(s) => self.write_utf8(s)?,
            Amf0Value::Object(obj) => self.write_properties(obj)?,
            Amf0Value::Null | Amf0Value::Undefined | Amf0Value::Unsupported => {}
            Amf0Value::EcmaArray(obj) => {
                self.buffer.write_u32_be(obj.len() as u32);
                self.write_properties(obj)?;
            }
            Amf0Value::StrictArray(arr) => {
                self.buffer.write_u32_be(arr.len() as u32);
                for item in arr {
                    self.encode(item)?;
                }
            }
            Amf0Value::Date { millis, timezone } => {
                self.buffer.write_f64_be(*millis);
                self.buffer.write_i16_be(*timezone);
            }
            Amf0Value::XmlDocument(xml) | Amf0Value::Xml(xml) => self.write_long_utf8(xml)?,
        }
        Ok(())
    }

    pub fn encode_all<'v>(&mut self, values: impl IntoIterator<Item = &'v Amf0Value>) -> Result<()> {
        for value in values {
            self.encode(value)?;
        }
        Ok(())
    }

    fn write_properties(&mut self, obj: &AmfObject) -> Result<()> {
        for (key, value) in obj.iter() {
            if key.is_empty() {
                return Err(Error::amf_encode("Empty property name"));
            }
            self.write_utf8(key)?;
            self.encode(value)?;
        }
        self.buffer.write_u16_be(0);
        self.buffer.write_u8(markers::OBJECT_END);
        Ok(())
    }

    /// String body with a 16-bit length prefix (no marker)
    fn write_utf8(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len())
            .map_err(|_| Error::amf_encode(format!("String of {} bytes is too long", value.len())))?;
        self.buffer.write_u16_be(len);
        self.buffer.put(value.as_bytes());
        Ok(())
    }

    /// String body with a 32-bit length prefix (no marker)
    fn write_long_utf8(&mut self, value: &str) -> Result<()> {
        let len = u32::try_from(value.len())
            .map_err(|_| Error::amf_encode(format!("String of {} bytes is too long", value.len())))?;
        self.buffer.write_u32_be(len);
        self.buffer.put(value.as_bytes());
        Ok(())
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        self.buffer.as_slice().to_vec()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::Amf0Decoder;

    fn round_trip(value: &Amf0Value) -> Amf0Value {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(value).unwrap();
        let mut buffer = ByteBuffer::new(encoder.into_bytes());
        let decoded = Amf0Decoder::new(&mut buffer).decode().unwrap();
        assert_eq!(buffer.remaining(), 0);
        decoded
    }

    /// The object a publishing client sends with `connect`
    fn connection_object() -> AmfObject {
        AmfObject::new()
            .with("app", "live")
            .with("flashVer", "FMLE/3.0 (compatible; FMSc/1.0)")
            .with("swfUrl", Amf0Value::Null)
            .with("tcUrl", "rtmp://localhost:1935/live")
            .with("fpad", false)
            .with("capabilities", 239.0)
            .with("audioCodecs", 1024.0)
            .with("videoCodecs", 128.0)
            .with("videoFunction", 1.0)
            .with(
                "fourCcList",
                vec![
                    Amf0Value::from("av01"),
                    Amf0Value::from("vp09"),
                    Amf0Value::from("hvc1"),
                ],
            )
            .with("pageUrl", Amf0Value::Null)
            .with("objectEncoding", 0.0)
    }

    #[test]
    fn test_encode_string() {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::from("hello")).unwrap();
        assert_eq!(encoder.get_bytes(), vec![0x02, 0x00, 0x05, 104, 101, 108, 108, 111]);
    }

    #[test]
    fn test_encode_object_layout() {
        let mut encoder = Amf0Encoder::new();
        let object = AmfObject::new().with("a", true);
        encoder.encode(&Amf0Value::Object(object)).unwrap();
        assert_eq!(
            encoder.get_bytes(),
            vec![0x03, 0x00, 0x01, b'a', 0x01, 0x01, 0x00, 0x00, 0x09]
        );
    }

    #[test]
    fn test_connection_object_round_trip() {
        let value = Amf0Value::Object(connection_object());
        let decoded = round_trip(&value);
        assert_eq!(decoded, value);

        let object = decoded.as_object().unwrap();
        assert_eq!(object.get_str("tcUrl"), Some("rtmp://localhost:1935/live"));
        assert!(object.get("swfUrl").is_some_and(Amf0Value::is_null));
        assert_eq!(
            object.get("fourCcList").and_then(Amf0Value::as_array).map(<[_]>::len),
            Some(3)
        );
        let keys: Vec<&str> = object.keys().collect();
        assert_eq!(keys.first(), Some(&"app"));
        assert_eq!(keys.last(), Some(&"objectEncoding"));
    }

    #[test]
    fn test_nested_and_special_values_round_trip() {
        let nested = AmfObject::new()
            .with("inner", AmfObject::new().with("depth", 2.0))
            .with("missing", Amf0Value::Undefined)
            .with("nothing", Amf0Value::Null);
        let values = vec![
            Amf0Value::Object(nested),
            Amf0Value::EcmaArray(AmfObject::new().with("duration", 0.0).with("width", 1280.0)),
            Amf0Value::Date { millis: 1_600_000_000_000.0, timezone: 0 },
            Amf0Value::XmlDocument("<a/>".into()),
            Amf0Value::Xml("<b/>".into()),
            Amf0Value::Unsupported,
            Amf0Value::Undefined,
            Amf0Value::Null,
        ];
        for value in &values {
            assert_eq!(&round_trip(value), value);
        }
    }

    #[test]
    fn test_long_string_uses_long_marker() {
        let text = "x".repeat(70_000);
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::String(text.clone())).unwrap();
        let bytes = encoder.get_bytes();
        assert_eq!(bytes[0], markers::LONG_STRING);
        assert_eq!(bytes.len(), 1 + 4 + 70_000);
        assert_eq!(round_trip(&Amf0Value::String(text.clone())), Amf0Value::String(text));
    }
}
