use crate::amf::{Amf0Decoder, Amf0Encoder, Amf0Value};
use crate::{ByteBuffer, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedObjectEventType {
    Use = 1,
    Release = 2,
    RequestChange = 3,
    Change = 4,
    Success = 5,
    SendMessage = 6,
    Status = 7,
    Clear = 8,
    Remove = 9,
    RequestRemove = 10,
    UseSuccess = 11,
}

impl SharedObjectEventType {
    pub fn from_u8(value: u8) -> Option<Self> {
        use SharedObjectEventType::*;
        let event_type = match value {
            1 => Use,
            2 => Release,
            3 => RequestChange,
            4 => Change,
            5 => Success,
            6 => SendMessage,
            7 => Status,
            8 => Clear,
            9 => Remove,
            10 => RequestRemove,
            11 => UseSuccess,
            _ => return None,
        };
        Some(event_type)
    }
}

/// One event inside a shared object message; the body is kept undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedObjectEvent {
    pub event_type: u8,
    pub data: Vec<u8>,
}

impl SharedObjectEvent {
    /// An event without a body (`use`, `release`, `clear`, ...)
    pub fn new(event_type: SharedObjectEventType) -> Self {
        SharedObjectEvent {
            event_type: event_type as u8,
            data: Vec::new(),
        }
    }

    /// An event about property `name`, optionally carrying its AMF0 value
    pub fn property(
        event_type: SharedObjectEventType,
        name: &str,
        value: Option<&Amf0Value>,
    ) -> Result<Self> {
        if name.len() > u16::MAX as usize {
            return Err(Error::amf_encode("Property name too long"));
        }
        let mut data = Vec::with_capacity(2 + name.len());
        data.extend_from_slice(&(name.len() as u16).to_be_bytes());
        data.extend_from_slice(name.as_bytes());
        if let Some(value) = value {
            let mut encoder = Amf0Encoder::new();
            encoder.encode(value)?;
            data.extend_from_slice(&encoder.into_bytes());
        }
        Ok(SharedObjectEvent {
            event_type: event_type as u8,
            data,
        })
    }

    pub fn kind(&self) -> Option<SharedObjectEventType> {
        SharedObjectEventType::from_u8(self.event_type)
    }

    /// Property name and value of the body; `None` for an empty body.
    ///
    /// A `status` event carries a plain UTF-8 message instead of an AMF0 value.
    pub fn decode_property(&self) -> Result<Option<(String, Option<Amf0Value>)>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let mut buffer = ByteBuffer::new(self.data.clone());
        let name = read_utf8(&mut buffer)?;
        let value = if buffer.remaining() == 0 {
            None
        } else if self.kind() == Some(SharedObjectEventType::Status) {
            Some(Amf0Value::String(read_utf8(&mut buffer)?))
        } else {
            Some(Amf0Decoder::new(&mut buffer).decode()?)
        };
        Ok(Some((name, value)))
    }
}

fn read_utf8(buffer: &mut ByteBuffer) -> Result<String> {
    let len = buffer.read_u16_be()? as usize;
    String::from_utf8(buffer.read_bytes(len)?)
        .map_err(|e| Error::amf_decode(format!("Invalid shared object string: {}", e)))
}

/// Shared object message (types 16 and 19)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedObjectMessage {
    pub name: String,
    pub version: u32,
    pub flags: [u8; 8],
    pub events: Vec<SharedObjectEvent>,
}

impl SharedObjectMessage {
    pub fn new(name: impl Into<String>) -> Self {
        SharedObjectMessage {
            name: name.into(),
            version: 0,
            flags: [0; 8],
            events: Vec::new(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.flags[3] & 0x02 != 0
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(payload.to_vec());
        let name = read_utf8(&mut buffer)?;
        let version = buffer.read_u32_be()?;
        let mut flags = [0u8; 8];
        flags.copy_from_slice(&buffer.read_bytes(8)?);

        let mut events = Vec::new();
        while buffer.remaining() > 0 {
            let event_type = buffer.read_u8()?;
            let len = buffer.read_u32_be()? as usize;
            events.push(SharedObjectEvent {
                event_type,
                data: buffer.read_bytes(len)?,
            });
        }

        Ok(SharedObjectMessage {
            name,
            version,
            flags,
            events,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.name.len() > u16::MAX as usize {
            return Err(Error::amf_encode("Shared object name too long"));
        }
        let mut buffer = ByteBuffer::default();
        buffer.write_u16_be(self.name.len() as u16);
        buffer.put(self.name.as_bytes());
        buffer.write_u32_be(self.version);
        buffer.put(&self.flags);
        for event in &self.events {
            buffer.write_u8(event.event_type);
            buffer.write_u32_be(event.data.len() as u32);
            buffer.put(&event.data);
        }
        Ok(buffer.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_object_layout() {
        let mut message = SharedObjectMessage::new("chat");
        message.version = 3;
        message.flags[3] = 2;
        message.events.push(SharedObjectEvent {
            event_type: 1,
            data: vec![],
        });
        let bytes = message.encode().unwrap();
        assert_eq!(&bytes[..6], &[0, 4, b'c', b'h', b'a', b't']);
        assert_eq!(bytes.len(), 6 + 4 + 8 + 5);

        let decoded = SharedObjectMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, message);
        assert!(decoded.is_persistent());
    }

    #[test]
    fn test_property_event() {
        let value = Amf0Value::Number(42.0);
        let event =
            SharedObjectEvent::property(SharedObjectEventType::RequestChange, "score", Some(&value))
                .unwrap();
        assert_eq!(event.event_type, 3);
        assert_eq!(&event.data[..7], &[0, 5, b's', b'c', b'o', b'r', b'e']);
        assert_eq!(
            event.decode_property().unwrap(),
            Some(("score".to_string(), Some(value)))
        );

        let bare = SharedObjectEvent::new(SharedObjectEventType::Use);
        assert_eq!(bare.kind(), Some(SharedObjectEventType::Use));
        assert_eq!(bare.decode_property().unwrap(), None);
    }

    #[test]
    fn test_status_event_is_plain_text() {
        let mut data = vec![0, 1, b'k', 0, 4];
        data.extend_from_slice(b"deny");
        let event = SharedObjectEvent { event_type: 7, data };
        assert_eq!(
            event.decode_property().unwrap(),
            Some(("k".to_string(), Some(Amf0Value::String("deny".to_string()))))
        );
        assert_eq!(SharedObjectEventType::from_u8(12), None);
    }

    #[test]
    fn test_truncated_event() {
        let mut bytes = SharedObjectMessage::new("a").encode().unwrap();
        bytes.extend_from_slice(&[2, 0, 0, 0, 5, 1]);
        assert!(SharedObjectMessage::decode(&bytes).is_err());
    }
}
