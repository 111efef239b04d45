use chrono::{DateTime, TimeZone, Utc};

/// AMF0 data types
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),             // 0x00
    Boolean(bool),           // 0x01
    String(String),          // 0x02, or 0x0C when longer than 65535 bytes
    Object(AmfObject),       // 0x03
    Null,                    // 0x05
    Undefined,               // 0x06
    EcmaArray(AmfObject),    // 0x08
    StrictArray(Vec<Amf0Value>), // 0x0A
    Date { millis: f64, timezone: i16 }, // 0x0B
    Unsupported,             // 0x0D
    XmlDocument(String),     // 0x0F
    Xml(String),             // 0x11
}

// AMF0 type markers
pub mod markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const MOVIE_CLIP: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const REFERENCE: u8 = 0x07;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
    pub const UNSUPPORTED: u8 = 0x0D;
    pub const RECORDSET: u8 = 0x0E;
    pub const XML_DOCUMENT: u8 = 0x0F;
    pub const TYPED_OBJECT: u8 = 0x10;
    pub const XML: u8 = 0x11;
}

/// Name of a marker for error messages
pub fn marker_name(marker: u8) -> &'static str {
    match marker {
        markers::NUMBER => "number",
        markers::BOOLEAN => "boolean",
        markers::STRING => "string",
        markers::OBJECT => "object",
        markers::MOVIE_CLIP => "movieclip",
        markers::NULL => "null",
        markers::UNDEFINED => "undefined",
        markers::REFERENCE => "reference",
        markers::ECMA_ARRAY => "ecma-array",
        markers::OBJECT_END => "object-end",
        markers::STRICT_ARRAY => "strict-array",
        markers::DATE => "date",
        markers::LONG_STRING => "long-string",
        markers::UNSUPPORTED => "unsupported",
        markers::RECORDSET => "recordset",
        markers::XML_DOCUMENT => "xml-document",
        markers::TYPED_OBJECT => "typed-object",
        markers::XML => "xml",
        _ => "unknown",
    }
}

/// Key/value pairs of an AMF0 object or ECMA array.
///
/// Keys keep the order they were first written in so that encoding is
/// stable, while lookups and equality only care about the keys themselves.
#[derive(Debug, Clone, Default)]
pub struct AmfObject {
    entries: Vec<(String, Amf0Value)>,
}

impl AmfObject {
    pub fn new() -> Self {
        AmfObject::default()
    }

    /// Insert or replace a property. A replaced key keeps its original slot.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Amf0Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Amf0Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Amf0Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Amf0Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Amf0Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// String property, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Amf0Value::as_string)
    }

    /// Number property, if present and a number
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Amf0Value::as_number)
    }
}

impl PartialEq for AmfObject {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl<K: Into<String>, V: Into<Amf0Value>> FromIterator<(K, V)> for AmfObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = AmfObject::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

impl From<f64> for Amf0Value {
    fn from(value: f64) -> Self {
        Amf0Value::Number(value)
    }
}

impl From<u32> for Amf0Value {
    fn from(value: u32) -> Self {
        Amf0Value::Number(value as f64)
    }
}

impl From<bool> for Amf0Value {
    fn from(value: bool) -> Self {
        Amf0Value::Boolean(value)
    }
}

impl From<&str> for Amf0Value {
    fn from(value: &str) -> Self {
        Amf0Value::String(value.to_string())
    }
}

impl From<String> for Amf0Value {
    fn from(value: String) -> Self {
        Amf0Value::String(value)
    }
}

impl From<AmfObject> for Amf0Value {
    fn from(value: AmfObject) -> Self {
        Amf0Value::Object(value)
    }
}

impl From<Vec<Amf0Value>> for Amf0Value {
    fn from(value: Vec<Amf0Value>) -> Self {
        Amf0Value::StrictArray(value)
    }
}

/// `None` is written as AMF0 null
impl<T: Into<Amf0Value>> From<Option<T>> for Amf0Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Amf0Value::Null, Into::into)
    }
}

impl Amf0Value {
    /// Extract number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string reference
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract boolean value
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract object reference (objects and ECMA arrays)
    pub fn as_object(&self) -> Option<&AmfObject> {
        match self {
            Amf0Value::Object(obj) | Amf0Value::EcmaArray(obj) => Some(obj),
            _ => None,
        }
    }

    /// Extract strict array reference
    pub fn as_array(&self) -> Option<&[Amf0Value]> {
        match self {
            Amf0Value::StrictArray(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get property from object
    pub fn get_property(&self, key: &str) -> Option<&Amf0Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Amf0Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Amf0Value::Undefined)
    }

    /// Date value in UTC. The timezone field is informational only.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Amf0Value::Date { millis, .. } => Utc.timestamp_millis_opt(*millis as i64).single(),
            _ => None,
        }
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Amf0Value::Date {
            millis: datetime.timestamp_millis() as f64,
            timezone: 0,
        }
    }

    /// Wire marker this value is written with
    pub fn marker(&self) -> u8 {
        match self {
            Amf0Value::Number(_) => markers::NUMBER,
            Amf0Value::Boolean(_) => markers::BOOLEAN,
            Amf0Value::String(s) if s.len() > u16::MAX as usize => markers::LONG_STRING,
            Amf0Value::String(_) => markers::STRING,
            Amf0Value::Object(_) => markers::OBJECT,
            Amf0Value::Null => markers::NULL,
            Amf0Value::Undefined => markers::UNDEFINED,
            Amf0Value::EcmaArray(_) => markers::ECMA_ARRAY,
            Amf0Value::StrictArray(_) => markers::STRICT_ARRAY,
            Amf0Value::Date { .. } => markers::DATE,
            Amf0Value::Unsupported => markers::UNSUPPORTED,
            Amf0Value::XmlDocument(_) => markers::XML_DOCUMENT,
            Amf0Value::Xml(_) => markers::XML,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keeps_first_write_order() {
        let mut object = AmfObject::new();
        object.insert("b", 1.0);
        object.insert("a", 2.0);
        object.insert("b", 3.0);

        let keys: Vec<&str> = object.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(object.get_number("b"), Some(3.0));
    }

    #[test]
    fn test_object_equality_ignores_order() {
        let first: AmfObject = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        let second: AmfObject = [("b", 2.0), ("a", 1.0)].into_iter().collect();
        assert_eq!(first, second);

        let third: AmfObject = [("a", 1.0)].into_iter().collect();
        assert_ne!(first, third);
    }

    #[test]
    fn test_null_undefined_absent_are_distinct() {
        let object = AmfObject::new()
            .with("swfUrl", Amf0Value::Null)
            .with("pageUrl", Amf0Value::Undefined);

        assert!(object.get("swfUrl").is_some_and(Amf0Value::is_null));
        assert!(object.get("pageUrl").is_some_and(Amf0Value::is_undefined));
        assert!(object.get("tcUrl").is_none());
        assert_eq!(Amf0Value::from(None::<String>), Amf0Value::Null);
    }

    #[test]
    fn test_date_conversion() {
        let value = Amf0Value::Date {
            millis: 1_700_000_000_000.0,
            timezone: 0,
        };
        let datetime = value.as_datetime().unwrap();
        assert_eq!(datetime.timestamp(), 1_700_000_000);
        assert_eq!(Amf0Value::from_datetime(datetime), value);
    }
}
