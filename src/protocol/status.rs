use crate::amf::{Amf0Value, AmfObject};

/// `level` values of a status object
pub mod levels {
    pub const STATUS: &str = "status";
    pub const WARNING: &str = "warning";
    pub const ERROR: &str = "error";
}

/// `code` values the client acts on
pub mod codes {
    pub const CALL_FAILED: &str = "NetConnection.Call.Failed";
    pub const CONNECT_SUCCESS: &str = "NetConnection.Connect.Success";
    pub const CONNECT_CLOSED: &str = "NetConnection.Connect.Closed";
    pub const CONNECT_FAILED: &str = "NetConnection.Connect.Failed";
    pub const CONNECT_REJECTED: &str = "NetConnection.Connect.Rejected";
    pub const CONNECT_INVALID_APP: &str = "NetConnection.Connect.InvalidApp";

    pub const PUBLISH_START: &str = "NetStream.Publish.Start";
    pub const PUBLISH_BAD_NAME: &str = "NetStream.Publish.BadName";
    pub const UNPUBLISH_SUCCESS: &str = "NetStream.Unpublish.Success";
    pub const PLAY_START: &str = "NetStream.Play.Start";
    pub const PLAY_RESET: &str = "NetStream.Play.Reset";
    pub const PLAY_STOP: &str = "NetStream.Play.Stop";
    pub const PLAY_STREAM_NOT_FOUND: &str = "NetStream.Play.StreamNotFound";
    pub const PAUSE_NOTIFY: &str = "NetStream.Pause.Notify";
    pub const UNPAUSE_NOTIFY: &str = "NetStream.Unpause.Notify";
    pub const SEEK_NOTIFY: &str = "NetStream.Seek.Notify";
    pub const RECORD_START: &str = "NetStream.Record.Start";
    pub const BUFFER_EMPTY: &str = "NetStream.Buffer.Empty";
    pub const BUFFER_FULL: &str = "NetStream.Buffer.Full";
}

/// A `NetConnection`/`NetStream` status object
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpStatus {
    pub level: String,
    pub code: String,
    pub description: String,
    /// The full object as received, including extra keys
    pub raw: AmfObject,
}

impl RtmpStatus {
    pub fn new(level: &str, code: &str, description: &str) -> Self {
        let raw = AmfObject::new()
            .with("level", level)
            .with("code", code)
            .with("description", description);
        RtmpStatus {
            level: level.to_string(),
            code: code.to_string(),
            description: description.to_string(),
            raw,
        }
    }

    /// Read a status out of an object carrying at least a `code` string
    pub fn from_object(object: &AmfObject) -> Option<Self> {
        let code = object.get_str("code")?;
        Some(RtmpStatus {
            level: object.get_str("level").unwrap_or(levels::STATUS).to_string(),
            code: code.to_string(),
            description: object.get_str("description").unwrap_or_default().to_string(),
            raw: object.clone(),
        })
    }

    pub fn from_value(value: &Amf0Value) -> Option<Self> {
        value.as_object().and_then(Self::from_object)
    }

    pub fn is_error(&self) -> bool {
        self.level == levels::ERROR
    }

    pub fn to_object(&self) -> AmfObject {
        self.raw.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_object() {
        let object = AmfObject::new()
            .with("level", "status")
            .with("code", codes::PUBLISH_START)
            .with("clientid", 7.0);
        let status = RtmpStatus::from_object(&object).unwrap();
        assert_eq!(status.code, codes::PUBLISH_START);
        assert_eq!(status.description, "");
        assert!(!status.is_error());
        assert_eq!(status.raw.get_number("clientid"), Some(7.0));
    }

    #[test]
    fn test_object_without_code_is_not_status() {
        let object = AmfObject::new().with("fmsVer", "FMS/3,0,1,123");
        assert!(RtmpStatus::from_object(&object).is_none());
    }
}
