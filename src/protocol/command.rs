use crate::amf::{Amf0Decoder, Amf0Encoder, Amf0Value, AmfObject};
use crate::protocol::status::RtmpStatus;
use crate::{ByteBuffer, Error, Result};

/// How the server should treat a published stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishType {
    #[default]
    Live,

    /// Record to a new file
    Record,

    /// Append to an existing recording
    Append,

    /// Append, keeping the gap in timestamps
    AppendWithGap,
}

impl PublishType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishType::Live => "live",
            PublishType::Record => "record",
            PublishType::Append => "append",
            PublishType::AppendWithGap => "appendWithGap",
        }
    }
}

/// An AMF0 command: name, transaction id, command object and arguments.
///
/// A missing command object is written as AMF0 null.
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpCommand {
    pub name: String,
    pub transaction_id: u32,
    pub command_object: Option<Amf0Value>,
    pub arguments: Vec<Amf0Value>,
}

impl RtmpCommand {
    pub fn new(name: impl Into<String>, transaction_id: u32) -> Self {
        RtmpCommand {
            name: name.into(),
            transaction_id,
            command_object: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_object(mut self, object: impl Into<Amf0Value>) -> Self {
        self.command_object = Some(object.into());
        self
    }

    pub fn with_argument(mut self, argument: impl Into<Amf0Value>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// `connect` always uses transaction id 1
    pub fn connect(command_object: AmfObject, transaction_id: u32) -> Self {
        RtmpCommand::new("connect", transaction_id).with_object(command_object)
    }

    pub fn create_stream(transaction_id: u32) -> Self {
        RtmpCommand::new("createStream", transaction_id).with_object(Amf0Value::Null)
    }

    /// Generic remote call with positional arguments
    pub fn call(name: impl Into<String>, transaction_id: u32, arguments: Vec<Amf0Value>) -> Self {
        let mut cmd = RtmpCommand::new(name, transaction_id).with_object(Amf0Value::Null);
        cmd.arguments = arguments;
        cmd
    }

    pub fn publish(stream_name: &str, publish_type: PublishType) -> Self {
        RtmpCommand::new("publish", 0)
            .with_object(Amf0Value::Null)
            .with_argument(stream_name)
            .with_argument(publish_type.as_str())
    }

    /// `start` of -2000 asks for a live stream, falling back to a recording
    pub fn play(stream_name: &str, start: f64) -> Self {
        RtmpCommand::new("play", 0)
            .with_object(Amf0Value::Null)
            .with_argument(stream_name)
            .with_argument(start)
    }

    /// `position` is the playback time in milliseconds
    pub fn pause(paused: bool, position: f64) -> Self {
        RtmpCommand::new("pause", 0)
            .with_object(Amf0Value::Null)
            .with_argument(paused)
            .with_argument(position)
    }

    pub fn seek(offset: f64) -> Self {
        RtmpCommand::new("seek", 0)
            .with_object(Amf0Value::Null)
            .with_argument(offset)
    }

    pub fn receive_audio(enabled: bool) -> Self {
        RtmpCommand::new("receiveAudio", 0)
            .with_object(Amf0Value::Null)
            .with_argument(enabled)
    }

    pub fn receive_video(enabled: bool) -> Self {
        RtmpCommand::new("receiveVideo", 0)
            .with_object(Amf0Value::Null)
            .with_argument(enabled)
    }

    pub fn delete_stream(transaction_id: u32, stream_id: u32) -> Self {
        RtmpCommand::new("deleteStream", transaction_id)
            .with_object(Amf0Value::Null)
            .with_argument(stream_id)
    }

    pub fn close_stream() -> Self {
        RtmpCommand::new("closeStream", 0).with_object(Amf0Value::Null)
    }

    /// `_result` reply carrying a properties value and an information value
    pub fn result(transaction_id: u32, properties: Amf0Value, information: Amf0Value) -> Self {
        RtmpCommand::new("_result", transaction_id)
            .with_object(properties)
            .with_argument(information)
    }

    pub fn error(transaction_id: u32, information: Amf0Value) -> Self {
        RtmpCommand::new("_error", transaction_id)
            .with_object(Amf0Value::Null)
            .with_argument(information)
    }

    pub fn on_status(status: &RtmpStatus) -> Self {
        RtmpCommand::new("onStatus", 0)
            .with_object(Amf0Value::Null)
            .with_argument(status.to_object())
    }

    pub fn is_result(&self) -> bool {
        self.name == "_result"
    }

    pub fn is_error(&self) -> bool {
        self.name == "_error"
    }

    /// The first status object among the command object and arguments
    pub fn status(&self) -> Option<RtmpStatus> {
        self.command_object
            .iter()
            .chain(self.arguments.iter())
            .find_map(RtmpStatus::from_value)
    }

    /// The information value of a reply: the last non-null argument
    pub fn information(&self) -> Option<&Amf0Value> {
        self.arguments.iter().rev().find(|v| !v.is_null())
    }

    /// Encode command to AMF0 bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::String(self.name.clone()))?;
        encoder.encode(&Amf0Value::Number(self.transaction_id as f64))?;
        encoder.encode(self.command_object.as_ref().unwrap_or(&Amf0Value::Null))?;
        encoder.encode_all(&self.arguments)?;
        Ok(encoder.into_bytes())
    }

    /// Decode command from AMF0 bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(data.to_vec());
        let mut decoder = Amf0Decoder::new(&mut buffer);

        let name = decoder.decode_string()?;
        let transaction_id = decoder.decode_number()?;
        if !transaction_id.is_finite() || transaction_id < 0.0 {
            return Err(Error::amf_decode(format!(
                "Invalid transaction id {} for '{}'",
                transaction_id, name
            )));
        }
        let command_object = if decoder.has_remaining() {
            Some(decoder.decode()?)
        } else {
            None
        };
        let arguments = decoder.decode_all()?;

        Ok(RtmpCommand {
            name,
            transaction_id: transaction_id as u32,
            command_object,
            arguments,
        })
    }
}
