use crate::message::SharedObjectMessage;
use crate::protocol::{RtmpData, RtmpStatus, SharedObjectChange};

/// Something the server sent that the caller may care about
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// An `onStatus`, or the status object of a command reply
    Status { stream_id: u32, status: RtmpStatus },
    Audio { stream_id: u32, timestamp: u32, payload: Vec<u8> },
    Video { stream_id: u32, timestamp: u32, payload: Vec<u8> },
    Data { stream_id: u32, timestamp: u32, data: RtmpData },
    /// A shared object message as received; `RtmpClient` folds it into
    /// the matching [`RemoteSharedObject`](crate::RemoteSharedObject)
    SharedObject { message: SharedObjectMessage },
    /// Changes applied to a shared object in use
    SharedObjectSync { name: String, changes: Vec<SharedObjectChange> },
}

impl ClientEvent {
    pub fn stream_id(&self) -> u32 {
        match self {
            ClientEvent::Status { stream_id, .. }
            | ClientEvent::Audio { stream_id, .. }
            | ClientEvent::Video { stream_id, .. }
            | ClientEvent::Data { stream_id, .. } => *stream_id,
            ClientEvent::SharedObject { .. } | ClientEvent::SharedObjectSync { .. } => 0,
        }
    }
}
