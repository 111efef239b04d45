use log::debug;

use crate::amf::{Amf0Value, AmfObject};
use crate::message::{SharedObjectEvent, SharedObjectEventType, SharedObjectMessage};
use crate::Result;

/// One entry of a sync: what happened to a property
#[derive(Debug, Clone, PartialEq)]
pub enum SharedObjectChange {
    /// The server set `name`
    Change { name: String, old_value: Option<Amf0Value> },
    /// The server accepted our change to `name`
    Success { name: String },
    /// The server refused our change; the local value was dropped
    Reject { name: String, old_value: Option<Amf0Value> },
    Delete { name: String, old_value: Option<Amf0Value> },
    Clear,
}

/// Local copy of a remote shared object.
///
/// Outgoing requests are built as messages for the caller to send; server
/// messages are folded in with [`apply`](Self::apply).
#[derive(Debug, Clone)]
pub struct RemoteSharedObject {
    name: String,
    persistent: bool,
    version: u32,
    synced: bool,
    data: AmfObject,
}

impl RemoteSharedObject {
    pub fn new(name: impl Into<String>, persistent: bool) -> Self {
        RemoteSharedObject {
            name: name.into(),
            persistent,
            version: 0,
            synced: false,
            data: AmfObject::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Version of the last server message
    pub fn version(&self) -> u32 {
        self.version
    }

    /// True once the server answered `use` with `use success`
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn data(&self) -> &AmfObject {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Amf0Value> {
        self.data.get(key)
    }

    fn message(&self, events: Vec<SharedObjectEvent>) -> SharedObjectMessage {
        let mut message = SharedObjectMessage::new(self.name.clone());
        message.version = self.version;
        if self.persistent {
            message.flags[3] = 0x02;
        }
        message.events = events;
        message
    }

    pub fn use_message(&self) -> SharedObjectMessage {
        self.message(vec![SharedObjectEvent::new(SharedObjectEventType::Use)])
    }

    /// Drop the local data and build the `release` message
    pub fn release(&mut self) -> SharedObjectMessage {
        self.data = AmfObject::new();
        self.synced = false;
        self.message(vec![SharedObjectEvent::new(SharedObjectEventType::Release)])
    }

    /// Set `key` locally and build the change request
    pub fn set_property(&mut self, key: &str, value: Amf0Value) -> Result<SharedObjectMessage> {
        let event = SharedObjectEvent::property(SharedObjectEventType::RequestChange, key, Some(&value))?;
        self.data.insert(key, value);
        Ok(self.message(vec![event]))
    }

    pub fn remove_property(&mut self, key: &str) -> Result<SharedObjectMessage> {
        let event = SharedObjectEvent::property(SharedObjectEventType::RequestRemove, key, None)?;
        Ok(self.message(vec![event]))
    }

    /// Fold a server message into the local data
    pub fn apply(&mut self, message: &SharedObjectMessage) -> Result<Vec<SharedObjectChange>> {
        self.version = message.version;
        let mut changes = Vec::new();

        for event in &message.events {
            let Some(kind) = event.kind() else {
                debug!("Shared object '{}': unknown event {}", self.name, event.event_type);
                continue;
            };
            match kind {
                SharedObjectEventType::UseSuccess => self.synced = true,
                SharedObjectEventType::Clear => {
                    self.data = AmfObject::new();
                    changes.push(SharedObjectChange::Clear);
                }
                SharedObjectEventType::Change
                | SharedObjectEventType::Success
                | SharedObjectEventType::Status
                | SharedObjectEventType::Remove => {
                    let Some((name, value)) = event.decode_property()? else {
                        debug!("Shared object '{}': {:?} without a property", self.name, kind);
                        continue;
                    };
                    let change = match kind {
                        SharedObjectEventType::Change => {
                            let old_value = self.data.remove(&name);
                            self.data.insert(name.clone(), value.unwrap_or(Amf0Value::Null));
                            SharedObjectChange::Change { name, old_value }
                        }
                        SharedObjectEventType::Success => SharedObjectChange::Success { name },
                        SharedObjectEventType::Status => {
                            let old_value = self.data.remove(&name);
                            SharedObjectChange::Reject { name, old_value }
                        }
                        _ => {
                            let old_value = self.data.remove(&name);
                            SharedObjectChange::Delete { name, old_value }
                        }
                    };
                    changes.push(change);
                }
                other => debug!("Shared object '{}': ignoring {:?}", self.name, other),
            }
        }
        Ok(changes)
    }
}
