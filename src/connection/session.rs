use std::collections::HashMap;

use log::{debug, warn};
use tokio::sync::{oneshot, watch};

use crate::amf::Amf0Value;
use crate::connection::state::{ConnectionState, SessionState, StreamState};
use crate::protocol::{RtmpCommand, RtmpStatus, CONNECT_TRANSACTION_ID};
use crate::{Error, Result};

pub type CommandResponder = oneshot::Sender<Result<RtmpCommand>>;
pub type StatusResponder = oneshot::Sender<Result<RtmpStatus>>;

struct PendingCommand {
    name: String,
    responder: CommandResponder,
}

/// A `publish` or `play` waiting for its `onStatus`
struct StatusWaiter {
    command: String,
    expected_code: String,
    responder: StatusResponder,
}

/// Command bookkeeping of one connection.
///
/// Owned by the connection task. Every responder is resolved exactly once:
/// by the matching reply, by a cancel, or by [`fail_all`](Self::fail_all).
pub struct CommandSession {
    state: SessionState,
    next_transaction_id: u32,
    pending: HashMap<u32, PendingCommand>,
    status_waiters: HashMap<u32, StatusWaiter>,
    watchers: Option<watch::Sender<SessionState>>,
}

impl Default for CommandSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSession {
    pub fn new() -> Self {
        CommandSession {
            state: SessionState::default(),
            next_transaction_id: CONNECT_TRANSACTION_ID + 1,
            pending: HashMap::new(),
            status_waiters: HashMap::new(),
            watchers: None,
        }
    }

    /// Receiver of state snapshots; the state is published before any
    /// responder sees the reply that changed it.
    pub fn watch(&mut self) -> watch::Receiver<SessionState> {
        match &self.watchers {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = watch::channel(self.state);
                self.watchers = Some(tx);
                rx
            }
        }
    }

    /// Publish snapshots through an existing channel
    pub fn watch_with(&mut self, watchers: watch::Sender<SessionState>) {
        watchers.send_replace(self.state);
        self.watchers = Some(watchers);
    }

    pub fn publish_state(&self) {
        if let Some(tx) = &self.watchers {
            tx.send_replace(self.state);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len() + self.status_waiters.len()
    }

    /// Allocate a transaction id; 0 and the connect id are never handed out
    pub fn next_transaction_id(&mut self) -> u32 {
        let id = self.next_transaction_id;
        self.next_transaction_id = match id.wrapping_add(1) {
            0 | CONNECT_TRANSACTION_ID => CONNECT_TRANSACTION_ID + 1,
            next => next,
        };
        id
    }

    pub fn set_connection_state(&mut self, next: ConnectionState) -> Result<()> {
        if self.state.connection == next {
            return Ok(());
        }
        if !self.state.connection.can_transition_to(next) {
            return Err(Error::invalid_state(format!(
                "Connection cannot go from {:?} to {:?}",
                self.state.connection, next
            )));
        }
        debug!("Connection state {:?} -> {:?}", self.state.connection, next);
        self.state.connection = next;
        Ok(())
    }

    pub fn set_stream_state(&mut self, next: StreamState) -> Result<()> {
        if self.state.stream == next {
            return Ok(());
        }
        if !self.state.stream.can_transition_to(next) {
            return Err(Error::invalid_state(format!(
                "Stream cannot go from {:?} to {:?}",
                self.state.stream, next
            )));
        }
        debug!("Stream state {:?} -> {:?}", self.state.stream, next);
        self.state.stream = next;
        Ok(())
    }

    /// Track `command` until its `_result` or `_error` arrives
    pub fn begin_command(&mut self, command: &RtmpCommand, responder: CommandResponder) {
        if command.name == "createStream" {
            if let Err(e) = self.set_stream_state(StreamState::CreatingStream) {
                let _ = responder.send(Err(e));
                return;
            }
        }
        if let Some(old) = self.pending.insert(
            command.transaction_id,
            PendingCommand {
                name: command.name.clone(),
                responder,
            },
        ) {
            warn!(
                "Transaction {} reused while '{}' was pending",
                command.transaction_id, old.name
            );
            let _ = old.responder.send(Err(Error::invalid_state("Transaction id reused")));
        }
    }

    /// Match a `_result` or `_error`. Returns false when nothing was waiting for it.
    pub fn resolve(&mut self, reply: &RtmpCommand) -> bool {
        if !reply.is_result() && !reply.is_error() {
            return false;
        }
        let Some(pending) = self.pending.remove(&reply.transaction_id) else {
            return false;
        };

        let outcome = if reply.is_result() {
            match pending.name.as_str() {
                "connect" => {
                    if let Err(e) = self.set_connection_state(ConnectionState::Connected) {
                        warn!("{}", e);
                    }
                }
                "createStream" => {
                    self.state.stream_id = reply
                        .information()
                        .and_then(Amf0Value::as_number)
                        .map(|id| id as u32);
                    let _ = self.set_stream_state(StreamState::Idle);
                }
                _ => {}
            }
            Ok(reply.clone())
        } else {
            if pending.name == "createStream" {
                let _ = self.set_stream_state(StreamState::Idle);
            }
            Err(Error::command_failed(
                pending.name,
                reply.transaction_id,
                reply.information().cloned(),
            ))
        };

        self.publish_state();
        let _ = pending.responder.send(outcome);
        true
    }

    /// Wait for the `onStatus` of `command` on `stream_id`
    pub fn await_status(
        &mut self,
        stream_id: u32,
        command: &str,
        expected_code: &str,
        responder: StatusResponder,
    ) {
        let waiter = StatusWaiter {
            command: command.to_string(),
            expected_code: expected_code.to_string(),
            responder,
        };
        if let Some(old) = self.status_waiters.insert(stream_id, waiter) {
            let _ = old
                .responder
                .send(Err(Error::invalid_state("Superseded by a newer stream command")));
        }
    }

    /// Match an `onStatus` for `stream_id`.
    ///
    /// An error-level status fails the waiter; other codes than the expected
    /// one (such as `NetStream.Play.Reset`) leave it waiting.
    pub fn resolve_status(&mut self, stream_id: u32, status: &RtmpStatus) -> bool {
        let Some(waiter) = self.status_waiters.get(&stream_id) else {
            return false;
        };
        if !status.is_error() && status.code != waiter.expected_code {
            return false;
        }
        let Some(waiter) = self.status_waiters.remove(&stream_id) else {
            return false;
        };

        let outcome = if status.is_error() {
            Err(Error::command_failed(
                waiter.command,
                0,
                Some(Amf0Value::Object(status.raw.clone())),
            ))
        } else {
            let next = match waiter.command.as_str() {
                "publish" => Some(StreamState::Publishing),
                "play" => Some(StreamState::Playing),
                _ => None,
            };
            if let Some(next) = next {
                if let Err(e) = self.set_stream_state(next) {
                    warn!("{}", e);
                }
            }
            Ok(status.clone())
        };
        self.publish_state();
        let _ = waiter.responder.send(outcome);
        true
    }

    /// Forget a command whose caller gave up waiting
    pub fn cancel_command(&mut self, transaction_id: u32) -> bool {
        let Some(pending) = self.pending.remove(&transaction_id) else {
            return false;
        };
        debug!("Cancelled '{}' (transaction {})", pending.name, transaction_id);
        if pending.name == "createStream" {
            let _ = self.set_stream_state(StreamState::Idle);
        }
        true
    }

    pub fn cancel_status(&mut self, stream_id: u32) -> bool {
        self.status_waiters.remove(&stream_id).is_some()
    }

    /// Drop every entry whose caller stopped listening, e.g. after a timeout
    pub fn cancel_abandoned(&mut self) -> usize {
        let commands: Vec<u32> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.responder.is_closed())
            .map(|(id, _)| *id)
            .collect();
        let streams: Vec<u32> = self
            .status_waiters
            .iter()
            .filter(|(_, waiter)| waiter.responder.is_closed())
            .map(|(id, _)| *id)
            .collect();

        let mut cancelled = 0;
        for id in commands {
            cancelled += usize::from(self.cancel_command(id));
        }
        for id in streams {
            cancelled += usize::from(self.cancel_status(id));
        }
        cancelled
    }

    /// The stream was deleted; a later `createStream` may open another
    pub fn stream_closed(&mut self) {
        self.status_waiters.clear();
        self.state.stream = StreamState::Closed;
        self.state.stream_id = None;
    }

    /// Fail everything still waiting and close both state machines
    pub fn fail_all(&mut self) {
        self.state.connection = ConnectionState::Closed;
        self.state.stream = StreamState::Closed;
        self.publish_state();
        for (_, pending) in self.pending.drain() {
            let _ = pending.responder.send(Err(Error::TransportClosed));
        }
        for (_, waiter) in self.status_waiters.drain() {
            let _ = waiter.responder.send(Err(Error::TransportClosed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::AmfObject;
    use crate::protocol::status::codes;

    fn connected() -> CommandSession {
        let mut session = CommandSession::new();
        session.set_connection_state(ConnectionState::Handshaking).unwrap();
        session.set_connection_state(ConnectionState::Connected).unwrap();
        session
    }

    #[test]
    fn test_transaction_ids_skip_connect() {
        let mut session = CommandSession::new();
        assert_eq!(session.next_transaction_id(), 2);
        assert_eq!(session.next_transaction_id(), 3);

        session.next_transaction_id = u32::MAX;
        assert_eq!(session.next_transaction_id(), u32::MAX);
        assert_eq!(session.next_transaction_id(), 2);
    }

    #[test]
    fn test_connect_result() {
        let mut session = CommandSession::new();
        session.set_connection_state(ConnectionState::Handshaking).unwrap();

        let (tx, mut rx) = oneshot::channel();
        session.begin_command(&RtmpCommand::connect(AmfObject::new(), 1), tx);

        let reply = RtmpCommand::result(1, Amf0Value::Null, Amf0Value::Null);
        assert!(session.resolve(&reply));
        assert!(rx.try_recv().unwrap().is_ok());
        assert_eq!(session.state().connection, ConnectionState::Connected);
        assert!(!session.resolve(&reply));
    }

    #[test]
    fn test_connect_error_carries_status() {
        let mut session = CommandSession::new();
        let (tx, mut rx) = oneshot::channel();
        session.begin_command(&RtmpCommand::connect(AmfObject::new(), 1), tx);

        let status = RtmpStatus::new("error", codes::CONNECT_REJECTED, "denied");
        assert!(session.resolve(&RtmpCommand::error(1, status.to_object().into())));
        match rx.try_recv().unwrap() {
            Err(Error::CommandFailed {
                command,
                transaction_id,
                status: Some(info),
            }) => {
                assert_eq!(command, "connect");
                assert_eq!(transaction_id, 1);
                assert_eq!(
                    RtmpStatus::from_value(&info).unwrap().code,
                    codes::CONNECT_REJECTED
                );
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_watch_sees_state_with_reply() {
        let mut session = CommandSession::new();
        session.set_connection_state(ConnectionState::Handshaking).unwrap();
        let state = session.watch();

        let (tx, mut rx) = oneshot::channel();
        session.begin_command(&RtmpCommand::connect(AmfObject::new(), 1), tx);
        session.resolve(&RtmpCommand::result(1, Amf0Value::Null, Amf0Value::Null));

        assert!(rx.try_recv().unwrap().is_ok());
        assert_eq!(state.borrow().connection, ConnectionState::Connected);
    }

    #[test]
    fn test_create_stream_sets_stream_id() {
        let mut session = connected();
        let tid = session.next_transaction_id();
        let (tx, mut rx) = oneshot::channel();
        session.begin_command(&RtmpCommand::create_stream(tid), tx);
        assert_eq!(session.state().stream, StreamState::CreatingStream);

        session.resolve(&RtmpCommand::result(tid, Amf0Value::Null, 1.0.into()));
        assert!(rx.try_recv().unwrap().is_ok());
        assert_eq!(session.state().stream, StreamState::Idle);
        assert_eq!(session.state().stream_id, Some(1));
    }

    #[test]
    fn test_publish_status() {
        let mut session = connected();
        let (tx, mut rx) = oneshot::channel();
        session.await_status(1, "publish", codes::PUBLISH_START, tx);

        let unrelated = RtmpStatus::new("status", codes::BUFFER_FULL, "");
        assert!(!session.resolve_status(1, &unrelated));
        assert!(!session.resolve_status(2, &RtmpStatus::new("status", codes::PUBLISH_START, "")));

        assert!(session.resolve_status(1, &RtmpStatus::new("status", codes::PUBLISH_START, "")));
        assert_eq!(rx.try_recv().unwrap().unwrap().code, codes::PUBLISH_START);
        assert_eq!(session.state().stream, StreamState::Publishing);
    }

    #[test]
    fn test_play_error_status() {
        let mut session = connected();
        let (tx, mut rx) = oneshot::channel();
        session.await_status(1, "play", codes::PLAY_START, tx);

        let status = RtmpStatus::new("error", codes::PLAY_STREAM_NOT_FOUND, "no such stream");
        assert!(session.resolve_status(1, &status));
        assert!(matches!(
            rx.try_recv().unwrap(),
            Err(Error::CommandFailed { ref command, .. }) if command == "play"
        ));
        assert_eq!(session.state().stream, StreamState::Idle);
    }

    #[test]
    fn test_cancel_abandoned() {
        let mut session = connected();
        let (tx1, rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        let (tx3, rx3) = oneshot::channel();
        session.begin_command(&RtmpCommand::create_stream(2), tx1);
        session.begin_command(&RtmpCommand::call("kept", 3, vec![]), tx2);
        session.await_status(1, "publish", codes::PUBLISH_START, tx3);
        drop(rx1);
        drop(rx3);

        assert_eq!(session.cancel_abandoned(), 2);
        assert_eq!(session.pending_count(), 1);
        assert_eq!(session.state().stream, StreamState::Idle);
    }

    #[test]
    fn test_cancel_and_fail_all() {
        let mut session = connected();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, mut rx2) = oneshot::channel();
        let (tx3, mut rx3) = oneshot::channel();
        session.begin_command(&RtmpCommand::call("first", 2, vec![]), tx1);
        session.begin_command(&RtmpCommand::call("second", 3, vec![]), tx2);
        session.await_status(1, "play", codes::PLAY_START, tx3);

        assert!(session.cancel_command(2));
        assert!(!session.cancel_command(2));
        assert_eq!(session.pending_count(), 2);

        session.fail_all();
        assert!(matches!(rx2.try_recv().unwrap(), Err(Error::TransportClosed)));
        assert!(matches!(rx3.try_recv().unwrap(), Err(Error::TransportClosed)));
        assert_eq!(session.pending_count(), 0);
        assert_eq!(session.state().connection, ConnectionState::Closed);
        assert_eq!(session.state().stream, StreamState::Closed);
    }
}
