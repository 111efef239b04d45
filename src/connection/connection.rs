use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::chunk::{ChunkReader, ChunkWriter};
use crate::connection::event::ClientEvent;
use crate::connection::session::{CommandResponder, CommandSession, StatusResponder};
use crate::connection::state::{ConnectionState, SessionState};
use crate::connection::stats::TransportStats;
use crate::message::{RtmpMessage, UserControlEvent};
use crate::protocol::{RtmpCommand, RtmpPacket, RtmpStatus, CONNECT_TRANSACTION_ID};
use crate::{Error, Result};

const READ_BUFFER_SIZE: usize = 16 * 1024;
const REQUEST_QUEUE_SIZE: usize = 64;

/// Work handed to the connection task
enum Request {
    /// Send a command; with a responder, wait for its `_result`/`_error`
    Call {
        command: RtmpCommand,
        message_stream_id: u32,
        responder: Option<CommandResponder>,
    },
    /// Send `publish`/`play` and wait for the matching `onStatus`
    StreamCommand {
        command: RtmpCommand,
        stream_id: u32,
        expected_code: &'static str,
        responder: StatusResponder,
    },
    Send {
        message: RtmpMessage,
        timestamp: u32,
        message_stream_id: u32,
    },
    DropAbandoned,
    StreamClosed,
    Close,
}

/// Caller side of a running connection task
pub struct ConnectionHandle {
    id: Uuid,
    requests: mpsc::Sender<Request>,
    state: watch::Receiver<SessionState>,
    stats: Arc<TransportStats>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// Start the task that owns `stream`.
    ///
    /// The handshake must already be done. `chunk_size` is announced to the
    /// server once `connect` succeeds. `window_ack_size` paces our
    /// Acknowledgements until the server sends its own window; 0 disables them.
    pub fn spawn<S>(
        stream: S,
        id: Uuid,
        chunk_size: u32,
        window_ack_size: u32,
    ) -> (ConnectionHandle, mpsc::UnboundedReceiver<ClientEvent>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let state = watch::Sender::new(SessionState::default());
        ConnectionHandle::spawn_watched(stream, id, chunk_size, window_ack_size, state)
    }

    /// Like [`spawn`](Self::spawn), publishing state through `state`
    pub fn spawn_watched<S>(
        stream: S,
        id: Uuid,
        chunk_size: u32,
        window_ack_size: u32,
        state: watch::Sender<SessionState>,
    ) -> (ConnectionHandle, mpsc::UnboundedReceiver<ClientEvent>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_SIZE);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(TransportStats::new());

        let mut session = CommandSession::new();
        // Idle -> Handshaking is always valid
        let _ = session.set_connection_state(ConnectionState::Handshaking);
        let state_rx = state.subscribe();
        session.watch_with(state);

        let connection = Connection {
            id,
            reader: ChunkReader::new(),
            writer: ChunkWriter::new(),
            session,
            stats: stats.clone(),
            events: event_tx,
            chunk_size,
            window_size: window_ack_size,
            ack_sequence: 0,
            running: true,
        };
        let task = tokio::spawn(connection.run(stream, request_rx));

        let handle = ConnectionHandle {
            id,
            requests: request_tx,
            state: state_rx,
            stats,
            task,
        };
        (handle, event_rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver that sees every state change
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn stats(&self) -> Arc<TransportStats> {
        self.stats.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_finished() || self.state().connection == ConnectionState::Closed
    }

    /// Send a command and wait for its reply.
    ///
    /// `connect` keeps transaction id 1, any other command gets a fresh id.
    pub async fn call(
        &self,
        command: RtmpCommand,
        message_stream_id: u32,
        timeout: Duration,
    ) -> Result<RtmpCommand> {
        let name = command.name.clone();
        let (tx, rx) = oneshot::channel();
        self.submit(Request::Call {
            command,
            message_stream_id,
            responder: Some(tx),
        })
        .await?;
        self.wait(rx, timeout, &name).await
    }

    /// Send a command without waiting for any reply
    pub async fn notify(&self, command: RtmpCommand, message_stream_id: u32) -> Result<()> {
        self.submit(Request::Call {
            command,
            message_stream_id,
            responder: None,
        })
        .await
    }

    /// Send `publish` or `play` and wait for `expected_code` on `stream_id`
    pub async fn stream_command(
        &self,
        command: RtmpCommand,
        stream_id: u32,
        expected_code: &'static str,
        timeout: Duration,
    ) -> Result<RtmpStatus> {
        let name = command.name.clone();
        let (tx, rx) = oneshot::channel();
        self.submit(Request::StreamCommand {
            command,
            stream_id,
            expected_code,
            responder: tx,
        })
        .await?;
        self.wait(rx, timeout, &name).await
    }

    pub async fn send(&self, message: RtmpMessage, timestamp: u32, message_stream_id: u32) -> Result<()> {
        self.submit(Request::Send {
            message,
            timestamp,
            message_stream_id,
        })
        .await
    }

    pub async fn stream_closed(&self) -> Result<()> {
        self.submit(Request::StreamClosed).await
    }

    /// Stop the task and wait until the transport is shut down
    pub async fn close(self) {
        let _ = self.requests.send(Request::Close).await;
        if let Err(e) = self.task.await {
            error!("[{}] Connection task failed: {}", self.id, e);
        }
    }

    async fn submit(&self, request: Request) -> Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| Error::TransportClosed)
    }

    async fn wait<T>(
        &self,
        rx: oneshot::Receiver<Result<T>>,
        timeout: Duration,
        name: &str,
    ) -> Result<T> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::TransportClosed),
            Err(_) => {
                // The receiver is gone now; let the task forget the entry
                let _ = self.requests.send(Request::DropAbandoned).await;
                Err(Error::timeout(format!(
                    "'{}' got no reply within {:?}",
                    name, timeout
                )))
            }
        }
    }
}

/// State owned by the connection task
struct Connection {
    id: Uuid,
    reader: ChunkReader,
    writer: ChunkWriter,
    session: CommandSession,
    stats: Arc<TransportStats>,
    events: mpsc::UnboundedSender<ClientEvent>,
    /// Outgoing chunk size announced after `connect`
    chunk_size: u32,
    /// Acknowledgement window; 0 disables acknowledgements
    window_size: u32,
    ack_sequence: u64,
    running: bool,
}

impl Connection {
    async fn run<S>(mut self, stream: S, mut requests: mpsc::Receiver<Request>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        info!("[{}] Connection task started", self.id);
        let (mut rd, mut wr) = tokio::io::split(stream);
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        while self.running {
            let result = tokio::select! {
                read = rd.read(&mut buf) => match read {
                    Ok(0) => {
                        info!("[{}] Connection closed by peer", self.id);
                        break;
                    }
                    Ok(n) => self.on_bytes(&buf[..n], &mut wr).await,
                    Err(e) => Err(e.into()),
                },
                request = requests.recv() => match request {
                    Some(request) => self.on_request(request, &mut wr).await,
                    None => {
                        debug!("[{}] All handles dropped", self.id);
                        break;
                    }
                },
            };
            if let Err(e) = result {
                error!("[{}] Connection error: {}", self.id, e);
                break;
            }
        }

        if let Err(e) = wr.shutdown().await {
            debug!("[{}] Shutdown: {}", self.id, e);
        }
        self.session.fail_all();
        self.reader.reset();
        self.publish_state();
        info!(
            "[{}] Connection closed ({} bytes in, {} bytes out)",
            self.id,
            self.stats.total_bytes_in(),
            self.stats.total_bytes_out()
        );
    }

    fn publish_state(&self) {
        self.session.publish_state();
    }

    fn emit(&self, event: ClientEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    async fn on_request<W>(&mut self, request: Request, wr: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match request {
            Request::Call {
                mut command,
                message_stream_id,
                responder,
            } => {
                if command.name == "connect" {
                    command.transaction_id = CONNECT_TRANSACTION_ID;
                } else {
                    command.transaction_id = self.session.next_transaction_id();
                }
                debug!(
                    "[{}] -> {} (transaction {})",
                    self.id, command.name, command.transaction_id
                );
                if let Some(responder) = responder {
                    self.session.begin_command(&command, responder);
                    self.publish_state();
                }
                self.send(command.into(), 0, message_stream_id, wr).await
            }
            Request::StreamCommand {
                command,
                stream_id,
                expected_code,
                responder,
            } => {
                debug!("[{}] -> {} on stream {}", self.id, command.name, stream_id);
                self.session
                    .await_status(stream_id, &command.name, expected_code, responder);
                self.send(command.into(), 0, stream_id, wr).await
            }
            Request::Send {
                message,
                timestamp,
                message_stream_id,
            } => self.send(message, timestamp, message_stream_id, wr).await,
            Request::DropAbandoned => {
                let dropped = self.session.cancel_abandoned();
                debug!("[{}] Dropped {} abandoned request(s)", self.id, dropped);
                self.publish_state();
                Ok(())
            }
            Request::StreamClosed => {
                self.session.stream_closed();
                self.publish_state();
                Ok(())
            }
            Request::Close => {
                debug!("[{}] Close requested", self.id);
                self.running = false;
                Ok(())
            }
        }
    }

    async fn send<W>(
        &mut self,
        message: RtmpMessage,
        timestamp: u32,
        message_stream_id: u32,
        wr: &mut W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let packet = message.into_packet(timestamp, message_stream_id)?;
        let bytes = self.writer.write_packet(&packet)?;
        trace!(
            "[{}] -> type {} on chunk stream {} ({} bytes on the wire)",
            self.id,
            packet.header.message_type,
            packet.header.chunk_stream_id,
            bytes.len()
        );

        self.stats.queued(bytes.len());
        let result = async {
            wr.write_all(&bytes).await?;
            wr.flush().await
        }
        .await;
        self.stats.written(bytes.len(), result.is_ok());
        Ok(result?)
    }

    async fn on_bytes<W>(&mut self, data: &[u8], wr: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let total = self.stats.add_bytes_in(data.len());
        self.reader.feed(data);
        loop {
            match self.reader.read_packet() {
                Ok(Some(packet)) => self.on_packet(packet, wr).await?,
                Ok(None) => break,
                Err(e @ Error::MalformedHeader { .. }) => {
                    warn!("[{}] Dropping chunk stream: {}", self.id, e);
                }
                Err(e) => {
                    warn!("[{}] Chunk stream unreadable: {}", self.id, e);
                    return Err(e);
                }
            }
            if !self.running {
                return Ok(());
            }
        }
        self.acknowledge(total, wr).await
    }

    /// Send an Acknowledgement each time another window of bytes came in
    async fn acknowledge<W>(&mut self, total: u64, wr: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if self.window_size == 0 {
            return Ok(());
        }
        let window = self.window_size as u64;
        if window * (self.ack_sequence + 1) <= total {
            self.ack_sequence = total / window;
            trace!("[{}] Acknowledging {} bytes", self.id, total);
            self.send(RtmpMessage::Acknowledgement(total as u32), 0, 0, wr)
                .await?;
        }
        Ok(())
    }

    async fn on_packet<W>(&mut self, packet: RtmpPacket, wr: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let stream_id = packet.header.message_stream_id;
        let timestamp = packet.header.timestamp;
        let message = match RtmpMessage::decode(&packet) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    "[{}] Skipping message type {} ({} bytes): {}",
                    self.id,
                    packet.header.message_type,
                    packet.payload.len(),
                    e
                );
                return Ok(());
            }
        };
        trace!(
            "[{}] <- type {} on stream {} at {}",
            self.id,
            message.type_id(),
            stream_id,
            timestamp
        );

        match message {
            // Chunk size and abort were already applied by the reader
            RtmpMessage::SetChunkSize(size) => debug!("[{}] Server chunk size {}", self.id, size),
            RtmpMessage::Abort(id) => debug!("[{}] Server aborted chunk stream {}", self.id, id),
            RtmpMessage::Acknowledgement(sequence) => {
                trace!("[{}] Server acknowledged {} bytes", self.id, sequence)
            }
            RtmpMessage::WindowAcknowledgementSize(size) => {
                debug!("[{}] Window acknowledgement size {}", self.id, size);
                self.window_size = size;
                self.send(RtmpMessage::WindowAcknowledgementSize(size), 0, 0, wr)
                    .await?;
            }
            RtmpMessage::SetPeerBandwidth { size, limit } => {
                debug!("[{}] Peer bandwidth {} ({:?})", self.id, size, limit)
            }
            RtmpMessage::UserControl(UserControlEvent::PingRequest(value)) => {
                trace!("[{}] Ping {}", self.id, value);
                let pong = UserControlEvent::PingResponse(value);
                self.send(pong.into(), 0, 0, wr).await?;
            }
            RtmpMessage::UserControl(event) => debug!("[{}] User control {:?}", self.id, event),
            RtmpMessage::Audio(payload) => self.emit(ClientEvent::Audio {
                stream_id,
                timestamp,
                payload,
            }),
            RtmpMessage::Video(payload) => self.emit(ClientEvent::Video {
                stream_id,
                timestamp,
                payload,
            }),
            RtmpMessage::Data { data, .. } => self.emit(ClientEvent::Data {
                stream_id,
                timestamp,
                data,
            }),
            RtmpMessage::Command { command, .. } => self.on_command(command, stream_id, wr).await?,
            RtmpMessage::SharedObject { message, .. } => {
                trace!("[{}] Shared object '{}' v{}", self.id, message.name, message.version);
                self.emit(ClientEvent::SharedObject { message })
            }
            RtmpMessage::Aggregate(payload) => {
                debug!("[{}] Ignoring aggregate of {} bytes", self.id, payload.len())
            }
            RtmpMessage::Unknown { type_id, .. } => {
                debug!("[{}] Ignoring message type {}", self.id, type_id)
            }
        }
        Ok(())
    }

    async fn on_command<W>(&mut self, command: RtmpCommand, stream_id: u32, wr: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        debug!(
            "[{}] <- {} (transaction {}) on stream {}",
            self.id, command.name, command.transaction_id, stream_id
        );
        let status = command.status();

        if self.session.resolve(&command) {
            self.publish_state();
            if command.is_result() && command.transaction_id == CONNECT_TRANSACTION_ID {
                info!("[{}] Connected", self.id);
                self.send(RtmpMessage::SetChunkSize(self.chunk_size), 0, 0, wr)
                    .await?;
                self.writer.set_chunk_size(self.chunk_size as usize);
            }
        } else {
            match command.name.as_str() {
                "onStatus" => {
                    if let Some(status) = &status {
                        if self.session.resolve_status(stream_id, status) {
                            self.publish_state();
                        }
                    }
                }
                "close" => {
                    info!("[{}] Server closed the connection", self.id);
                    self.running = false;
                }
                "_result" | "_error" => debug!(
                    "[{}] Reply for unknown transaction {}",
                    self.id, command.transaction_id
                ),
                other => debug!("[{}] Ignoring server command '{}'", self.id, other),
            }
        }

        if let Some(status) = status {
            self.emit(ClientEvent::Status { stream_id, status });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::{Amf0Value, AmfObject};
    use crate::connection::state::StreamState;
    use crate::message::PeerBandwidthLimit;
    use crate::protocol::PublishType;
    use crate::protocol::status::codes;
    use tokio::io::DuplexStream;

    /// Server end of a duplex pipe speaking chunks
    struct Peer {
        io: DuplexStream,
        reader: ChunkReader,
        writer: ChunkWriter,
    }

    impl Peer {
        fn new(io: DuplexStream) -> Self {
            Peer {
                io,
                reader: ChunkReader::new(),
                writer: ChunkWriter::new(),
            }
        }

        async fn send(&mut self, message: RtmpMessage, stream_id: u32) {
            let packet = message.into_packet(0, stream_id).unwrap();
            let bytes = self.writer.write_packet(&packet).unwrap();
            self.io.write_all(&bytes).await.unwrap();
        }

        async fn recv(&mut self) -> RtmpMessage {
            let mut buf = [0u8; 4096];
            loop {
                if let Some(packet) = self.reader.read_packet().unwrap() {
                    return RtmpMessage::decode(&packet).unwrap();
                }
                let n = self.io.read(&mut buf).await.unwrap();
                assert!(n > 0, "client hung up");
                self.reader.feed(&buf[..n]);
            }
        }

        async fn recv_command(&mut self) -> RtmpCommand {
            loop {
                if let RtmpMessage::Command { command, .. } = self.recv().await {
                    return command;
                }
            }
        }
    }

    fn start() -> (ConnectionHandle, mpsc::UnboundedReceiver<ClientEvent>, Peer) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (handle, events) = ConnectionHandle::spawn(client, Uuid::new_v4(), 4096, 0);
        (handle, events, Peer::new(server))
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_connect_announces_chunk_size() {
        let (handle, mut events, mut peer) = start();
        assert_eq!(handle.state().connection, ConnectionState::Handshaking);

        let call = tokio::spawn(async move {
            let result = handle
                .call(RtmpCommand::connect(AmfObject::new(), 0), 0, TIMEOUT)
                .await;
            (handle, result)
        });

        let connect = peer.recv_command().await;
        assert_eq!(connect.name, "connect");
        assert_eq!(connect.transaction_id, 1);

        let info = RtmpStatus::new("status", codes::CONNECT_SUCCESS, "ok");
        let reply = RtmpCommand::result(1, Amf0Value::Null, info.to_object().into());
        peer.send(reply.into(), 0).await;

        let (handle, result) = call.await.unwrap();
        assert!(result.unwrap().is_result());
        assert_eq!(handle.state().connection, ConnectionState::Connected);
        assert_eq!(peer.recv().await, RtmpMessage::SetChunkSize(4096));

        match events.recv().await.unwrap() {
            ClientEvent::Status { status, .. } => assert_eq!(status.code, codes::CONNECT_SUCCESS),
            other => panic!("unexpected event {:?}", other),
        }
        handle.close().await;
    }

    #[tokio::test]
    async fn test_ping_and_window() {
        let (handle, _events, mut peer) = start();

        peer.send(UserControlEvent::PingRequest(77).into(), 0).await;
        assert_eq!(
            peer.recv().await,
            RtmpMessage::UserControl(UserControlEvent::PingResponse(77))
        );

        peer.send(RtmpMessage::WindowAcknowledgementSize(64), 0).await;
        assert_eq!(peer.recv().await, RtmpMessage::WindowAcknowledgementSize(64));

        peer.send(
            RtmpMessage::SetPeerBandwidth {
                size: 64,
                limit: PeerBandwidthLimit::Dynamic,
            },
            0,
        )
        .await;
        peer.send(RtmpMessage::Audio(vec![0xAF; 100]), 1).await;
        match peer.recv().await {
            RtmpMessage::Acknowledgement(total) => assert!(total >= 64),
            other => panic!("unexpected message {:?}", other),
        }
        assert!(handle.stats().total_bytes_in() >= 64);
        assert!(handle.stats().total_bytes_out() > 0);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_media_events() {
        let (handle, mut events, mut peer) = start();
        peer.send(RtmpMessage::Video(vec![0x17, 0, 0, 0, 0]), 1).await;
        assert_eq!(
            events.recv().await.unwrap(),
            ClientEvent::Video {
                stream_id: 1,
                timestamp: 0,
                payload: vec![0x17, 0, 0, 0, 0]
            }
        );
        handle.close().await;
    }

    #[tokio::test]
    async fn test_stream_command_status() {
        let (handle, _events, mut peer) = start();

        let publish = tokio::spawn(async move {
            let result = handle
                .stream_command(
                    RtmpCommand::publish("live", PublishType::Live),
                    1,
                    codes::PUBLISH_START,
                    TIMEOUT,
                )
                .await;
            (handle, result)
        });
        let command = peer.recv_command().await;
        assert_eq!(command.name, "publish");

        let status = RtmpStatus::new("status", codes::PUBLISH_START, "started");
        peer.send(RtmpCommand::on_status(&status).into(), 1).await;

        let (handle, result) = publish.await.unwrap();
        assert_eq!(result.unwrap().code, codes::PUBLISH_START);
        assert_eq!(handle.state().stream, StreamState::Publishing);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_peer_hangup_fails_pending() {
        let (handle, _events, mut peer) = start();
        let call = tokio::spawn(async move {
            handle
                .call(RtmpCommand::call("checkBandwidth", 0, vec![]), 0, TIMEOUT)
                .await
        });
        let command = peer.recv_command().await;
        assert_eq!(command.transaction_id, 2);
        drop(peer);

        assert!(matches!(call.await.unwrap(), Err(Error::TransportClosed)));
    }

    #[tokio::test]
    async fn test_replies_out_of_order() {
        let (handle, _events, mut peer) = start();
        let calls = tokio::spawn(async move {
            let (first, second) = tokio::join!(
                handle.call(RtmpCommand::call("first", 0, vec![]), 0, TIMEOUT),
                handle.call(RtmpCommand::call("second", 0, vec![]), 0, TIMEOUT),
            );
            handle.close().await;
            (first, second)
        });

        let a = peer.recv_command().await;
        let b = peer.recv_command().await;
        assert_ne!(a.transaction_id, b.transaction_id);
        // answer the later transaction first, each reply naming its command
        for command in [&b, &a] {
            let reply = RtmpCommand::result(
                command.transaction_id,
                Amf0Value::Null,
                command.name.as_str().into(),
            );
            peer.send(reply.into(), 0).await;
        }

        let (first, second) = calls.await.unwrap();
        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(first.information().and_then(Amf0Value::as_string), Some("first"));
        assert_eq!(second.information().and_then(Amf0Value::as_string), Some("second"));
        assert_ne!(first.transaction_id, second.transaction_id);
    }

    #[tokio::test]
    async fn test_malformed_chunk_keeps_connection() {
        let (handle, _events, mut peer) = start();
        // type 1 chunk on a chunk stream that never had a type 0 header
        peer.io
            .write_all(&[0x47, 0, 0, 10, 0, 0, 1, 8, 0xAA])
            .await
            .unwrap();
        peer.send(UserControlEvent::PingRequest(9).into(), 0).await;
        assert_eq!(
            peer.recv().await,
            RtmpMessage::UserControl(UserControlEvent::PingResponse(9))
        );
        assert_ne!(handle.state().connection, ConnectionState::Closed);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_timeout_drops_pending() {
        let (handle, _events, mut peer) = start();
        let result = handle
            .call(RtmpCommand::call("slow", 0, vec![]), 0, Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert_eq!(peer.recv_command().await.name, "slow");

        // a late reply is ignored and the connection keeps working
        peer.send(RtmpCommand::result(2, Amf0Value::Null, Amf0Value::Null).into(), 0)
            .await;
        peer.send(UserControlEvent::PingRequest(1).into(), 0).await;
        assert_eq!(
            peer.recv().await,
            RtmpMessage::UserControl(UserControlEvent::PingResponse(1))
        );
        handle.close().await;
    }

    #[tokio::test]
    async fn test_server_close_command() {
        let (handle, _events, mut peer) = start();
        let mut state = handle.watch_state();
        peer.send(RtmpCommand::new("close", 0).into(), 0).await;

        state
            .wait_for(|s| s.connection == ConnectionState::Closed)
            .await
            .unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(peer.io.read(&mut buf).await.unwrap(), 0);
    }
}
