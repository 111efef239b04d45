// Common test utilities for integration tests
//
// A scripted RTMP server over an in-memory duplex pipe

#![allow(dead_code)]

use std::time::{Duration, Instant};

use rtmp::status::codes;
use rtmp::{
    Amf0Value, ChunkReader, ChunkWriter, ClientConfig, RtmpCommand, RtmpMessage, RtmpStatus,
    server_handshake,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub const TEST_URL: &str = "rtmp://localhost/live";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Create a simple test client configuration
pub fn test_client_config() -> ClientConfig {
    ClientConfig::builder()
        .chunk_size(4096)
        .buffer_time(1000)
        .connect_timeout(Duration::from_secs(5))
        .request_timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to create test client config")
}

/// Server end of the pipe, driven step by step by a test
pub struct MockServer {
    pub io: DuplexStream,
    reader: ChunkReader,
    writer: ChunkWriter,
}

/// Client transport plus the server that answers on it
pub fn pipe() -> (DuplexStream, MockServer) {
    let (client, server) = tokio::io::duplex(256 * 1024);
    let server = MockServer {
        io: server,
        reader: ChunkReader::new(),
        writer: ChunkWriter::new(),
    };
    (client, server)
}

/// `tcUrl` of a `connect` command
pub fn tc_url(connect: &RtmpCommand) -> String {
    connect
        .command_object
        .as_ref()
        .and_then(Amf0Value::as_object)
        .and_then(|object| object.get_str("tcUrl"))
        .expect("connect without tcUrl")
        .to_string()
}

impl MockServer {
    pub async fn handshake(&mut self) {
        server_handshake(&mut self.io, Instant::now())
            .await
            .expect("server handshake failed");
    }

    pub async fn send(&mut self, message: RtmpMessage, stream_id: u32) {
        self.send_at(message, 0, stream_id).await;
    }

    pub async fn send_at(&mut self, message: RtmpMessage, timestamp: u32, stream_id: u32) {
        let packet = message.into_packet(timestamp, stream_id).unwrap();
        let bytes = self.writer.write_packet(&packet).unwrap();
        self.io.write_all(&bytes).await.unwrap();
    }

    /// Next message with its timestamp and message stream id, `None` on EOF
    pub async fn recv_packet(&mut self) -> Option<(RtmpMessage, u32, u32)> {
        let mut buf = vec![0u8; 16 * 1024];
        loop {
            if let Some(packet) = self.reader.read_packet().unwrap() {
                let message = RtmpMessage::decode(&packet).unwrap();
                return Some((
                    message,
                    packet.header.timestamp,
                    packet.header.message_stream_id,
                ));
            }
            let n = self.io.read(&mut buf).await.ok()?;
            if n == 0 {
                return None;
            }
            self.reader.feed(&buf[..n]);
        }
    }

    pub async fn recv(&mut self) -> RtmpMessage {
        self.recv_packet().await.expect("client hung up").0
    }

    pub async fn recv_command(&mut self) -> RtmpCommand {
        loop {
            if let RtmpMessage::Command { command, .. } = self.recv().await {
                return command;
            }
        }
    }

    /// Skip messages until the command named `name` arrives
    pub async fn expect_command(&mut self, name: &str) -> RtmpCommand {
        loop {
            let command = self.recv_command().await;
            if command.name == name {
                return command;
            }
        }
    }

    pub async fn send_status(&mut self, stream_id: u32, level: &str, code: &str) {
        let status = RtmpStatus::new(level, code, code);
        self.send(RtmpCommand::on_status(&status).into(), stream_id)
            .await;
    }

    /// Handshake, then accept `connect` the way common servers do
    pub async fn accept_connect(&mut self) -> RtmpCommand {
        self.handshake().await;
        let connect = self.expect_command("connect").await;

        self.send(RtmpMessage::WindowAcknowledgementSize(2_500_000), 0)
            .await;
        self.send(RtmpMessage::SetChunkSize(4096), 0).await;
        self.writer.set_chunk_size(4096);

        let properties = rtmp::AmfObject::new()
            .with("fmsVer", "FMS/3,0,1,123")
            .with("capabilities", 31.0);
        let info = RtmpStatus::new("status", codes::CONNECT_SUCCESS, "Connection succeeded.");
        let reply = RtmpCommand::result(
            connect.transaction_id,
            properties.into(),
            info.to_object().into(),
        );
        self.send(reply.into(), 0).await;
        connect
    }

    /// Handshake, then refuse `connect` with `description`
    pub async fn reject_connect(&mut self, description: &str) -> RtmpCommand {
        self.handshake().await;
        let connect = self.expect_command("connect").await;
        let info = RtmpStatus::new("error", codes::CONNECT_REJECTED, description);
        let reply = RtmpCommand::error(connect.transaction_id, info.to_object().into());
        self.send(reply.into(), 0).await;
        connect
    }

    /// Answer the next `createStream` with `stream_id`
    pub async fn accept_create_stream(&mut self, stream_id: u32) {
        let command = self.expect_command("createStream").await;
        let reply = RtmpCommand::result(
            command.transaction_id,
            Amf0Value::Null,
            Amf0Value::Number(stream_id as f64),
        );
        self.send(reply.into(), 0).await;
    }
}
