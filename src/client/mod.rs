mod auth;
mod client;
mod config;
mod media;

pub use auth::adobe_response;
pub use client::{ConnectResponse, PlayResponse, PublishResponse, RtmpClient};
pub use config::{ClientConfig, ClientConfigBuilder, ReconnectPolicy};
pub use media::{MediaSample, MediaSource};

use std::time::Duration;

use log::debug;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::protocol::DEFAULT_PORT;
use crate::{Error, Result};

/// Open the TCP transport for an `rtmp://` URL
pub(crate) async fn open_transport(url: &Url, connect_timeout: Duration) -> Result<TcpStream> {
    let host = url.host_str().ok_or_else(|| Error::config("Missing host"))?;
    let port = url.port().unwrap_or(DEFAULT_PORT);

    let addr = format!("{}:{}", host, port);
    debug!("Connecting to {}", addr);

    match timeout(connect_timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => {
            stream.set_nodelay(true)?;
            Ok(stream)
        }
        Ok(Err(e)) => Err(Error::Io(e)),
        Err(_) => Err(Error::timeout(format!("Connecting to {} timed out", addr))),
    }
}
