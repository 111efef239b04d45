use std::time::Duration;

use crate::protocol::{DEFAULT_FLASH_VER, DEFAULT_WINDOW_SIZE};
use crate::{Error, Result};

/// Exponential backoff for the caller's reconnect loop.
///
/// The client never reconnects on its own; it only reports how long to wait.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            max_attempts: Some(5),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before attempt `retry` (1-based), or `None` once attempts are used up
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        if retry == 0 {
            return Some(Duration::ZERO);
        }
        if self.max_attempts.is_some_and(|max| retry > max) {
            return None;
        }
        let factor = self.multiplier.max(1.0).powi(retry as i32 - 1);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Some(Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64())))
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP connect plus handshake
    pub connect_timeout: Duration,

    /// How long a command waits for its reply
    pub request_timeout: Duration,

    /// Outgoing chunk size announced after connect
    pub chunk_size: u32,

    /// Window acknowledgement size used until the server sends its own
    pub window_ack_size: u32,

    pub flash_ver: String,

    /// Sent as null when unset
    pub swf_url: Option<String>,

    /// Sent as null when unset
    pub page_url: Option<String>,

    /// Buffer length requested when playing, in milliseconds
    pub buffer_time: u32,

    /// Send `releaseStream`/`FCPublish` before publishing
    pub fc_publish: bool,

    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            chunk_size: 8192,
            window_ack_size: DEFAULT_WINDOW_SIZE,
            flash_ver: DEFAULT_FLASH_VER.to_string(),
            swf_url: None,
            page_url: None,
            buffer_time: 3000,
            fc_publish: true,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < 128 {
            return Err(Error::config("Chunk size must be at least 128"));
        }

        if self.chunk_size > 65536 {
            return Err(Error::config("Chunk size must not exceed 65536"));
        }

        if self.connect_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(Error::config("Timeouts must be non-zero"));
        }

        if self.reconnect.multiplier < 1.0 {
            return Err(Error::config("Reconnect multiplier must be at least 1"));
        }

        Ok(())
    }
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        ClientConfigBuilder {
            config: ClientConfig::default(),
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn chunk_size(mut self, size: u32) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn window_ack_size(mut self, size: u32) -> Self {
        self.config.window_ack_size = size;
        self
    }

    pub fn flash_ver(mut self, flash_ver: impl Into<String>) -> Self {
        self.config.flash_ver = flash_ver.into();
        self
    }

    pub fn swf_url(mut self, url: impl Into<String>) -> Self {
        self.config.swf_url = Some(url.into());
        self
    }

    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.config.page_url = Some(url.into());
        self
    }

    /// Set buffer time
    pub fn buffer_time(mut self, ms: u32) -> Self {
        self.config.buffer_time = ms;
        self
    }

    pub fn fc_publish(mut self, enabled: bool) -> Self {
        self.config.fc_publish = enabled;
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.config.reconnect = policy;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
