//! Client configuration.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::ConfigError;

/// Environment variable that overrides [`ClientConfig::server_url`].
pub const SERVER_URL_ENV: &str = "TURING_CHAT_SERVER_URL";

/// What the session does when the channel drops mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectPolicy {
    /// Keep every field as is and wait for the channel to come back.
    #[default]
    Freeze,
    /// Return to Idle, keeping only the score.
    Reset,
}

/// Wire protocol used to reach the game server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
pub enum Transport {
    /// Socket.IO over its WebSocket transport, as the game server speaks.
    #[default]
    #[serde(rename = "socketio")]
    #[strum(to_string = "socketio")]
    SocketIo,
    /// Bare JSON-array frames on a plain WebSocket.
    #[serde(rename = "websocket")]
    #[strum(to_string = "websocket")]
    WebSocket,
}

/// Configuration for a chat client.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Game server address. A Socket.IO server is given by its `http(s)`
    /// origin; a plain WebSocket server by its full `ws(s)` URL.
    server_url: String,

    /// Wire protocol spoken to the server.
    transport: Transport,

    /// Reaction to a dropped connection.
    disconnect_policy: DisconnectPolicy,

    /// Withhold the partner type from snapshots until a guess is made.
    mask_partner_type: bool,

    /// Capacity of the inbound event queue.
    event_channel_capacity: usize,

    /// Grace period for closing the connection, in milliseconds.
    shutdown_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
            transport: Transport::default(),
            disconnect_policy: DisconnectPolicy::default(),
            mask_partner_type: true,
            event_channel_capacity: 256,
            shutdown_timeout_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(server_url = %config.server_url, transport = %config.transport, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if given (defaults otherwise), then applies
    /// [`SERVER_URL_ENV`] from the environment.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        match std::env::var(SERVER_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                debug!(server_url = %url, "Server URL overridden from environment");
                self.with_server_url(url)
            }
            _ => self,
        }
    }

    /// Replaces the server URL.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Replaces the wire protocol.
    #[must_use]
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Replaces the disconnect policy.
    #[must_use]
    pub fn with_disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.disconnect_policy = policy;
        self
    }

    /// Turns partner masking on or off.
    #[must_use]
    pub fn with_mask_partner_type(mut self, mask: bool) -> Self {
        self.mask_partner_type = mask;
        self
    }

    /// Replaces the inbound queue capacity.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Replaces the close grace period.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Inbound queue capacity, never below one.
    pub fn event_capacity(&self) -> usize {
        self.event_channel_capacity.max(1)
    }

    /// Grace period for closing the connection.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self)
            .map_err(|e| ConfigError::new(format!("Failed to serialize config: {}", e)))
    }
}
