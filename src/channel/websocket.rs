//! Plain WebSocket transport.
//!
//! Every text frame is a bare `["name", payload]` array, and the server
//! announces our identity with a `["connect", {"id": ...}]` frame. Useful for
//! lightweight servers and for tests; the original game server speaks
//! Socket.IO instead (see [`SocketIoChannel`](super::SocketIoChannel)).

use std::time::Duration;

use futures_util::{Sink, Stream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::instrument;

use super::ChannelAdapter;
use super::transport::{Framing, TransportTask};
use crate::config::ClientConfig;
use crate::error::ChannelError;
use crate::protocol::{ChannelEvent, OutboundEvent};

/// Client channel over a WebSocket connection.
pub struct WebSocketChannel {
    transport: TransportTask,
}

impl WebSocketChannel {
    /// Connects to `config.endpoint()` and starts the transport task.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the WebSocket handshake fails.
    #[instrument(skip(config), fields(url = %config.server_url()))]
    pub async fn connect(config: &ClientConfig) -> Result<Self, ChannelError> {
        let transport = TransportTask::connect(
            config.server_url(),
            Framing::JsonArray,
            config.event_capacity(),
            config.shutdown_timeout(),
        )
        .await?;
        Ok(Self { transport })
    }

    /// Starts the transport task over an already established stream.
    pub fn spawn<S>(stream: S, event_capacity: usize, shutdown_timeout: Duration) -> Self
    where
        S: Stream<Item = Result<Message, WsError>>
            + Sink<Message, Error = WsError>
            + Unpin
            + Send
            + 'static,
    {
        Self {
            transport: TransportTask::spawn(
                stream,
                Framing::JsonArray,
                event_capacity,
                shutdown_timeout,
            ),
        }
    }

    /// Whether the transport task still believes the socket is open.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}

#[async_trait::async_trait]
impl ChannelAdapter for WebSocketChannel {
    fn send(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        self.transport.send(event)
    }

    async fn recv(&mut self) -> Option<ChannelEvent> {
        self.transport.recv().await
    }

    async fn close(&mut self) {
        self.transport.close().await;
    }
}

impl std::fmt::Debug for WebSocketChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketChannel")
            .field("connected", &self.is_connected())
            .field("has_task", &self.transport.has_task())
            .finish()
    }
}
