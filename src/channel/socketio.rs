//! Socket.IO transport, as spoken by the game server.

use tracing::instrument;

use super::ChannelAdapter;
use super::transport::{Framing, TransportTask};
use crate::config::ClientConfig;
use crate::error::ChannelError;
use crate::protocol::{ChannelEvent, OutboundEvent, socketio_endpoint};

/// Client channel to a Socket.IO server over its WebSocket transport.
///
/// The Engine.IO handshake and keep-alive pings are answered inside the
/// transport task; the session only ever sees `Connected` with the socket id,
/// the game events, and a final `Disconnected`.
pub struct SocketIoChannel {
    transport: TransportTask,
}

impl SocketIoChannel {
    /// Connects to the Socket.IO server at `config.server_url()`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the WebSocket handshake fails.
    #[instrument(skip(config), fields(url = %config.server_url()))]
    pub async fn connect(config: &ClientConfig) -> Result<Self, ChannelError> {
        let transport = TransportTask::connect(
            &socketio_endpoint(config.server_url()),
            Framing::SocketIo,
            config.event_capacity(),
            config.shutdown_timeout(),
        )
        .await?;
        Ok(Self { transport })
    }

    /// Whether the transport task still believes the socket is open.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}

#[async_trait::async_trait]
impl ChannelAdapter for SocketIoChannel {
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

impl std::fmt::Debug for SocketIoChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketIoChannel")
            .field("connected", &self.is_connected())
            .field("has_task", &self.transport.has_task())
            .finish()
    }
}
