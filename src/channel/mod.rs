//! Transport boundary between the session and the game server.

mod memory;
mod socketio;
mod transport;
mod websocket;

pub use memory::{MemoryChannel, MemoryServer};
pub use socketio::SocketIoChannel;
pub use websocket::WebSocketChannel;

use crate::error::ChannelError;
use crate::protocol::{ChannelEvent, OutboundEvent};

/// A bidirectional, ordered, real-time event channel.
///
/// Implementations deliver inbound events exactly once and in arrival order.
/// Once [`ChannelAdapter::close`] returns, [`ChannelAdapter::recv`] yields
/// `None` and no further events are delivered.
#[async_trait::async_trait]
pub trait ChannelAdapter: Send {
    /// Queues an event for the server without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the channel has stopped.
    fn send(&self, event: OutboundEvent) -> Result<(), ChannelError>;

    /// Waits for the next inbound event.
    async fn recv(&mut self) -> Option<ChannelEvent>;

    /// Stops delivery and releases the connection.
    async fn close(&mut self);
}
