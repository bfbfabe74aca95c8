//! In-process channel pair.

use tokio::sync::mpsc;
use tracing::{debug, instrument};

use super::ChannelAdapter;
use crate::error::ChannelError;
use crate::protocol::{ChannelEvent, InboundEvent, OutboundEvent};
use crate::session::{ConnectionId, PartnerType, RoomId};

/// Client half of an in-memory channel.
///
/// Created with [`MemoryChannel::pair`]; the other half is a
/// [`MemoryServer`] that plays the role of the remote game server.
#[derive(Debug)]
pub struct MemoryChannel {
    outbound_tx: mpsc::UnboundedSender<OutboundEvent>,
    inbound_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    closed: bool,
}

/// Server half of an in-memory channel.
#[derive(Debug)]
pub struct MemoryServer {
    inbound_tx: mpsc::UnboundedSender<ChannelEvent>,
    outbound_rx: mpsc::UnboundedReceiver<OutboundEvent>,
}

impl MemoryChannel {
    /// Creates a connected client/server pair.
    #[instrument]
    pub fn pair() -> (MemoryChannel, MemoryServer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        debug!("Created in-memory channel pair");
        (
            MemoryChannel {
                outbound_tx,
                inbound_rx,
                closed: false,
            },
            MemoryServer {
                inbound_tx,
                outbound_rx,
            },
        )
    }
}

#[async_trait::async_trait]
impl ChannelAdapter for MemoryChannel {
    fn send(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::not_connected());
        }
        self.outbound_tx
            .send(event)
            .map_err(|_| ChannelError::not_connected())
    }

    async fn recv(&mut self) -> Option<ChannelEvent> {
        self.inbound_rx.recv().await
    }

    async fn close(&mut self) {
        debug!("Closing in-memory channel");
        self.closed = true;
        self.inbound_rx.close();
        while self.inbound_rx.try_recv().is_ok() {}
    }
}

impl MemoryServer {
    /// Delivers an arbitrary event to the client.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] once the client has closed or been dropped.
    pub fn push(&self, event: impl Into<ChannelEvent>) -> Result<(), ChannelError> {
        self.inbound_tx
            .send(event.into())
            .map_err(|_| ChannelError::not_connected())
    }

    /// Reports the client's own identity.
    pub fn connect(&self, id: impl Into<ConnectionId>) -> Result<(), ChannelError> {
        self.push(ChannelEvent::Connected(id.into()))
    }

    /// Pairs the client into `room`.
    pub fn matched(
        &self,
        room: impl Into<RoomId>,
        partner_type: PartnerType,
    ) -> Result<(), ChannelError> {
        self.push(InboundEvent::Matched {
            room: room.into(),
            partner_type,
        })
    }

    /// Relays a chat line written by `user`.
    pub fn message(
        &self,
        user: impl Into<ConnectionId>,
        text: impl Into<String>,
    ) -> Result<(), ChannelError> {
        self.push(InboundEvent::MessageReceived {
            user: user.into(),
            text: text.into(),
        })
    }

    /// Mirrors the round clock.
    pub fn timer(&self, seconds_remaining: u32) -> Result<(), ChannelError> {
        self.push(InboundEvent::TimerTick { seconds_remaining })
    }

    /// Closes the chat window.
    pub fn game_over(&self) -> Result<(), ChannelError> {
        self.push(InboundEvent::GameOver)
    }

    /// Simulates a dropped connection.
    pub fn disconnect(&self, reason: Option<&str>) -> Result<(), ChannelError> {
        self.push(ChannelEvent::Disconnected {
            reason: reason.map(str::to_string),
        })
    }

    /// Takes the next event the client sent, if one is waiting.
    pub fn try_outbound(&mut self) -> Option<OutboundEvent> {
        self.outbound_rx.try_recv().ok()
    }

    /// Waits for the next event the client sends.
    pub async fn next_outbound(&mut self) -> Option<OutboundEvent> {
        self.outbound_rx.recv().await
    }

    /// Takes every event the client has sent so far.
    pub fn drain_outbound(&mut self) -> Vec<OutboundEvent> {
        std::iter::from_fn(|| self.try_outbound()).collect()
    }

    /// Whether the client has stopped listening.
    pub fn is_client_closed(&self) -> bool {
        self.inbound_tx.is_closed()
    }
}
