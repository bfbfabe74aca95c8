//! Channel event contract and its JSON wire codec.
//!
//! Every frame on the wire is a JSON array whose first element is the event
//! name and whose optional second element is the payload:
//!
//! ```text
//! ["connect", {"id": "k3Jd"}]
//! ["matched", {"room": "r1", "partnerType": "ai"}]
//! ["message", {"user": "k3Jd", "text": "hi"}]
//! ["timer", 45]
//! ["gameOver"]
//! ["startChat"]
//! ["message", {"room": "r1", "text": "hello"}]
//! ```
//!
//! The Socket.IO framing in `socketio` wraps the same arrays in Socket.IO
//! event packets.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::error::{ChannelError, ChannelErrorKind};
use crate::session::{ConnectionId, PartnerType, RoomId};

mod socketio;

pub use socketio::{decode_socketio, encode_socketio, socketio_endpoint};

/// Game events pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The matchmaking service paired us.
    Matched {
        /// Room shared with the partner.
        room: RoomId,
        /// Ground truth for the round.
        partner_type: PartnerType,
    },
    /// A chat line relayed by the server, ours or the partner's.
    MessageReceived {
        /// Connection that wrote the line.
        user: ConnectionId,
        /// Line text.
        text: String,
    },
    /// Countdown mirrored from the server clock.
    TimerTick {
        /// Seconds left in the round.
        seconds_remaining: u32,
    },
    /// The chat window closed.
    GameOver,
}

/// Everything a channel can deliver to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The connection is up and the server told us who we are.
    Connected(ConnectionId),
    /// A game event.
    Inbound(InboundEvent),
    /// The connection dropped or was closed.
    Disconnected {
        /// Human-readable cause, when known.
        reason: Option<String>,
    },
}

impl From<InboundEvent> for ChannelEvent {
    fn from(event: InboundEvent) -> Self {
        ChannelEvent::Inbound(event)
    }
}

/// What a decoded frame asks the transport to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// Hand an event to the session.
    Deliver(ChannelEvent),
    /// Write this frame straight back to the server.
    Reply(String),
    /// The server ended the session.
    Closed(String),
    /// Keep-alive or other housekeeping with nothing to do.
    Ignore,
}

/// Requests sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Enter matchmaking.
    StartChat,
    /// Relay a chat line to the room.
    Message {
        /// Target room.
        room: RoomId,
        /// Line text, as composed.
        text: String,
    },
}

impl OutboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::StartChat => "startChat",
            OutboundEvent::Message { .. } => "message",
        }
    }
}

#[derive(Deserialize)]
struct ConnectPayload {
    id: ConnectionId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedPayload {
    room: RoomId,
    partner_type: PartnerType,
}

#[derive(Deserialize)]
struct MessagePayload {
    user: ConnectionId,
    text: String,
}

#[derive(Serialize)]
struct OutboundMessagePayload<'a> {
    room: &'a RoomId,
    text: &'a str,
}

/// Serializes an outbound event into a text frame.
#[instrument(skip(event), fields(event = event.name()))]
pub fn encode_outbound(event: &OutboundEvent) -> Result<String, ChannelError> {
    let frame = match event {
        OutboundEvent::StartChat => serde_json::to_string(&(event.name(),)),
        OutboundEvent::Message { room, text } => serde_json::to_string(&(
            event.name(),
            OutboundMessagePayload { room, text },
        )),
    };
    frame.map_err(|e| ChannelError::new(ChannelErrorKind::Protocol(e.to_string())))
}

/// Parses a text frame from the server.
///
/// # Errors
///
/// Returns a [`ChannelErrorKind::Protocol`] error if the frame is not a
/// named event array, the name is unknown, or the payload does not match.
#[instrument(skip(frame))]
pub fn decode_inbound(frame: &str) -> Result<ChannelEvent, ChannelError> {
    let parts: Vec<Value> = serde_json::from_str(frame).map_err(protocol_error)?;
    let mut parts = parts.into_iter();

    let name = match parts.next() {
        Some(Value::String(name)) => name,
        _ => {
            return Err(ChannelError::new(ChannelErrorKind::Protocol(
                "frame must start with an event name".to_string(),
            )));
        }
    };
    let payload = parts.next().unwrap_or(Value::Null);

    let event = match name.as_str() {
        "connect" => {
            let ConnectPayload { id } = serde_json::from_value(payload).map_err(protocol_error)?;
            ChannelEvent::Connected(id)
        }
        "matched" => {
            let MatchedPayload { room, partner_type } =
                serde_json::from_value(payload).map_err(protocol_error)?;
            InboundEvent::Matched { room, partner_type }.into()
        }
        "message" => {
            let MessagePayload { user, text } =
                serde_json::from_value(payload).map_err(protocol_error)?;
            InboundEvent::MessageReceived { user, text }.into()
        }
        "timer" => {
            let seconds_remaining: u32 =
                serde_json::from_value(payload).map_err(protocol_error)?;
            InboundEvent::TimerTick { seconds_remaining }.into()
        }
        "gameOver" => InboundEvent::GameOver.into(),
        other => {
            return Err(ChannelError::new(ChannelErrorKind::Protocol(format!(
                "unknown event '{}'",
                other
            ))));
        }
    };

    Ok(event)
}

/// [`decode_inbound`] for a transport that only ever delivers.
pub fn decode_frame(frame: &str) -> Result<Incoming, ChannelError> {
    decode_inbound(frame).map(Incoming::Deliver)
}

#[track_caller]
fn protocol_error(err: serde_json::Error) -> ChannelError {
    ChannelError::new(ChannelErrorKind::Protocol(err.to_string()))
}
