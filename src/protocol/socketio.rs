//! Socket.IO (protocol 5) over Engine.IO (protocol 4), WebSocket transport.
//!
//! Over a WebSocket every text frame carries exactly one Engine.IO packet,
//! and game traffic rides in Socket.IO packets inside Engine.IO messages:
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000,..}   engine open      -> reply "40"
//! 2                                       engine ping      -> reply "3"
//! 40{"sid":"k3Jd"}                        namespace joined -> Connected("k3Jd")
//! 42["matched",{"room":"r1",..}]          event            -> Inbound
//! 41                                      namespace left   -> closed
//! 44{"message":".."}                      join refused     -> closed
//! 1                                       engine close     -> closed
//! ```
//!
//! The `sid` in the namespace acknowledgement is the socket id the server
//! stamps on relayed messages, so it doubles as our connection identity.

use serde::Deserialize;
use tracing::{debug, instrument};

use super::{
    ChannelEvent, Incoming, OutboundEvent, decode_inbound, encode_outbound, protocol_error,
};
use crate::error::{ChannelError, ChannelErrorKind};
use crate::session::ConnectionId;

const ENGINE_IO_PATH: &str = "socket.io/?EIO=4&transport=websocket";

/// Joins the default namespace.
const NAMESPACE_CONNECT: &str = "40";

#[derive(Deserialize)]
struct NamespaceAck {
    sid: ConnectionId,
}

#[derive(Deserialize)]
struct ConnectRefused {
    message: String,
}

/// Builds the Engine.IO WebSocket URL for a Socket.IO server.
///
/// `http`/`https` become `ws`/`wss`; a URL that already names the
/// `/socket.io/` path is taken as is.
pub fn socketio_endpoint(server_url: &str) -> String {
    let url = server_url.trim();
    let url = if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        url.to_string()
    };

    if url.contains("/socket.io/") {
        return url;
    }
    format!("{}/{}", url.trim_end_matches('/'), ENGINE_IO_PATH)
}

/// Serializes an outbound event as a Socket.IO event packet.
#[instrument(skip(event), fields(event = event.name()))]
pub fn encode_socketio(event: &OutboundEvent) -> Result<String, ChannelError> {
    Ok(format!("42{}", encode_outbound(event)?))
}

/// Parses one Engine.IO packet from the server.
///
/// # Errors
///
/// Returns a [`ChannelErrorKind::Protocol`] error for unknown packet types,
/// binary packets, and events [`decode_inbound`] rejects.
#[instrument(skip(frame))]
pub fn decode_socketio(frame: &str) -> Result<Incoming, ChannelError> {
    let Some((kind, rest)) = split_type(frame) else {
        return Err(malformed("empty engine packet"));
    };

    match kind {
        '0' => {
            debug!("Engine.IO open; joining default namespace");
            Ok(Incoming::Reply(NAMESPACE_CONNECT.to_string()))
        }
        '1' => Ok(Incoming::Closed("engine closed by server".to_string())),
        '2' => Ok(Incoming::Reply(format!("3{}", rest))),
        '3' | '6' => Ok(Incoming::Ignore),
        '4' => decode_packet(rest),
        other => Err(malformed(format!("unknown engine packet type '{}'", other))),
    }
}

fn decode_packet(packet: &str) -> Result<Incoming, ChannelError> {
    let Some((kind, rest)) = split_type(packet) else {
        return Err(malformed("empty socket.io packet"));
    };
    let body = strip_namespace(rest);

    match kind {
        '0' => {
            let NamespaceAck { sid } = serde_json::from_str(body).map_err(protocol_error)?;
            Ok(Incoming::Deliver(ChannelEvent::Connected(sid)))
        }
        '1' => Ok(Incoming::Closed("disconnected by server".to_string())),
        '2' => {
            // Skip an acknowledgement id; the game never asks for acks.
            let args = body.trim_start_matches(|c: char| c.is_ascii_digit());
            decode_inbound(args).map(Incoming::Deliver)
        }
        '3' => Ok(Incoming::Ignore),
        '4' => {
            let reason = serde_json::from_str::<ConnectRefused>(body)
                .map(|refused| refused.message)
                .unwrap_or_else(|_| body.to_string());
            Ok(Incoming::Closed(format!("connection refused: {}", reason)))
        }
        other => Err(malformed(format!(
            "unsupported socket.io packet type '{}'",
            other
        ))),
    }
}

fn split_type(packet: &str) -> Option<(char, &str)> {
    let mut chars = packet.chars();
    let kind = chars.next()?;
    Some((kind, chars.as_str()))
}

/// Drops a `/namespace,` prefix.
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        body.split_once(',').map(|(_, rest)| rest).unwrap_or("")
    } else {
        body
    }
}

#[track_caller]
fn malformed(message: impl Into<String>) -> ChannelError {
    ChannelError::new(ChannelErrorKind::Protocol(message.into()))
}
