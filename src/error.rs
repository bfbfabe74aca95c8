//! Error types for the channel and configuration layers.

use derive_more::{Display, Error};
use tracing::instrument;

/// Category of channel failure.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ChannelErrorKind {
    /// The transport task has stopped; nothing more can be sent.
    #[display("channel is not connected")]
    NotConnected,
    /// The connection could not be established.
    #[display("connect failed: {_0}")]
    Connect(String),
    /// A frame could not be encoded or decoded.
    #[display("protocol error: {_0}")]
    Protocol(String),
}

/// Channel error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Channel error: {} at {}:{}", kind, file, line)]
pub struct ChannelError {
    /// What went wrong.
    pub kind: ChannelErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ChannelError {
    /// Creates a new channel error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: ChannelErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for a [`ChannelErrorKind::NotConnected`] error.
    #[track_caller]
    pub fn not_connected() -> Self {
        Self::new(ChannelErrorKind::NotConnected)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ChannelError {
    #[track_caller]
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::new(ChannelErrorKind::Connect(err.to_string()))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
