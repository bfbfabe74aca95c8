//! Turing Chat library - client session for a human-or-AI guessing game
//!
//! A user is paired with an anonymous partner (a person or an automated
//! agent), chats until the server closes the round, then guesses which one
//! it was. This crate holds the client-side state machine and the channel
//! plumbing around it.
//!
//! # Architecture
//!
//! - **Session**: phase, room, partner, messages, countdown and score
//! - **Controller**: applies user intents and channel events to the session
//! - **Channel**: ordered real-time transport (Socket.IO, WebSocket or in-memory)
//! - **Driver**: the single task that serializes intents and events
//!
//! # Example
//!
//! ```
//! use turing_chat::{ClientConfig, Guess, GuessOutcome, MemoryChannel, PartnerType, SessionController};
//!
//! let (channel, server) = MemoryChannel::pair();
//! let mut controller = SessionController::start(channel, &ClientConfig::default());
//!
//! controller.start_chat();
//!
//! // Normally the driver pulls these from the channel.
//! controller.handle_event(turing_chat::InboundEvent::Matched {
//!     room: "r1".into(),
//!     partner_type: PartnerType::Agent,
//! }.into());
//! controller.handle_event(turing_chat::InboundEvent::GameOver.into());
//!
//! assert_eq!(controller.guess(Guess::Agent), Some(GuessOutcome::Correct));
//! # drop(server);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod channel;
mod config;
mod controller;
mod driver;
mod error;
mod protocol;
mod scoring;
mod session;
mod snapshot;
mod terminal;

// Crate-level exports - Channel layer
pub use channel::{
    ChannelAdapter, MemoryChannel, MemoryServer, SocketIoChannel, WebSocketChannel,
};

// Crate-level exports - Configuration
pub use config::{ClientConfig, DisconnectPolicy, SERVER_URL_ENV, Transport};

// Crate-level exports - State machine
pub use controller::SessionController;
pub use driver::{Intent, SessionExit, apply_intent, run_session};

// Crate-level exports - Errors
pub use error::{ChannelError, ChannelErrorKind, ConfigError};

// Crate-level exports - Wire contract
pub use protocol::{
    ChannelEvent, InboundEvent, Incoming, OutboundEvent, decode_frame, decode_inbound,
    decode_socketio, encode_outbound, encode_socketio, socketio_endpoint,
};

// Crate-level exports - Session model
pub use scoring::{Guess, GuessOutcome, Score, resolve};
pub use session::{ConnectionId, Message, PartnerType, Phase, RoomId, Sender, Session};
pub use snapshot::SessionSnapshot;

// Crate-level exports - Terminal front-end
pub use terminal::{TranscriptPrinter, parse_line, run_terminal};
