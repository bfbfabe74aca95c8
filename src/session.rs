//! Session state for one browsing session of the guessing game.
//!
//! [`Session`] is the data half of the state machine. Its mutators are
//! crate-private so that only the controller can drive transitions, and each
//! one keeps the room/phase invariant intact.

use derive_getters::Getters;
use derive_more::{Display, From};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::scoring::{GuessOutcome, Score};

/// Opaque room identifier assigned by the matchmaking server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The client's own identity on the channel, or a message originator's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Discrete stage of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Waiting for the server to pair us.
    Searching,
    /// Chatting with a partner; the clock is running.
    Active,
    /// Round over; waiting for a guess or a restart.
    Ended,
}

impl Phase {
    /// Whether a room is held in this phase.
    pub fn holds_room(self) -> bool {
        matches!(self, Phase::Active | Phase::Ended)
    }
}

/// Ground-truth nature of the matched partner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum PartnerType {
    /// Not matched yet, or withheld from the viewer.
    #[default]
    Unknown,
    /// A real person.
    Human,
    /// An automated agent.
    #[serde(rename = "ai", alias = "agent")]
    Agent,
}

/// Who wrote a message, from this client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Written by this client.
    #[strum(to_string = "You")]
    Me,
    /// Written by the partner.
    #[strum(to_string = "Guest")]
    Partner,
}

impl Sender {
    /// Classifies a message originator against our own identity.
    ///
    /// Before the channel has reported our identity every message is the
    /// partner's.
    pub fn classify(originator: &ConnectionId, own: Option<&ConnectionId>) -> Self {
        match own {
            Some(own) if own == originator => Sender::Me,
            _ => Sender::Partner,
        }
    }
}

/// A chat line.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct Message {
    /// Author of the line.
    sender: Sender,
    /// Text as received.
    text: String,
}

/// Authoritative session state.
#[derive(Debug, Clone, Default, Getters)]
pub struct Session {
    /// Current stage.
    phase: Phase,
    /// Room held while Active or Ended.
    room_id: Option<RoomId>,
    /// Ground truth for the current round.
    partner_type: PartnerType,
    /// Chat lines of the current round, in arrival order.
    messages: Vec<Message>,
    /// Last countdown value pushed by the server.
    seconds_remaining: Option<u32>,
    /// Streak of correct guesses.
    score: Score,
    /// Result of this round's guess.
    guess_outcome: Option<GuessOutcome>,
}

impl Session {
    /// Creates an idle session with a zero score.
    #[instrument]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle → Searching, or Ended → Searching with the round wiped.
    pub(crate) fn begin_search(&mut self) {
        if self.phase == Phase::Ended {
            self.clear_round();
        }
        self.phase = Phase::Searching;
    }

    /// Searching → Active.
    pub(crate) fn enter_match(&mut self, room: RoomId, partner: PartnerType) {
        self.room_id = Some(room);
        self.partner_type = partner;
        self.messages.clear();
        self.phase = Phase::Active;
    }

    /// Active → Ended.
    pub(crate) fn end_round(&mut self) {
        self.phase = Phase::Ended;
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn set_seconds_remaining(&mut self, seconds: u32) {
        self.seconds_remaining = Some(seconds);
    }

    /// Stores the outcome and applies it to the score.
    pub(crate) fn record_guess(&mut self, outcome: GuessOutcome) {
        self.score.apply(outcome);
        self.guess_outcome = Some(outcome);
    }

    /// Back to Idle with everything but the score cleared.
    pub(crate) fn hard_reset(&mut self) {
        self.clear_round();
        self.seconds_remaining = None;
        self.phase = Phase::Idle;
    }

    fn clear_round(&mut self) {
        debug!(room = ?self.room_id, "Clearing round state");
        self.room_id = None;
        self.partner_type = PartnerType::Unknown;
        self.guess_outcome = None;
        self.messages.clear();
    }
}
