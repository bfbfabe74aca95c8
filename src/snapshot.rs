//! Read-only view of a session for presentation layers.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

use crate::scoring::GuessOutcome;
use crate::session::{ConnectionId, Message, PartnerType, Phase, RoomId};

/// Owned copy of everything a front-end needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Default, Getters, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current stage.
    pub(crate) phase: Phase,
    /// Room held while Active or Ended.
    pub(crate) room_id: Option<RoomId>,
    /// Partner type, `Unknown` while masked.
    pub(crate) partner_type: PartnerType,
    /// Chat lines of the current round.
    pub(crate) messages: Vec<Message>,
    /// Last countdown value pushed by the server.
    pub(crate) seconds_remaining: Option<u32>,
    /// Streak of correct guesses.
    pub(crate) score: u32,
    /// Result of this round's guess.
    pub(crate) guess_outcome: Option<GuessOutcome>,
    /// Text being composed.
    pub(crate) draft: String,
    /// Whether the channel reports a live connection.
    pub(crate) connected: bool,
    /// Our identity on the channel.
    pub(crate) own_id: Option<ConnectionId>,
}

impl SessionSnapshot {
    /// Whether the guess buttons should be offered.
    pub fn awaiting_guess(&self) -> bool {
        self.phase == Phase::Ended && self.guess_outcome.is_none()
    }
}
