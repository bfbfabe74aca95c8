//! Guess resolution and streak scoring.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::session::PartnerType;

/// What the user believes the partner was.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Guess {
    /// "It was a bot."
    #[strum(to_string = "AI", serialize = "agent", serialize = "bot")]
    #[serde(rename = "AI")]
    Agent,
    /// "It was a person."
    #[strum(to_string = "Human", serialize = "person")]
    Human,
}

/// Result of a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum GuessOutcome {
    /// The guess matched the partner.
    #[strum(to_string = "Correct! You got it right.")]
    Correct,
    /// The guess did not match, or the partner was never identified.
    #[strum(to_string = "Wrong! Better luck next time.")]
    Incorrect,
}

/// Resolves a guess against the ground truth.
///
/// A [`PartnerType::Unknown`] partner can never be guessed correctly.
#[instrument]
pub fn resolve(guess: Guess, partner: PartnerType) -> GuessOutcome {
    let outcome = match (guess, partner) {
        (Guess::Agent, PartnerType::Agent) | (Guess::Human, PartnerType::Human) => {
            GuessOutcome::Correct
        }
        _ => GuessOutcome::Incorrect,
    };
    debug!(?outcome, "Resolved guess");
    outcome
}

/// Count of consecutive correct guesses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u32);

impl Score {
    /// Current value.
    pub fn value(self) -> u32 {
        self.0
    }

    /// Bumps on a correct guess, wipes on a wrong one.
    pub fn apply(&mut self, outcome: GuessOutcome) {
        self.0 = match outcome {
            GuessOutcome::Correct => self.0.saturating_add(1),
            GuessOutcome::Incorrect => 0,
        };
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
