//! Session controller: the state machine driving one chat session.
//!
//! The controller owns the [`Session`] and the channel it talks through.
//! User intents and channel events are its only entry points; both are
//! synchronous and infallible, so a caller serializes them onto one task and
//! never has to handle an error from the state machine itself.

use tracing::{debug, info, instrument, warn};

use crate::channel::ChannelAdapter;
use crate::config::{ClientConfig, DisconnectPolicy};
use crate::protocol::{ChannelEvent, InboundEvent, OutboundEvent};
use crate::scoring::{self, Guess, GuessOutcome};
use crate::session::{ConnectionId, Message, PartnerType, Phase, RoomId, Sender, Session};
use crate::snapshot::SessionSnapshot;

/// Drives a [`Session`] from user intents and channel events.
///
/// Construct with [`SessionController::start`] and release with
/// [`SessionController::dispose`], which consumes the controller so no event
/// can reach it afterwards.
#[derive(Debug)]
pub struct SessionController<A: ChannelAdapter> {
    session: Session,
    channel: A,
    own_id: Option<ConnectionId>,
    connected: bool,
    interrupted: bool,
    draft: String,
    disconnect_policy: DisconnectPolicy,
    mask_partner_type: bool,
}

impl<A: ChannelAdapter> SessionController<A> {
    /// Takes ownership of `channel` and begins listening to it.
    #[instrument(skip(channel, config), fields(policy = %config.disconnect_policy()))]
    pub fn start(channel: A, config: &ClientConfig) -> Self {
        info!("Starting session controller");
        Self {
            session: Session::new(),
            channel,
            own_id: None,
            connected: false,
            interrupted: false,
            draft: String::new(),
            disconnect_policy: *config.disconnect_policy(),
            mask_partner_type: *config.mask_partner_type(),
        }
    }

    /// Stops listening and releases the channel.
    ///
    /// Returns the final session state.
    #[instrument(skip(self), fields(phase = %self.session.phase(), score = %self.session.score()))]
    pub async fn dispose(mut self) -> Session {
        info!("Disposing session controller");
        self.channel.close().await;
        self.session
    }

    /// The authoritative session, partner type included.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Our identity on the channel, once reported.
    pub fn own_id(&self) -> Option<&ConnectionId> {
        self.own_id.as_ref()
    }

    /// Whether the channel currently reports a live connection.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The text being composed.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Waits for the next channel event, or `None` once delivery has stopped.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.channel.recv().await
    }

    /// Copies the state for rendering, masking the partner as configured.
    pub fn snapshot(&self) -> SessionSnapshot {
        let masked = self.mask_partner_type && self.session.guess_outcome().is_none();
        let partner_type = if masked {
            PartnerType::Unknown
        } else {
            *self.session.partner_type()
        };

        SessionSnapshot {
            phase: *self.session.phase(),
            room_id: self.session.room_id().clone(),
            partner_type,
            messages: self.session.messages().clone(),
            seconds_remaining: *self.session.seconds_remaining(),
            score: self.session.score().value(),
            guess_outcome: *self.session.guess_outcome(),
            draft: self.draft.clone(),
            connected: self.connected,
            own_id: self.own_id.clone(),
        }
    }

    // ── Intents ─────────────────────────────────────────────────────

    /// Enters matchmaking from Idle.
    ///
    /// Returns `false` (and does nothing) in any other phase.
    #[instrument(skip(self), fields(phase = %self.session.phase()))]
    pub fn start_chat(&mut self) -> bool {
        if *self.session.phase() != Phase::Idle {
            debug!("Ignoring start outside Idle");
            return false;
        }
        self.session.begin_search();
        self.interrupted = false;
        self.emit(OutboundEvent::StartChat);
        info!("Searching for a partner");
        true
    }

    /// Replaces the text being composed.
    #[instrument(skip(self, text))]
    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Sends the draft to the partner.
    ///
    /// Accepted only with a room and a draft that is not blank; the draft is
    /// cleared on acceptance and left alone otherwise. The line itself shows
    /// up when the server relays it back.
    #[instrument(skip(self), fields(phase = %self.session.phase()))]
    pub fn send_message(&mut self) -> bool {
        if *self.session.phase() != Phase::Active {
            debug!("Ignoring send outside Active");
            return false;
        }
        let Some(room) = self.session.room_id().clone() else {
            debug!("Ignoring send without a room");
            return false;
        };
        if self.draft.trim().is_empty() {
            debug!("Ignoring blank message");
            return false;
        }

        let text = std::mem::take(&mut self.draft);
        debug!(room = %room, len = text.len(), "Sending message");
        self.emit(OutboundEvent::Message { room, text });
        true
    }

    /// Composes and sends `text` in one step.
    pub fn send_text(&mut self, text: impl Into<String>) -> bool {
        self.update_draft(text);
        self.send_message()
    }

    /// Resolves the round.
    ///
    /// Accepted once per round, and only after the round has ended.
    #[instrument(skip(self), fields(phase = %self.session.phase()))]
    pub fn guess(&mut self, guess: Guess) -> Option<GuessOutcome> {
        if *self.session.phase() != Phase::Ended {
            debug!("Ignoring guess before the round ended");
            return None;
        }
        if self.session.guess_outcome().is_some() {
            debug!("Ignoring repeated guess");
            return None;
        }

        let outcome = scoring::resolve(guess, *self.session.partner_type());
        self.session.record_guess(outcome);
        info!(?outcome, score = %self.session.score(), "Guess resolved");
        Some(outcome)
    }

    /// Starts a new round.
    ///
    /// Accepted from Ended, and from Searching or Active while a disconnect
    /// has the round frozen. A reconnect unfreezes it.
    #[instrument(skip(self), fields(phase = %self.session.phase()))]
    pub fn restart(&mut self) -> bool {
        let phase = *self.session.phase();
        let frozen = self.interrupted && matches!(phase, Phase::Searching | Phase::Active);
        if phase != Phase::Ended && !frozen {
            debug!("Ignoring restart");
            return false;
        }

        if frozen {
            self.session.hard_reset();
        }
        self.session.begin_search();
        self.interrupted = false;
        self.draft.clear();
        self.emit(OutboundEvent::StartChat);
        info!("Restarted; searching for a partner");
        true
    }

    // ── Channel events ──────────────────────────────────────────────

    /// Applies one channel event.
    #[instrument(skip(self), fields(phase = %self.session.phase()))]
    pub fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected(id) => {
                info!(id = %id, "Channel connected");
                self.own_id = Some(id);
                self.connected = true;
                self.interrupted = false;
            }
            ChannelEvent::Inbound(event) => self.handle_inbound(event),
            ChannelEvent::Disconnected { reason } => self.handle_disconnect(reason),
        }
    }

    fn handle_inbound(&mut self, event: InboundEvent) {
        let phase = *self.session.phase();
        match event {
            InboundEvent::Matched { room, partner_type } => {
                if phase != Phase::Searching {
                    debug!(room = %room, "Ignoring match outside Searching");
                    return;
                }
                self.enter_match(room, partner_type);
            }
            InboundEvent::MessageReceived { user, text } => {
                if phase != Phase::Active {
                    debug!("Ignoring message outside Active");
                    return;
                }
                let sender = Sender::classify(&user, self.own_id.as_ref());
                self.session.push_message(Message::new(sender, text));
            }
            InboundEvent::TimerTick { seconds_remaining } => {
                // The server clock is authoritative in every phase, including
                // the final tick that can trail gameOver.
                self.session.set_seconds_remaining(seconds_remaining);
            }
            InboundEvent::GameOver => {
                if phase != Phase::Active {
                    debug!("Ignoring game over outside Active");
                    return;
                }
                self.session.end_round();
                info!(room = ?self.session.room_id(), "Round over");
            }
        }
    }

    fn enter_match(&mut self, room: RoomId, partner_type: PartnerType) {
        info!(room = %room, "Matched with a partner");
        self.session.enter_match(room, partner_type);
        self.interrupted = false;
    }

    fn handle_disconnect(&mut self, reason: Option<String>) {
        warn!(reason = ?reason, policy = %self.disconnect_policy, "Channel disconnected");
        self.connected = false;
        match self.disconnect_policy {
            DisconnectPolicy::Freeze => {
                if matches!(*self.session.phase(), Phase::Searching | Phase::Active) {
                    self.interrupted = true;
                }
            }
            DisconnectPolicy::Reset => {
                self.session.hard_reset();
                self.interrupted = false;
                self.draft.clear();
            }
        }
    }

    fn emit(&self, event: OutboundEvent) {
        let name = event.name();
        if let Err(e) = self.channel.send(event) {
            warn!(event = name, error = %e, "Outbound event dropped");
        }
    }
}
