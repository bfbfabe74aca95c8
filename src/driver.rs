//! The single logical thread that serializes intents and channel events.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument};

use crate::channel::ChannelAdapter;
use crate::controller::SessionController;
use crate::scoring::Guess;
use crate::session::Session;
use crate::snapshot::SessionSnapshot;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Enter matchmaking.
    Start,
    /// Replace the text being composed.
    Type(String),
    /// Send the composed text.
    Send,
    /// Guess the partner's nature.
    Guess(Guess),
    /// Begin a new round.
    Restart,
    /// Leave the session.
    Quit,
}

/// Why [`run_session`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionExit {
    /// The user sent [`Intent::Quit`].
    Quit,
    /// The intent sender was dropped.
    IntentsClosed,
    /// The channel stopped delivering events.
    ChannelClosed,
}

/// Applies one intent to the controller.
///
/// Returns `false` when the intent asks to leave.
pub fn apply_intent<A: ChannelAdapter>(
    controller: &mut SessionController<A>,
    intent: Intent,
) -> bool {
    match intent {
        Intent::Start => {
            controller.start_chat();
        }
        Intent::Type(text) => controller.update_draft(text),
        Intent::Send => {
            controller.send_message();
        }
        Intent::Guess(guess) => {
            controller.guess(guess);
        }
        Intent::Restart => {
            controller.restart();
        }
        Intent::Quit => return false,
    }
    true
}

/// Runs the session until the user leaves or the channel stops.
///
/// A fresh snapshot is published after every intent and event. The
/// controller is disposed on every exit path, and the final session is
/// returned alongside the reason for exiting.
#[instrument(skip_all)]
pub async fn run_session<A: ChannelAdapter>(
    mut controller: SessionController<A>,
    mut intents: mpsc::Receiver<Intent>,
    snapshots: watch::Sender<SessionSnapshot>,
) -> (Session, SessionExit) {
    info!("Session driver started");
    snapshots.send_replace(controller.snapshot());

    let exit = loop {
        tokio::select! {
            intent = intents.recv() => match intent {
                Some(intent) => {
                    debug!(?intent, "Applying intent");
                    if !apply_intent(&mut controller, intent) {
                        break SessionExit::Quit;
                    }
                }
                None => break SessionExit::IntentsClosed,
            },
            event = controller.next_event() => match event {
                Some(event) => controller.handle_event(event),
                None => break SessionExit::ChannelClosed,
            },
        }
        publish(&snapshots, controller.snapshot());
    };

    info!(%exit, "Session driver stopping");
    let session = controller.dispose().await;
    (session, exit)
}

fn publish(snapshots: &watch::Sender<SessionSnapshot>, snapshot: SessionSnapshot) {
    snapshots.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });
}
