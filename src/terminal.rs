//! Line-based terminal front-end.
//!
//! Reads commands from stdin, forwards them as intents, and prints whatever
//! changed in each published snapshot. Holds no game logic of its own.

use std::io::BufRead;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::channel::{ChannelAdapter, SocketIoChannel, WebSocketChannel};
use crate::config::{ClientConfig, Transport};
use crate::controller::SessionController;
use crate::driver::{Intent, SessionExit, run_session};
use crate::scoring::Guess;
use crate::session::{Phase, Session};
use crate::snapshot::SessionSnapshot;

const HELP: &str = "\
CAN YOU GUESS WHO IS HUMAN AND WHO IS AI?
Chat for 60 seconds and then guess if your partner is a real person or a cleverly disguised AI.

  /start     start chatting
  /ai        guess AI        /human   guess Human
  /restart   start a new chat
  /quit      leave
Anything else is sent to your partner.";

/// Turns one input line into intents.
pub fn parse_line(line: &str) -> Vec<Intent> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.strip_prefix('/') else {
        if line.trim().is_empty() {
            return Vec::new();
        }
        return vec![Intent::Type(line.to_string()), Intent::Send];
    };

    let mut words = command.split_whitespace();
    match words.next().map(str::to_ascii_lowercase).as_deref() {
        Some("start") => vec![Intent::Start],
        Some("restart") | Some("new") => vec![Intent::Restart],
        Some("quit") | Some("exit") => vec![Intent::Quit],
        Some("guess") => words
            .next()
            .and_then(|w| w.parse::<Guess>().ok())
            .map(Intent::Guess)
            .into_iter()
            .collect(),
        Some(other) => other.parse::<Guess>().map(Intent::Guess).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Prints the difference between consecutive snapshots.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    last: Option<SessionSnapshot>,
}

impl TranscriptPrinter {
    /// Lines to print for `next`, given what was already shown.
    pub fn render(&mut self, next: &SessionSnapshot) -> Vec<String> {
        let mut out = Vec::new();
        let previous = self.last.take().unwrap_or_default();

        if next.phase() != previous.phase() {
            match next.phase() {
                Phase::Idle => out.push(HELP.to_string()),
                Phase::Searching => out.push("Searching for a match...".to_string()),
                Phase::Active => {
                    out.push(format!("Matched! Score: {}", next.score()));
                }
                Phase::Ended => {
                    out.push(
                        "Time's up! Who do you think your chat partner was? (/ai or /human)"
                            .to_string(),
                    );
                }
            }
        }

        let new_round = next.phase() == &Phase::Active && previous.phase() != &Phase::Active;
        let already_shown = if next.room_id() == previous.room_id() && !new_round {
            previous.messages().len().min(next.messages().len())
        } else {
            0
        };
        for message in &next.messages()[already_shown..] {
            out.push(format!("{}: {}", message.sender(), message.text()));
        }

        if next.phase() == &Phase::Active
            && next.seconds_remaining() != previous.seconds_remaining()
            && let Some(seconds) = next.seconds_remaining()
            && (*seconds % 10 == 0 || *seconds <= 5)
        {
            out.push(format!("Time Left: {}s", seconds));
        }

        if next.guess_outcome() != previous.guess_outcome()
            && let Some(outcome) = next.guess_outcome()
        {
            out.push(format!("{} Score: {}", outcome, next.score()));
            out.push("/restart to start a new chat".to_string());
        }

        if *previous.connected() && !*next.connected() {
            out.push("Connection lost.".to_string());
        }

        self.last = Some(next.clone());
        out
    }
}

/// Connects to the server and runs the interactive session.
#[instrument(skip(config), fields(url = %config.server_url(), transport = %config.transport()))]
pub async fn run_terminal(config: ClientConfig) -> Result<()> {
    let (session, exit) = match config.transport() {
        Transport::SocketIo => {
            let channel = SocketIoChannel::connect(&config).await?;
            play_lines(SessionController::start(channel, &config), stdin_lines()).await?
        }
        Transport::WebSocket => {
            let channel = WebSocketChannel::connect(&config).await?;
            play_lines(SessionController::start(channel, &config), stdin_lines()).await?
        }
    };

    info!(%exit, score = %session.score(), "Session finished");
    println!("Final score: {}", session.score());
    Ok(())
}

/// Reads stdin on its own thread.
///
/// A blocking read cannot be cancelled, so it must not live on the runtime:
/// the process exits once the session ends even if a read is still pending.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

/// Drives the session from input lines until either side finishes.
async fn play_lines<A: ChannelAdapter + 'static>(
    controller: SessionController<A>,
    mut lines: mpsc::Receiver<String>,
) -> Result<(Session, SessionExit)> {
    let (intent_tx, intent_rx) = mpsc::channel(32);
    let (snapshot_tx, mut snapshot_rx) = watch::channel(SessionSnapshot::default());
    let mut driver = tokio::spawn(run_session(controller, intent_rx, snapshot_tx));

    let printer = tokio::spawn(async move {
        let mut printer = TranscriptPrinter::default();
        while snapshot_rx.changed().await.is_ok() {
            let snapshot = snapshot_rx.borrow_and_update().clone();
            for line in printer.render(&snapshot) {
                println!("{}", line);
            }
        }
    });

    println!("{}", HELP);
    let finished = loop {
        tokio::select! {
            finished = &mut driver => break Some(finished),
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("Input closed");
                    break None;
                };
                for intent in parse_line(&line) {
                    if intent_tx.send(intent).await.is_err() {
                        break;
                    }
                }
            }
        }
    };

    drop(intent_tx);
    let outcome = match finished {
        Some(finished) => finished?,
        None => driver.await?,
    };
    let _ = printer.await;
    Ok(outcome)
}
