//! Background task shared by the WebSocket-based channels.
//!
//! A [`TransportTask`] owns one socket. Outbound events go to the task over an
//! unbounded queue; inbound frames are decoded by the task and handed back,
//! in arrival order, over a bounded queue. How events map onto text frames is
//! decided by the [`Framing`] the task was spawned with.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, instrument, warn};

use crate::error::ChannelError;
use crate::protocol::{
    ChannelEvent, Incoming, OutboundEvent, decode_frame, decode_socketio, encode_outbound,
    encode_socketio,
};

const SHUTDOWN_REASON: &str = "client shut down";

/// How events are laid out in text frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    /// Bare `["name", payload]` arrays.
    JsonArray,
    /// Socket.IO packets inside Engine.IO packets.
    SocketIo,
}

impl Framing {
    fn encode(self, event: &OutboundEvent) -> Result<String, ChannelError> {
        match self {
            Framing::JsonArray => encode_outbound(event),
            Framing::SocketIo => encode_socketio(event),
        }
    }

    fn decode(self, frame: &str) -> Result<Incoming, ChannelError> {
        match self {
            Framing::JsonArray => decode_frame(frame),
            Framing::SocketIo => decode_socketio(frame),
        }
    }
}

/// Handle to a running transport task.
pub(crate) struct TransportTask {
    cmd_tx: mpsc::UnboundedSender<OutboundEvent>,
    event_rx: mpsc::Receiver<ChannelEvent>,
    connected: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl TransportTask {
    /// Opens a WebSocket to `url` and starts the task over it.
    #[instrument(skip(event_capacity, shutdown_timeout))]
    pub(crate) async fn connect(
        url: &str,
        framing: Framing,
        event_capacity: usize,
        shutdown_timeout: Duration,
    ) -> Result<Self, ChannelError> {
        if url.starts_with("wss://") {
            // Fails harmlessly when a provider is already installed.
            let _ = rustls::crypto::ring::default_provider().install_default();
        }
        let (stream, response) = connect_async(url).await?;
        info!(status = %response.status(), "WebSocket connected");
        Ok(Self::spawn(stream, framing, event_capacity, shutdown_timeout))
    }

    /// Starts the task over an already established stream.
    pub(crate) fn spawn<S>(
        stream: S,
        framing: Framing,
        event_capacity: usize,
        shutdown_timeout: Duration,
    ) -> Self
    where
        S: Stream<Item = Result<Message, WsError>>
            + Sink<Message, Error = WsError>
            + Unpin
            + Send
            + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(event_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let connected = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(transport_loop(
            stream,
            framing,
            cmd_rx,
            event_tx,
            Arc::clone(&connected),
            shutdown_rx,
        ));

        Self {
            cmd_tx,
            event_rx,
            connected,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout,
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn has_task(&self) -> bool {
        self.task.is_some()
    }

    pub(crate) fn send(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::not_connected());
        }
        self.cmd_tx
            .send(event)
            .map_err(|_| ChannelError::not_connected())
    }

    pub(crate) async fn recv(&mut self) -> Option<ChannelEvent> {
        self.event_rx.recv().await
    }

    /// Signals the task, waits up to the shutdown timeout, then aborts it.
    #[instrument(skip(self))]
    pub(crate) async fn close(&mut self) {
        debug!("Transport close requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!(error = %join_err, "Transport task ended with join error");
                }
                Err(_) => {
                    warn!("Transport task did not exit in time; aborting");
                    task.abort();
                }
            }
        }

        self.connected.store(false, Ordering::Release);
        self.event_rx.close();
        while self.event_rx.try_recv().is_ok() {}
    }
}

impl Drop for TransportTask {
    fn drop(&mut self) {
        // No executor to drive a graceful close here.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// How the loop ended.
enum Exit {
    /// The client asked to stop, or stopped listening.
    Shutdown,
    /// The server or the network ended the connection.
    Lost(Option<String>),
}

/// Multiplexes outbound commands, inbound frames and the shutdown signal.
///
/// Exits after offering exactly one `Disconnected` event. On shutdown the
/// offer never waits for queue space.
async fn transport_loop<S>(
    mut stream: S,
    framing: Framing,
    mut cmd_rx: mpsc::UnboundedReceiver<OutboundEvent>,
    event_tx: mpsc::Sender<ChannelEvent>,
    connected: Arc<AtomicBool>,
    mut shutdown_rx: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin + Send,
{
    debug!(?framing, "Transport loop started");

    let exit = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(event) => match framing.encode(&event) {
                    Ok(frame) => {
                        if let Err(e) = stream.send(Message::text(frame)).await {
                            warn!(error = %e, "Transport send failed");
                            break Exit::Lost(Some(format!("send failed: {}", e)));
                        }
                    }
                    Err(e) => warn!(error = %e, "Dropping unencodable outbound event"),
                },
                None => {
                    let _ = stream.close().await;
                    break Exit::Shutdown;
                }
            },

            _ = &mut shutdown_rx => {
                let _ = stream.close().await;
                break Exit::Shutdown;
            }

            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => match framing.decode(&text) {
                    Ok(Incoming::Deliver(event)) => {
                        // A full queue must not hold up a shutdown request.
                        tokio::select! {
                            sent = event_tx.send(event) => {
                                if sent.is_err() {
                                    debug!("Event receiver gone; stopping transport loop");
                                    let _ = stream.close().await;
                                    break Exit::Shutdown;
                                }
                            }
                            _ = &mut shutdown_rx => {
                                let _ = stream.close().await;
                                break Exit::Shutdown;
                            }
                        }
                    }
                    Ok(Incoming::Reply(frame)) => {
                        if let Err(e) = stream.send(Message::text(frame)).await {
                            warn!(error = %e, "Transport reply failed");
                            break Exit::Lost(Some(format!("send failed: {}", e)));
                        }
                    }
                    Ok(Incoming::Closed(reason)) => {
                        let _ = stream.close().await;
                        break Exit::Lost(Some(reason));
                    }
                    Ok(Incoming::Ignore) => {}
                    Err(e) => warn!(error = %e, "Dropping malformed frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "closed by server".to_string());
                    break Exit::Lost(Some(reason));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Transport receive failed");
                    break Exit::Lost(Some(e.to_string()));
                }
                None => break Exit::Lost(None),
            },
        }
    };

    connected.store(false, Ordering::Release);
    match exit {
        Exit::Shutdown => {
            info!("WebSocket closed by client");
            let _ = event_tx.try_send(ChannelEvent::Disconnected {
                reason: Some(SHUTDOWN_REASON.to_string()),
            });
        }
        Exit::Lost(reason) => {
            info!(reason = ?reason, "WebSocket disconnected");
            tokio::select! {
                _ = event_tx.send(ChannelEvent::Disconnected { reason }) => {}
                _ = &mut shutdown_rx => debug!("Shutdown while reporting disconnect"),
            }
        }
    }
}
