//! Relay Channel Manager.
//!
//! Keeps one WebSocket connection to the relay server alive and turns its
//! traffic into [`RelayEvent`]s for the application layer.
//!
//! Architecture:
//! - The relay is a Socket.IO v4 server; the channel speaks the Engine.IO v4
//!   WebSocket transport directly (`/socket.io/?EIO=4&transport=websocket`).
//! - A spawned task owns the socket, answers engine pings, decodes events
//!   and forwards them on a bounded `mpsc` channel in arrival order.
//! - On any failure the task waits `reconnect_interval` and tries again,
//!   forever.  Controller sessions live in the application layer and are
//!   not touched by reconnects.
//!
//! State machine:
//!
//! ```text
//!  Disconnected ──attempt──▶ Connecting ──"40" ack──▶ Connected
//!       ▲                        │                       │
//!       └──── wait interval ◀────┴──── error / close ◀───┘
//! ```

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pocketpad_core::{
    decode_packet, relay_socket_url,
    protocol::engineio::{encode_connect, encode_pong, SocketPacket},
    EnginePacket, ProtocolError, RelayMessage,
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, Mutex},
    time::{self, timeout},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, info, warn};

use crate::application::handle_relay::RelayEvent;

/// Errors that can end one relay connection.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The configured relay URL cannot be turned into a socket URL.
    #[error("invalid relay URL: {0}")]
    InvalidUrl(#[from] ProtocolError),

    /// The WebSocket handshake failed.
    #[error("failed to connect to relay at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: WsError,
    },

    /// The WebSocket handshake did not finish in time.
    #[error("connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// An established socket failed.
    #[error("connection I/O error: {0}")]
    WebSocket(#[from] WsError),

    /// The relay refused the namespace connection.
    #[error("relay rejected the connection: {0}")]
    Rejected(String),

    /// Nothing (not even a ping) arrived within the liveness window.
    #[error("no traffic from relay for {0:?}")]
    LivenessTimeout(Duration),

    /// The application dropped its event receiver.
    #[error("event receiver closed")]
    ReceiverGone,
}

/// Configuration for the relay connection.
#[derive(Debug, Clone)]
pub struct RelayChannelConfig {
    /// Relay base URL, e.g. `http://localhost:3000`.
    pub relay_url: String,
    /// Pause between connection attempts.
    pub reconnect_interval: Duration,
    /// Upper bound on the WebSocket handshake and the engine open packet.
    pub connect_timeout: Duration,
    /// Capacity of the event FIFO towards the application.
    pub channel_capacity: usize,
}

impl Default for RelayChannelConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://localhost:3000".to_string(),
            reconnect_interval: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(5),
            channel_capacity: 256,
        }
    }
}

/// Connection state of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

/// Manages the connection from the receiver to the relay.
pub struct RelayChannel {
    config: RelayChannelConfig,
    state: Mutex<ChannelState>,
    attempts: AtomicU64,
}

impl RelayChannel {
    /// Creates a new (not yet connected) `RelayChannel`.
    pub fn new(config: RelayChannelConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ChannelState::Disconnected),
            attempts: AtomicU64::new(0),
        }
    }

    /// Current connection state.
    pub async fn state(&self) -> ChannelState {
        *self.state.lock().await
    }

    /// Number of connection attempts made so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Starts the connection task.
    ///
    /// Returns the receiver that delivers [`RelayEvent`]s.  The task retries
    /// until `running` is cleared or the receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidUrl`] if the relay URL is unusable; this
    /// is checked once, before anything is spawned.
    pub async fn start(
        self: Arc<Self>,
        running: Arc<AtomicBool>,
    ) -> Result<mpsc::Receiver<RelayEvent>, RelayError> {
        let url = relay_socket_url(&self.config.relay_url)?;
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let this = Arc::clone(&self);

        tokio::spawn(async move {
            this.run(url, tx, running).await;
        });

        Ok(rx)
    }

    async fn run(&self, url: String, tx: mpsc::Sender<RelayEvent>, running: Arc<AtomicBool>) {
        let interval = self.config.reconnect_interval;

        while running.load(Ordering::Relaxed) {
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            self.set_state(ChannelState::Connecting).await;
            debug!("connecting to relay at {url} (attempt {attempt})");

            let result = self.run_session(&url, &tx).await;
            let was_connected = self.state().await == ChannelState::Connected;
            self.set_state(ChannelState::Disconnected).await;

            let reason = match result {
                Ok(()) => "closed by relay".to_string(),
                Err(RelayError::ReceiverGone) => {
                    info!("event receiver dropped; stopping relay channel");
                    return;
                }
                Err(e) => e.to_string(),
            };

            if was_connected {
                warn!("disconnected from relay ({reason}); reconnecting in {interval:?}");
                if tx.send(RelayEvent::Disconnected { reason }).await.is_err() {
                    return;
                }
            } else {
                warn!("relay not reachable ({reason}); retrying in {interval:?}");
            }

            if running.load(Ordering::Relaxed) {
                time::sleep(interval).await;
            }
        }
    }

    /// Drives one connection from handshake to loss.
    ///
    /// `Ok(())` means the relay closed the session cleanly.
    async fn run_session(
        &self,
        url: &str,
        tx: &mpsc::Sender<RelayEvent>,
    ) -> Result<(), RelayError> {
        let (ws, _response) = timeout(self.config.connect_timeout, connect_async(url))
            .await
            .map_err(|_| RelayError::ConnectTimeout(self.config.connect_timeout))?
            .map_err(|source| RelayError::Connect {
                url: url.to_string(),
                source,
            })?;
        let (mut sink, mut stream) = ws.split();

        // Until the open packet tells us the ping schedule.
        let mut liveness = self.config.connect_timeout;

        loop {
            let frame = match timeout(liveness, stream.next()).await {
                Err(_) => return Err(RelayError::LivenessTimeout(liveness)),
                Ok(None) => return Ok(()),
                Ok(Some(frame)) => frame?,
            };

            let text = match frame {
                WsMessage::Text(text) => text,
                WsMessage::Close(_) => return Ok(()),
                WsMessage::Binary(_) => {
                    debug!("ignoring binary frame from relay");
                    continue;
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            };

            let packet = match decode_packet(&text) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!("dropping undecodable relay frame: {e}");
                    continue;
                }
            };

            match packet {
                EnginePacket::Open(open) => {
                    debug!(
                        "engine.io session {} open (ping every {} ms)",
                        open.sid, open.ping_interval
                    );
                    liveness = open.liveness_window();
                    sink.send(WsMessage::Text(encode_connect())).await?;
                }
                EnginePacket::Ping(probe) => {
                    sink.send(WsMessage::Text(encode_pong(&probe))).await?;
                }
                EnginePacket::Close => return Ok(()),
                EnginePacket::Message(SocketPacket::Connect(_)) => {
                    self.set_state(ChannelState::Connected).await;
                    info!("connected to relay at {url}");
                    tx.send(RelayEvent::Connected {
                        url: url.to_string(),
                    })
                    .await
                    .map_err(|_| RelayError::ReceiverGone)?;
                }
                EnginePacket::Message(SocketPacket::ConnectError(reason)) => {
                    return Err(RelayError::Rejected(reason.to_string()));
                }
                EnginePacket::Message(SocketPacket::Disconnect) => return Ok(()),
                EnginePacket::Message(SocketPacket::Event { name, args, .. }) => {
                    match RelayMessage::from_event(&name, &args) {
                        Ok(message) => tx
                            .send(RelayEvent::Message(message))
                            .await
                            .map_err(|_| RelayError::ReceiverGone)?,
                        Err(e) => warn!("dropping malformed `{name}` event: {e}"),
                    }
                }
                EnginePacket::Message(SocketPacket::Unsupported(kind)) => {
                    debug!("ignoring unsupported socket.io packet type `{kind}`");
                }
                EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
            }
        }
    }

    async fn set_state(&self, state: ChannelState) {
        *self.state.lock().await = state;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
