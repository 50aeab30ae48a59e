//! HandleRelayUseCase: routes relay traffic to the translator in arrival order.
//!
//! The relay channel turns socket traffic into [`RelayEvent`]s; this use case
//! consumes them one at a time on a single task, so per-player updates are
//! applied strictly in the order the relay delivered them.  Nothing here can
//! fail the process: every error is logged and the event is dropped.

use pocketpad_core::RelayMessage;
use tracing::{debug, info, warn};

use super::translate_event::{Applied, EventTranslator};

/// Events produced by the relay channel for the application layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// The Socket.IO namespace handshake completed.
    Connected { url: String },
    /// An established connection was lost.  Sessions are kept.
    Disconnected { reason: String },
    /// A decoded event from the relay.
    Message(RelayMessage),
}

/// Counters kept by [`HandleRelayUseCase`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub connections: u64,
    pub applied: u64,
    pub ignored: u64,
    pub dropped: u64,
}

/// The Handle Relay use case.
pub struct HandleRelayUseCase {
    translator: EventTranslator,
    stats: RelayStats,
}

impl HandleRelayUseCase {
    pub fn new(translator: EventTranslator) -> Self {
        Self {
            translator,
            stats: RelayStats::default(),
        }
    }

    pub fn translator(&self) -> &EventTranslator {
        &self.translator
    }

    pub fn translator_mut(&mut self) -> &mut EventTranslator {
        &mut self.translator
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Handles one relay event.
    pub fn handle(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connected { url } => {
                self.stats.connections += 1;
                info!(
                    "relay connection #{} established ({url}); {} controller(s) retained",
                    self.stats.connections,
                    self.translator.registry().len()
                );
            }
            RelayEvent::Disconnected { reason } => {
                warn!("relay connection lost: {reason}");
            }
            RelayEvent::Message(RelayMessage::ControllerInput(input)) => {
                match self.translator.apply(&input) {
                    Ok(Applied::Committed) => self.stats.applied += 1,
                    Ok(Applied::Ignored) => self.stats.ignored += 1,
                    Err(e) => {
                        self.stats.dropped += 1;
                        warn!("dropping input event: {e}");
                    }
                }
            }
            RelayEvent::Message(RelayMessage::PlayerDisconnected(player)) => {
                if let Err(e) = self.translator.reset_player(player) {
                    warn!("reset after disconnect failed: {e}");
                }
            }
            RelayEvent::Message(RelayMessage::PlayerPing { player, latency_ms }) => {
                self.translator.report_ping(player, latency_ms);
            }
            RelayEvent::Message(RelayMessage::Other(name)) => {
                debug!("ignoring relay event `{name}`");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
