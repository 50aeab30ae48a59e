//! Event Translator: turns decoded controller input into virtual gamepad
//! reports.
//!
//! Each event is applied in three steps:
//!
//! 1. resolve (or lazily create) the player's [`DeviceSession`],
//! 2. merge the event into the player's [`InputState`] and stage the result on
//!    the device,
//! 3. commit exactly once.
//!
//! Axis updates only carry one component, so the translator always pushes
//! *both* stick vectors from the merged state.  The device never sees a stick
//! whose other half was dropped.
//!
//! [`DeviceSession`]: super::device_registry::DeviceSession
//! [`InputState`]: pocketpad_core::InputState

use std::sync::Arc;

use pocketpad_core::{InputEvent, InputKind, PlayerId, StatusLine};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::device_registry::{
    DeviceError, DeviceHandle, DeviceSessionRegistry, ResetOutcome,
};

/// Sink for the `PLAYER_*` status lines read by the desktop launcher.
pub trait StatusReporter: Send + Sync {
    fn report(&self, line: StatusLine);
}

/// Error type for event translation.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("player {player} is outside the supported range 1..={max_players}")]
    PlayerOutOfRange { player: PlayerId, max_players: u32 },

    #[error("no controller available for player {player}: {source}")]
    DeviceCreation {
        player: PlayerId,
        #[source]
        source: DeviceError,
    },

    #[error("failed to update controller for player {player}: {source}")]
    Commit {
        player: PlayerId,
        #[source]
        source: DeviceError,
    },
}

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The device received a new report.
    Committed,
    /// The event named an unknown symbol and was dropped.
    Ignored,
}

/// The Event Translator.
pub struct EventTranslator {
    registry: DeviceSessionRegistry,
    status: Arc<dyn StatusReporter>,
    max_players: u32,
}

impl EventTranslator {
    pub fn new(
        registry: DeviceSessionRegistry,
        status: Arc<dyn StatusReporter>,
        max_players: u32,
    ) -> Self {
        Self {
            registry,
            status,
            max_players,
        }
    }

    pub fn registry(&self) -> &DeviceSessionRegistry {
        &self.registry
    }

    pub fn max_players(&self) -> u32 {
        self.max_players
    }

    /// Creates a player's device ahead of any input.
    ///
    /// The session stays inactive, so the first real event still announces
    /// `PLAYER_CONNECTED`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError`] if the player is out of range or the device
    /// cannot be created.
    pub fn preinitialize(&mut self, player: PlayerId) -> Result<DeviceHandle, TranslateError> {
        self.check_range(player)?;
        let (session, _) = self
            .registry
            .get_or_create(player)
            .map_err(|source| TranslateError::DeviceCreation { player, source })?;
        Ok(session.handle())
    }

    /// Applies one input event to the player's virtual controller.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError`] if the player is out of range, the device
    /// cannot be created (retried on the next event), or the commit fails.
    pub fn apply(&mut self, event: &InputEvent) -> Result<Applied, TranslateError> {
        let player = event.player;
        self.check_range(player)?;

        let (session, _) = self
            .registry
            .get_or_create(player)
            .map_err(|source| TranslateError::DeviceCreation { player, source })?;

        if session.mark_active() {
            info!("player {player} connected");
            self.status.report(StatusLine::PlayerConnected(player));
        }

        let (state, device) = session.parts_mut();
        match &event.kind {
            InputKind::Axis { axis, value } => {
                state.set_axis(*axis, *value);
                let (lx, ly) = state.left_stick();
                let (rx, ry) = state.right_stick();
                device.set_left_stick(lx, ly);
                device.set_right_stick(rx, ry);
            }
            InputKind::Trigger { side, magnitude } => {
                device.set_trigger(*side, *magnitude);
            }
            InputKind::Button { button, pressed } => {
                if *pressed {
                    state.press(*button);
                } else {
                    state.release(*button);
                }
                device.set_button(*button, *pressed);
            }
            InputKind::Unrecognized(symbol) => {
                debug!("player {player}: ignoring {symbol:?}");
                return Ok(Applied::Ignored);
            }
        }

        device
            .commit()
            .map_err(|source| TranslateError::Commit { player, source })?;
        Ok(Applied::Committed)
    }

    /// Neutralises a player's controller after the relay reports the player
    /// gone.  The device itself stays plugged in.
    ///
    /// Emits `PLAYER_DISCONNECTED` if the player had been announced as
    /// connected.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Commit`] if the neutral report cannot be
    /// written.  The stored state is cleared regardless.
    pub fn reset_player(&mut self, player: PlayerId) -> Result<ResetOutcome, TranslateError> {
        let was_active = self
            .registry
            .get(player)
            .is_some_and(|session| session.is_active());
        let outcome = self.registry.reset(player);
        if was_active {
            info!("player {player} disconnected");
            self.status.report(StatusLine::PlayerDisconnected(player));
        }
        outcome.map_err(|source| TranslateError::Commit { player, source })
    }

    /// Forwards a latency sample for a player as a `PLAYER_PING` line.
    pub fn report_ping(&self, player: PlayerId, latency_ms: u64) {
        if !player.is_within(self.max_players) {
            warn!("dropping ping for out-of-range player {player}");
            return;
        }
        self.status.report(StatusLine::PlayerPing { player, latency_ms });
    }

    fn check_range(&self, player: PlayerId) -> Result<(), TranslateError> {
        if player.is_within(self.max_players) {
            Ok(())
        } else {
            Err(TranslateError::PlayerOutOfRange {
                player,
                max_players: self.max_players,
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
