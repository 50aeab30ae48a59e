//! Device Session Registry: one virtual gamepad per player, created lazily
//! and kept for the life of the process.
//!
//! # Why devices are never destroyed
//!
//! Unplugging a virtual controller makes the OS re-enumerate hardware, and
//! games often drop or reorder controllers when that happens.  A player whose
//! browser reconnects therefore resumes on the *same* device: a disconnect
//! clears the player's input state ([`DeviceSessionRegistry::reset`]) but
//! keeps the device binding.
//!
//! # Failure handling
//!
//! When the backend refuses to create a device, no record is kept for that
//! player, so the next event for the player tries again from scratch.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use pocketpad_core::{InputState, PlayerId, TriggerSide, XusbButton};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by a gamepad backend.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The driver/OS refused to allocate another virtual device.
    #[error("could not create virtual gamepad for player {player}: {reason}")]
    Create { player: PlayerId, reason: String },

    /// The device subsystem itself is not usable (fatal at startup).
    #[error("gamepad backend unavailable: {0}")]
    Unavailable(String),

    /// Writing a report to the device failed.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A virtual controller as seen by the application layer.
///
/// Setters only stage values; nothing reaches the OS until [`commit`] is
/// called, which publishes the whole staged report at once.
///
/// [`commit`]: VirtualGamepad::commit
pub trait VirtualGamepad: Send {
    /// Stages the left stick vector, each component in `[-1.0, 1.0]`.
    fn set_left_stick(&mut self, x: f32, y: f32);

    /// Stages the right stick vector, each component in `[-1.0, 1.0]`.
    fn set_right_stick(&mut self, x: f32, y: f32);

    /// Stages a trigger magnitude in `[0.0, 1.0]`.
    fn set_trigger(&mut self, side: TriggerSide, magnitude: f32);

    /// Stages a digital button.
    fn set_button(&mut self, button: XusbButton, pressed: bool);

    /// Publishes the staged report to the OS.
    fn commit(&mut self) -> Result<(), DeviceError>;
}

/// Creates virtual controllers.  Each supported driver provides one in the
/// infrastructure layer.
#[cfg_attr(test, mockall::automock)]
pub trait GamepadBackend: Send {
    /// Plugs in a new virtual controller for `player`.
    fn create_device(&mut self, player: PlayerId) -> Result<Box<dyn VirtualGamepad>, DeviceError>;
}

/// Process-unique identity of a created device.
///
/// Handles are never reused, so comparing two handles tells whether a player
/// is still on the same physical (virtual) device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gamepad#{}", self.0)
    }
}

/// Binding of one player to one virtual controller plus its input state.
pub struct DeviceSession {
    player: PlayerId,
    handle: DeviceHandle,
    device: Box<dyn VirtualGamepad>,
    state: InputState,
    active: bool,
}

impl DeviceSession {
    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    /// Last committed stick values and pressed buttons.
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// `true` once the player has sent input since creation or the last reset.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn mark_active(&mut self) -> bool {
        !std::mem::replace(&mut self.active, true)
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut InputState, &mut dyn VirtualGamepad) {
        (&mut self.state, self.device.as_mut())
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("player", &self.player)
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// What [`DeviceSessionRegistry::reset`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// No device exists for the player; nothing to do.
    NoSession,
    /// State neutralised; `was_active` tells whether the player had been
    /// announced as connected.
    Reset { was_active: bool },
}

/// Owns every [`DeviceSession`], keyed by player.
pub struct DeviceSessionRegistry {
    backend: Box<dyn GamepadBackend>,
    sessions: HashMap<PlayerId, DeviceSession>,
    next_handle: u64,
}

impl DeviceSessionRegistry {
    pub fn new(backend: Box<dyn GamepadBackend>) -> Self {
        Self {
            backend,
            sessions: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Returns the player's session, creating the device on first use.
    ///
    /// The boolean is `true` when the device was created by this call.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`DeviceError`] if creation fails; the registry
    /// then holds no record for the player.
    pub fn get_or_create(
        &mut self,
        player: PlayerId,
    ) -> Result<(&mut DeviceSession, bool), DeviceError> {
        match self.sessions.entry(player) {
            Entry::Occupied(entry) => Ok((entry.into_mut(), false)),
            Entry::Vacant(entry) => {
                info!("assigning new controller for player {player}");
                let device = self.backend.create_device(player)?;
                let handle = DeviceHandle(self.next_handle);
                self.next_handle += 1;
                info!("controller {handle} assigned to player {player}");
                let session = entry.insert(DeviceSession {
                    player,
                    handle,
                    device,
                    state: InputState::new(),
                    active: false,
                });
                Ok((session, true))
            }
        }
    }

    /// Returns the session for `player` without creating one.
    pub fn get(&self, player: PlayerId) -> Option<&DeviceSession> {
        self.sessions.get(&player)
    }

    /// Returns the device handle bound to `player`, if any.
    pub fn handle(&self, player: PlayerId) -> Option<DeviceHandle> {
        self.sessions.get(&player).map(DeviceSession::handle)
    }

    /// Number of devices created so far.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Neutralises a player's controller without unplugging it.
    ///
    /// Sticks and triggers return to rest, every button is released, the
    /// neutral report is committed, and the session is marked inactive.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if the neutral report cannot be committed.
    /// The stored state is cleared regardless.
    pub fn reset(&mut self, player: PlayerId) -> Result<ResetOutcome, DeviceError> {
        let Some(session) = self.sessions.get_mut(&player) else {
            return Ok(ResetOutcome::NoSession);
        };
        let was_active = std::mem::replace(&mut session.active, false);
        let pressed = session.state.buttons;
        session.state.reset();

        let device = session.device.as_mut();
        device.set_left_stick(0.0, 0.0);
        device.set_right_stick(0.0, 0.0);
        device.set_trigger(TriggerSide::Left, 0.0);
        device.set_trigger(TriggerSide::Right, 0.0);
        for button in pressed.iter() {
            device.set_button(button, false);
        }
        debug!("player {player}: controller {} reset to neutral", session.handle);
        device.commit()?;

        Ok(ResetOutcome::Reset { was_active })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    // ── Recording device ──────────────────────────────────────────────────────

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Left(f32, f32),
        Right(f32, f32),
        Trigger(TriggerSide, f32),
        Button(XusbButton, bool),
        Commit,
    }

    struct RecordingGamepad {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl VirtualGamepad for RecordingGamepad {
        fn set_left_stick(&mut self, x: f32, y: f32) {
            self.calls.lock().unwrap().push(Call::Left(x, y));
        }
        fn set_right_stick(&mut self, x: f32, y: f32) {
            self.calls.lock().unwrap().push(Call::Right(x, y));
        }
        fn set_trigger(&mut self, side: TriggerSide, magnitude: f32) {
            self.calls.lock().unwrap().push(Call::Trigger(side, magnitude));
        }
        fn set_button(&mut self, button: XusbButton, pressed: bool) {
            self.calls.lock().unwrap().push(Call::Button(button, pressed));
        }
        fn commit(&mut self) -> Result<(), DeviceError> {
            self.calls.lock().unwrap().push(Call::Commit);
            Ok(())
        }
    }

    fn recording_backend(calls: Arc<Mutex<Vec<Call>>>) -> MockGamepadBackend {
        let mut backend = MockGamepadBackend::new();
        backend.expect_create_device().returning(move |_| {
            Ok(Box::new(RecordingGamepad {
                calls: Arc::clone(&calls),
            }) as Box<dyn VirtualGamepad>)
        });
        backend
    }

    // ── get_or_create ─────────────────────────────────────────────────────────

    #[test]
    fn test_get_or_create_creates_once_per_player() {
        // Arrange
        let mut backend = MockGamepadBackend::new();
        backend
            .expect_create_device()
            .times(1)
            .returning(|_| {
                Ok(Box::new(RecordingGamepad {
                    calls: Arc::default(),
                }) as Box<dyn VirtualGamepad>)
            });
        let mut registry = DeviceSessionRegistry::new(Box::new(backend));
        let player = PlayerId::new(1);

        // Act
        let (first, created_first) = registry.get_or_create(player).unwrap();
        let first_handle = first.handle();
        let (second, created_second) = registry.get_or_create(player).unwrap();

        // Assert
        assert!(created_first);
        assert!(!created_second);
        assert_eq!(first_handle, second.handle());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_each_player_gets_a_distinct_handle() {
        let mut registry = DeviceSessionRegistry::new(Box::new(recording_backend(Arc::default())));

        let h1 = registry.get_or_create(PlayerId::new(1)).unwrap().0.handle();
        let h2 = registry.get_or_create(PlayerId::new(2)).unwrap().0.handle();

        assert_ne!(h1, h2);
        assert_eq!(registry.handle(PlayerId::new(2)), Some(h2));
    }

    #[test]
    fn test_creation_failure_leaves_no_record_and_next_call_retries() {
        // Arrange: the first attempt fails, the second succeeds.
        let mut backend = MockGamepadBackend::new();
        let mut seq = mockall::Sequence::new();
        backend
            .expect_create_device()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|player| {
                Err(DeviceError::Create {
                    player,
                    reason: "bus full".to_string(),
                })
            });
        backend
            .expect_create_device()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(Box::new(RecordingGamepad {
                    calls: Arc::default(),
                }) as Box<dyn VirtualGamepad>)
            });
        let mut registry = DeviceSessionRegistry::new(Box::new(backend));
        let player = PlayerId::new(3);

        // Act / Assert: failure keeps no session
        assert!(registry.get_or_create(player).is_err());
        assert!(registry.get(player).is_none());

        // Act / Assert: retry succeeds
        let (_, created) = registry.get_or_create(player).unwrap();
        assert!(created);
        assert!(registry.get(player).is_some());
    }

    // ── reset ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_reset_unknown_player_is_no_session() {
        let mut registry = DeviceSessionRegistry::new(Box::new(MockGamepadBackend::new()));
        assert_eq!(
            registry.reset(PlayerId::new(1)).unwrap(),
            ResetOutcome::NoSession
        );
    }

    #[test]
    fn test_reset_neutralises_state_and_keeps_device() {
        // Arrange
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = DeviceSessionRegistry::new(Box::new(recording_backend(Arc::clone(&calls))));
        let player = PlayerId::new(1);
        let handle = {
            let (session, _) = registry.get_or_create(player).unwrap();
            session.mark_active();
            session.state.set_axis(pocketpad_core::Axis::LeftX, 0.8);
            session.state.press(XusbButton::B);
            session.handle()
        };
        calls.lock().unwrap().clear();

        // Act
        let outcome = registry.reset(player).unwrap();

        // Assert
        assert_eq!(outcome, ResetOutcome::Reset { was_active: true });
        let session = registry.get(player).unwrap();
        assert!(session.state().is_neutral());
        assert!(!session.is_active());
        assert_eq!(session.handle(), handle);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Left(0.0, 0.0),
                Call::Right(0.0, 0.0),
                Call::Trigger(TriggerSide::Left, 0.0),
                Call::Trigger(TriggerSide::Right, 0.0),
                Call::Button(XusbButton::B, false),
                Call::Commit,
            ]
        );
    }

    #[test]
    fn test_mark_active_reports_first_activation_only() {
        let mut registry = DeviceSessionRegistry::new(Box::new(recording_backend(Arc::default())));
        let (session, _) = registry.get_or_create(PlayerId::new(1)).unwrap();

        assert!(session.mark_active());
        assert!(!session.mark_active());
    }

    #[test]
    fn test_device_handle_display() {
        assert_eq!(DeviceHandle(7).to_string(), "gamepad#7");
    }
}
