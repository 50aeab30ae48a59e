//! In-memory gamepad backend.
//!
//! # Why a mock backend?
//!
//! The real backend creates kernel devices, which needs `/dev/uinput` write
//! access and leaves controllers visible to every program on the machine.
//! The `MockGamepadBackend` instead records what a real device would have
//! been sent:
//!
//! - every player a device was created for, in order,
//! - every committed [`GamepadReport`], tagged with its player.
//!
//! Clones share the same log, so a test can keep one clone for assertions
//! after handing another to the registry.
//!
//! # Failure injection
//!
//! [`MockGamepadBackend::fail_next_creates`] makes the next `n` creation
//! attempts fail, which exercises the retry-on-next-event path.
//!
//! # Dry run
//!
//! [`MockGamepadBackend::dry_run`] keeps nothing and only logs each report at
//! `debug` level.  The binary uses it for `--backend mock`.

use std::sync::{Arc, Mutex};

use pocketpad_core::{PlayerId, TriggerSide, XusbButton};
use tracing::debug;

use super::GamepadReport;
use crate::application::device_registry::{DeviceError, GamepadBackend, VirtualGamepad};

#[derive(Debug, Default)]
struct MockLog {
    created: Vec<PlayerId>,
    commits: Vec<(PlayerId, GamepadReport)>,
    failures_remaining: usize,
}

/// A backend that records reports instead of creating OS devices.
#[derive(Debug, Clone)]
pub struct MockGamepadBackend {
    log: Arc<Mutex<MockLog>>,
    record: bool,
}

impl MockGamepadBackend {
    /// Creates a recording backend with an empty log.
    pub fn new() -> Self {
        Self {
            log: Arc::default(),
            record: true,
        }
    }

    /// Creates a backend that only logs reports.
    pub fn dry_run() -> Self {
        Self {
            log: Arc::default(),
            record: false,
        }
    }

    /// Makes the next `n` calls to `create_device` fail.
    pub fn fail_next_creates(&self, n: usize) {
        self.log.lock().unwrap().failures_remaining = n;
    }

    /// Players that devices were created for, in creation order.
    pub fn created(&self) -> Vec<PlayerId> {
        self.log.lock().unwrap().created.clone()
    }

    /// Every committed report, in commit order.
    pub fn commits(&self) -> Vec<(PlayerId, GamepadReport)> {
        self.log.lock().unwrap().commits.clone()
    }

    /// Committed reports for one player.
    pub fn commits_for(&self, player: PlayerId) -> Vec<GamepadReport> {
        self.log
            .lock()
            .unwrap()
            .commits
            .iter()
            .filter(|(p, _)| *p == player)
            .map(|(_, report)| *report)
            .collect()
    }

    /// The most recent report committed for `player`.
    pub fn last_report(&self, player: PlayerId) -> Option<GamepadReport> {
        self.commits_for(player).last().copied()
    }
}

impl Default for MockGamepadBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GamepadBackend for MockGamepadBackend {
    fn create_device(&mut self, player: PlayerId) -> Result<Box<dyn VirtualGamepad>, DeviceError> {
        let mut log = self.log.lock().unwrap();
        if log.failures_remaining > 0 {
            log.failures_remaining -= 1;
            return Err(DeviceError::Create {
                player,
                reason: "injected failure".to_string(),
            });
        }
        if self.record {
            log.created.push(player);
        }
        debug!("mock controller created for player {player}");
        Ok(Box::new(MockGamepad {
            player,
            staged: GamepadReport::default(),
            log: self.record.then(|| Arc::clone(&self.log)),
        }))
    }
}

/// A device created by [`MockGamepadBackend`].
pub struct MockGamepad {
    player: PlayerId,
    staged: GamepadReport,
    log: Option<Arc<Mutex<MockLog>>>,
}

impl VirtualGamepad for MockGamepad {
    fn set_left_stick(&mut self, x: f32, y: f32) {
        self.staged.left_stick = (x, y);
    }

    fn set_right_stick(&mut self, x: f32, y: f32) {
        self.staged.right_stick = (x, y);
    }

    fn set_trigger(&mut self, side: TriggerSide, magnitude: f32) {
        self.staged.set_trigger(side, magnitude);
    }

    fn set_button(&mut self, button: XusbButton, pressed: bool) {
        self.staged.set_button(button, pressed);
    }

    fn commit(&mut self) -> Result<(), DeviceError> {
        match &self.log {
            Some(log) => log.lock().unwrap().commits.push((self.player, self.staged)),
            None => debug!("player {}: {:?}", self.player, self.staged),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_records_staged_report() {
        let mut backend = MockGamepadBackend::new();
        let observer = backend.clone();
        let mut pad = backend.create_device(PlayerId::new(2)).unwrap();

        pad.set_left_stick(0.5, -0.5);
        pad.set_button(XusbButton::A, true);
        pad.commit().unwrap();

        assert_eq!(observer.created(), vec![PlayerId::new(2)]);
        let report = observer.last_report(PlayerId::new(2)).unwrap();
        assert_eq!(report.left_stick, (0.5, -0.5));
        assert!(report.buttons.contains(XusbButton::A));
    }

    #[test]
    fn test_staging_without_commit_records_nothing() {
        let mut backend = MockGamepadBackend::new();
        let mut pad = backend.create_device(PlayerId::new(1)).unwrap();

        pad.set_trigger(TriggerSide::Left, 1.0);

        assert!(backend.commits().is_empty());
    }

    #[test]
    fn test_injected_failures_are_consumed_in_order() {
        let mut backend = MockGamepadBackend::new();
        backend.fail_next_creates(1);

        assert!(backend.create_device(PlayerId::new(1)).is_err());
        assert!(backend.create_device(PlayerId::new(1)).is_ok());
        assert_eq!(backend.created(), vec![PlayerId::new(1)]);
    }

    #[test]
    fn test_dry_run_keeps_no_log() {
        let mut backend = MockGamepadBackend::dry_run();
        let mut pad = backend.create_device(PlayerId::new(1)).unwrap();
        pad.commit().unwrap();

        assert!(backend.created().is_empty());
        assert!(backend.commits().is_empty());
    }
}
