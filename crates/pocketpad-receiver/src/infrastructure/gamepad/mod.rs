//! Virtual gamepad backends.
//!
//! Each backend implements [`GamepadBackend`] from the application layer:
//!
//! | Backend       | Platform | Device                                    |
//! |---------------|----------|-------------------------------------------|
//! | `uinput`      | Linux    | kernel uinput pad with Xbox 360 layout    |
//! | `mock`        | any      | in-memory, records reports (tests, dry run)|
//!
//! Both stage into a [`GamepadReport`] and publish it whole on `commit`.

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

use pocketpad_core::{ButtonSet, TriggerSide, XusbButton};

use crate::application::device_registry::{DeviceError, GamepadBackend};
use crate::infrastructure::config::BackendKind;

/// A full controller report: both sticks, both triggers and the button mask.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadReport {
    pub left_stick: (f32, f32),
    pub right_stick: (f32, f32),
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub buttons: ButtonSet,
}

impl GamepadReport {
    pub fn set_trigger(&mut self, side: TriggerSide, magnitude: f32) {
        match side {
            TriggerSide::Left => self.left_trigger = magnitude,
            TriggerSide::Right => self.right_trigger = magnitude,
        }
    }

    pub fn set_button(&mut self, button: XusbButton, pressed: bool) {
        if pressed {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(button);
        }
    }
}

/// Opens the backend selected in the configuration.
///
/// # Errors
///
/// Returns [`DeviceError::Unavailable`] when the device subsystem cannot be
/// used on this machine (missing driver, no permission, unsupported OS).
pub fn open_backend(kind: BackendKind) -> Result<Box<dyn GamepadBackend>, DeviceError> {
    match kind {
        BackendKind::Mock => Ok(Box::new(mock::MockGamepadBackend::dry_run())),
        #[cfg(target_os = "linux")]
        BackendKind::Uinput => Ok(Box::new(linux::UinputBackend::open()?)),
        #[cfg(not(target_os = "linux"))]
        BackendKind::Uinput => Err(DeviceError::Unavailable(
            "the uinput backend is only available on Linux".to_string(),
        )),
    }
}
