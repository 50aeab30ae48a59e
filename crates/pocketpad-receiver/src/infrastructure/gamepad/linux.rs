//! Linux uinput gamepad backend.
//!
//! Every player gets a kernel virtual device laid out like a wired Xbox 360
//! pad (the same layout the `xpad` driver exposes), so games and SDL pick it
//! up with their stock mappings:
//!
//! | Report field   | evdev code              | Range             |
//! |----------------|-------------------------|-------------------|
//! | left stick     | `ABS_X` / `ABS_Y`       | -32768..=32767    |
//! | right stick    | `ABS_RX` / `ABS_RY`     | -32768..=32767    |
//! | triggers       | `ABS_Z` / `ABS_RZ`      | 0..=255           |
//! | d-pad          | `ABS_HAT0X` / `ABS_HAT0Y` | -1..=1          |
//! | face, shoulder and menu buttons | `BTN_*` | 0 / 1             |
//!
//! Stick Y is inverted: phone input is up-positive, evdev is down-positive.
//!
//! The process needs write access to `/dev/uinput` (usually membership of
//! the `input` group or a udev rule).

use std::fs::OpenOptions;

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisCode, AttributeSet, BusType, EventType, InputEvent, InputId, KeyCode,
    UinputAbsSetup,
};
use pocketpad_core::{ButtonSet, PlayerId, TriggerSide, XusbButton};
use tracing::{debug, info};

use super::GamepadReport;
use crate::application::device_registry::{DeviceError, GamepadBackend, VirtualGamepad};

const UINPUT_PATH: &str = "/dev/uinput";

// Microsoft X-Box 360 pad
const VENDOR_ID: u16 = 0x045e;
const PRODUCT_ID: u16 = 0x028e;
const VERSION: u16 = 0x0110;

const STICK_MAX: f32 = 32767.0;
const TRIGGER_MAX: f32 = 255.0;

/// Buttons exposed as keys.  The d-pad is reported on the hat axes instead.
const KEY_BUTTONS: [(XusbButton, KeyCode); 9] = [
    (XusbButton::A, KeyCode::BTN_SOUTH),
    (XusbButton::B, KeyCode::BTN_EAST),
    (XusbButton::X, KeyCode::BTN_NORTH),
    (XusbButton::Y, KeyCode::BTN_WEST),
    (XusbButton::LeftShoulder, KeyCode::BTN_TL),
    (XusbButton::RightShoulder, KeyCode::BTN_TR),
    (XusbButton::Back, KeyCode::BTN_SELECT),
    (XusbButton::Start, KeyCode::BTN_START),
    (XusbButton::Guide, KeyCode::BTN_MODE),
];

/// Creates uinput devices.
#[derive(Debug)]
pub struct UinputBackend;

impl UinputBackend {
    /// Checks that `/dev/uinput` can be opened for writing.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unavailable`] when the node is missing or the
    /// process lacks permission.
    pub fn open() -> Result<Self, DeviceError> {
        OpenOptions::new()
            .write(true)
            .open(UINPUT_PATH)
            .map_err(|e| DeviceError::Unavailable(format!("cannot open {UINPUT_PATH}: {e}")))?;
        info!("uinput backend ready");
        Ok(Self)
    }
}

impl GamepadBackend for UinputBackend {
    fn create_device(&mut self, player: PlayerId) -> Result<Box<dyn VirtualGamepad>, DeviceError> {
        let device = build_device(player).map_err(|e| DeviceError::Create {
            player,
            reason: e.to_string(),
        })?;
        debug!("uinput device created for player {player}");
        Ok(Box::new(UinputGamepad {
            device,
            staged: GamepadReport::default(),
        }))
    }
}

fn build_device(player: PlayerId) -> std::io::Result<VirtualDevice> {
    let mut keys = AttributeSet::<KeyCode>::new();
    for (_, key) in KEY_BUTTONS {
        keys.insert(key);
    }

    let joystick_setup = AbsInfo::new(0, -32768, 32767, 16, 128, 1);
    let triggers_setup = AbsInfo::new(0, 0, 255, 0, 0, 1);
    let dpad_setup = AbsInfo::new(0, -1, 1, 0, 0, 1);

    let name = format!("PocketPad Controller {player}");
    let mut builder = VirtualDeviceBuilder::new()?
        .name(&name)
        .input_id(InputId::new(BusType::BUS_USB, VENDOR_ID, PRODUCT_ID, VERSION))
        .with_keys(&keys)?;
    for code in [
        AbsoluteAxisCode::ABS_X,
        AbsoluteAxisCode::ABS_Y,
        AbsoluteAxisCode::ABS_RX,
        AbsoluteAxisCode::ABS_RY,
    ] {
        builder = builder.with_absolute_axis(&UinputAbsSetup::new(code, joystick_setup))?;
    }
    for code in [AbsoluteAxisCode::ABS_Z, AbsoluteAxisCode::ABS_RZ] {
        builder = builder.with_absolute_axis(&UinputAbsSetup::new(code, triggers_setup))?;
    }
    for code in [AbsoluteAxisCode::ABS_HAT0X, AbsoluteAxisCode::ABS_HAT0Y] {
        builder = builder.with_absolute_axis(&UinputAbsSetup::new(code, dpad_setup))?;
    }
    builder.build()
}

/// A player's uinput device.
pub struct UinputGamepad {
    device: VirtualDevice,
    staged: GamepadReport,
}

impl VirtualGamepad for UinputGamepad {
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

    /// Writes the whole report followed by one `SYN_REPORT`.
    fn commit(&mut self) -> Result<(), DeviceError> {
        self.device.emit(&report_events(&self.staged))?;
        Ok(())
    }
}

fn report_events(report: &GamepadReport) -> Vec<InputEvent> {
    let (lx, ly) = report.left_stick;
    let (rx, ry) = report.right_stick;
    let (hat_x, hat_y) = hat_values(report.buttons);

    let abs = |code: AbsoluteAxisCode, value: i32| {
        InputEvent::new(EventType::ABSOLUTE.0, code.0, value)
    };
    let mut events = vec![
        abs(AbsoluteAxisCode::ABS_X, stick_to_abs(lx)),
        abs(AbsoluteAxisCode::ABS_Y, stick_to_abs(-ly)),
        abs(AbsoluteAxisCode::ABS_RX, stick_to_abs(rx)),
        abs(AbsoluteAxisCode::ABS_RY, stick_to_abs(-ry)),
        abs(AbsoluteAxisCode::ABS_Z, trigger_to_abs(report.left_trigger)),
        abs(AbsoluteAxisCode::ABS_RZ, trigger_to_abs(report.right_trigger)),
        abs(AbsoluteAxisCode::ABS_HAT0X, hat_x),
        abs(AbsoluteAxisCode::ABS_HAT0Y, hat_y),
    ];
    events.extend(KEY_BUTTONS.iter().map(|(button, key)| {
        InputEvent::new(
            EventType::KEY.0,
            key.0,
            i32::from(report.buttons.contains(*button)),
        )
    }));
    events
}

fn stick_to_abs(value: f32) -> i32 {
    (value.clamp(-1.0, 1.0) * STICK_MAX).round() as i32
}

fn trigger_to_abs(value: f32) -> i32 {
    (value.clamp(0.0, 1.0) * TRIGGER_MAX).round() as i32
}

/// Hat axes from the d-pad bits; opposite directions cancel out.
fn hat_values(buttons: ButtonSet) -> (i32, i32) {
    let bit = |b: XusbButton| i32::from(buttons.contains(b));
    (
        bit(XusbButton::DpadRight) - bit(XusbButton::DpadLeft),
        bit(XusbButton::DpadDown) - bit(XusbButton::DpadUp),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stick_scaling_and_clamping() {
        assert_eq!(stick_to_abs(0.0), 0);
        assert_eq!(stick_to_abs(1.0), 32767);
        assert_eq!(stick_to_abs(-1.0), -32767);
        assert_eq!(stick_to_abs(0.5), 16384);
        assert_eq!(stick_to_abs(3.0), 32767);
    }

    #[test]
    fn test_trigger_scaling() {
        assert_eq!(trigger_to_abs(0.0), 0);
        assert_eq!(trigger_to_abs(1.0), 255);
        assert_eq!(trigger_to_abs(-0.5), 0);
    }

    #[test]
    fn test_hat_from_dpad_bits() {
        let mut buttons = ButtonSet::empty();
        assert_eq!(hat_values(buttons), (0, 0));

        buttons.insert(XusbButton::DpadUp);
        buttons.insert(XusbButton::DpadRight);
        assert_eq!(hat_values(buttons), (1, -1));

        buttons.insert(XusbButton::DpadLeft);
        assert_eq!(hat_values(buttons), (0, -1));
    }

    #[test]
    fn test_report_events_invert_stick_y_and_map_face_buttons() {
        let mut report = GamepadReport {
            left_stick: (0.0, 1.0),
            ..GamepadReport::default()
        };
        report.set_button(XusbButton::A, true);

        let events = report_events(&report);

        let abs_y = events
            .iter()
            .find(|e| e.event_type() == EventType::ABSOLUTE && e.code() == AbsoluteAxisCode::ABS_Y.0)
            .unwrap();
        assert_eq!(abs_y.value(), -32767);
        let south = events
            .iter()
            .find(|e| e.event_type() == EventType::KEY && e.code() == KeyCode::BTN_SOUTH.0)
            .unwrap();
        assert_eq!(south.value(), 1);
        assert_eq!(events.len(), 8 + KEY_BUTTONS.len());
    }
}
