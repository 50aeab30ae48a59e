//! Per-player analog and digital input state.
//!
//! The phone sends one axis per message (`LX`, then `LY`, ...), but a virtual
//! gamepad accepts a full stick vector per write.  [`InputState`] remembers the
//! last value of every axis so that a single-axis update can be merged with
//! the other three before the sticks are pushed to the device.
//!
//! Triggers are deliberately absent: trigger magnitudes go straight to the
//! device and are never merged with anything.

use crate::domain::buttons::{ButtonSet, XusbButton};

/// One of the four stick axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl Axis {
    /// Resolves a wire axis name (`LX`, `LY`, `RX`, `RY`).
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "LX" => Some(Self::LeftX),
            "LY" => Some(Self::LeftY),
            "RX" => Some(Self::RightX),
            "RY" => Some(Self::RightY),
            _ => None,
        }
    }
}

/// Last-known stick values and pressed buttons for one player.
///
/// All axes default to `0.0` (centred) and no button is pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub buttons: ButtonSet,
}

impl InputState {
    /// Creates a neutral state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one axis, leaving the other three untouched.
    pub fn set_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftX => self.left_x = value,
            Axis::LeftY => self.left_y = value,
            Axis::RightX => self.right_x = value,
            Axis::RightY => self.right_y = value,
        }
    }

    /// Returns the stored value for `axis`.
    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::LeftX => self.left_x,
            Axis::LeftY => self.left_y,
            Axis::RightX => self.right_x,
            Axis::RightY => self.right_y,
        }
    }

    /// `(x, y)` of the left stick.
    pub fn left_stick(&self) -> (f32, f32) {
        (self.left_x, self.left_y)
    }

    /// `(x, y)` of the right stick.
    pub fn right_stick(&self) -> (f32, f32) {
        (self.right_x, self.right_y)
    }

    pub fn press(&mut self, button: XusbButton) {
        self.buttons.insert(button);
    }

    pub fn release(&mut self, button: XusbButton) {
        self.buttons.remove(button);
    }

    /// Returns every axis to centre and releases all buttons.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `true` when all axes are centred and nothing is pressed.
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
