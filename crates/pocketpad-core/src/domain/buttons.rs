//! Fixed button table: wire symbol → XUSB button code.
//!
//! The phone client sends buttons by symbolic name (`"A"`, `"DPAD_UP"`,
//! `"LB"`, ...).  Those names are resolved once, here, against a closed
//! enumeration.  Anything not in the table resolves to `None` and the caller
//! ignores the event, which keeps newer senders working against an older
//! receiver.
//!
//! # XUSB codes
//!
//! The numeric codes are the `XUSB_GAMEPAD_*` bit values used by XInput and
//! by virtual Xbox 360 drivers.  A full button state is a 16-bit mask of these
//! values, represented by [`ButtonSet`].
//!
//! | Wire name                    | Resolves to                        |
//! |------------------------------|------------------------------------|
//! | `A` `B` `X` `Y`              | face buttons                       |
//! | `DPAD_UP` … `DPAD_RIGHT`     | d-pad directions                   |
//! | `START` `BACK` `GUIDE`       | menu buttons                       |
//! | `LB` `RB`                    | shoulder buttons                   |
//! | `XUSB_GAMEPAD_LEFT_TRIGGER`  | analog left trigger (not a bit)    |
//! | `XUSB_GAMEPAD_RIGHT_TRIGGER` | analog right trigger (not a bit)   |

/// A digital button on the emulated controller, valued by its XUSB bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum XusbButton {
    DpadUp = 0x0001,
    DpadDown = 0x0002,
    DpadLeft = 0x0004,
    DpadRight = 0x0008,
    Start = 0x0010,
    Back = 0x0020,
    LeftShoulder = 0x0100,
    RightShoulder = 0x0200,
    Guide = 0x0400,
    A = 0x1000,
    B = 0x2000,
    X = 0x4000,
    Y = 0x8000,
}

impl XusbButton {
    /// Every digital button the receiver can drive.
    pub const ALL: [XusbButton; 13] = [
        XusbButton::DpadUp,
        XusbButton::DpadDown,
        XusbButton::DpadLeft,
        XusbButton::DpadRight,
        XusbButton::Start,
        XusbButton::Back,
        XusbButton::LeftShoulder,
        XusbButton::RightShoulder,
        XusbButton::Guide,
        XusbButton::A,
        XusbButton::B,
        XusbButton::X,
        XusbButton::Y,
    ];

    /// Returns the XUSB bit for this button.
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// Which analog trigger a magnitude applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSide {
    Left,
    Right,
}

/// A resolved wire button name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonName {
    /// An on/off button with an XUSB bit.
    Digital(XusbButton),
    /// One of the two analog triggers, which carry a magnitude instead of a
    /// pressed flag.
    Trigger(TriggerSide),
}

impl ButtonName {
    /// Resolves a wire symbol.  Returns `None` for names outside the table.
    pub fn from_wire(name: &str) -> Option<Self> {
        let resolved = match name {
            "A" => Self::Digital(XusbButton::A),
            "B" => Self::Digital(XusbButton::B),
            "X" => Self::Digital(XusbButton::X),
            "Y" => Self::Digital(XusbButton::Y),
            "DPAD_UP" => Self::Digital(XusbButton::DpadUp),
            "DPAD_DOWN" => Self::Digital(XusbButton::DpadDown),
            "DPAD_LEFT" => Self::Digital(XusbButton::DpadLeft),
            "DPAD_RIGHT" => Self::Digital(XusbButton::DpadRight),
            "START" => Self::Digital(XusbButton::Start),
            "BACK" => Self::Digital(XusbButton::Back),
            "LB" => Self::Digital(XusbButton::LeftShoulder),
            "RB" => Self::Digital(XusbButton::RightShoulder),
            "GUIDE" => Self::Digital(XusbButton::Guide),
            "XUSB_GAMEPAD_LEFT_TRIGGER" => Self::Trigger(TriggerSide::Left),
            "XUSB_GAMEPAD_RIGHT_TRIGGER" => Self::Trigger(TriggerSide::Right),
            _ => return None,
        };
        Some(resolved)
    }
}

/// Bitmask of currently pressed digital buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonSet(u16);

impl ButtonSet {
    /// An empty set (nothing pressed).
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from raw XUSB bits.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw XUSB bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    pub fn insert(&mut self, button: XusbButton) {
        self.0 |= button.code();
    }

    pub fn remove(&mut self, button: XusbButton) {
        self.0 &= !button.code();
    }

    pub fn contains(self, button: XusbButton) -> bool {
        self.0 & button.code() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the pressed buttons in table order.
    pub fn iter(self) -> impl Iterator<Item = XusbButton> {
        XusbButton::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
