//! Domain types with no I/O: players, buttons, stick state, status lines.

pub mod buttons;
pub mod input_state;
pub mod player;
pub mod status;

pub use buttons::{ButtonName, ButtonSet, TriggerSide, XusbButton};
pub use input_state::{Axis, InputState};
pub use player::PlayerId;
pub use status::{StatusLine, StatusParseError};
