//! # pocketpad-core
//!
//! Shared library for the PocketPad receiver containing the relay wire
//! protocol, the fixed button table, and per-player input state.
//!
//! It has no dependencies on OS device APIs or network sockets, so everything
//! here can be tested with plain `#[test]` functions.
//!
//! # Architecture overview (for beginners)
//!
//! PocketPad turns phones into game controllers.  A phone browser sends
//! input to a relay server, the relay rebroadcasts it, and the desktop
//! receiver turns it into virtual gamepad state.  This crate defines:
//!
//! - **`protocol`** – How relay traffic is framed (Engine.IO / Socket.IO text
//!   packets) and how a `controller-input` payload becomes a typed
//!   [`InputEvent`].
//!
//! - **`domain`** – Player identity, the symbolic-name → XUSB button table,
//!   the per-player stick/button state that single-axis updates are merged
//!   into, and the `PLAYER_*` status lines read by the desktop launcher.

pub mod domain;
pub mod protocol;

pub use domain::{
    Axis, ButtonName, ButtonSet, InputState, PlayerId, StatusLine, TriggerSide, XusbButton,
};
pub use protocol::engineio::{decode_packet, relay_socket_url, EnginePacket, ProtocolError};
pub use protocol::messages::{
    decode_controller_input, DecodeError, InputEvent, InputKind, RelayMessage, Unrecognized,
};
