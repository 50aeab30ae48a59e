//! pocketpad-receiver library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the receiver do? (for beginners)
//!
//! PocketPad turns phones into game controllers.  Each phone opens a web page
//! served by the relay and sends its stick and button input over Socket.IO.
//! The relay rebroadcasts every input to all sockets, including this
//! receiver, which:
//!
//! 1. Connects to the relay and keeps reconnecting every few seconds while it
//!    is unreachable.
//! 2. Decodes each `controller-input` event into a typed `InputEvent`.
//! 3. Lazily plugs in one virtual gamepad per player and merges single-axis
//!    updates into that player's full stick state.
//! 4. Commits one complete report to the device per event.
//! 5. Prints `PLAYER_CONNECTED: <id>` style status lines on stdout for the
//!    desktop launcher.

/// Application layer: device sessions, event translation, relay dispatch.
pub mod application;

/// Infrastructure layer: relay socket, gamepad drivers, config, status output.
pub mod infrastructure;
