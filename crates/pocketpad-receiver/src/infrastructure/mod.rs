//! Infrastructure layer: relay transport, gamepad drivers, config file, and
//! status output.
//!
//! # Sub-modules
//!
//! - **`relay`** – WebSocket connection to the relay (Engine.IO v4 transport)
//!   with a reconnect loop that never gives up.
//! - **`gamepad`** – `GamepadBackend` implementations: Linux uinput and an
//!   in-memory mock.
//! - **`config`** – TOML settings file with serde defaults.
//! - **`status`** – Writes `PLAYER_*` lines to stdout for the launcher.

pub mod config;
pub mod gamepad;
pub mod relay;
pub mod status;
