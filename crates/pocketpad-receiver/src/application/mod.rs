//! Application layer use cases for the receiver.
//!
//! # What use cases does the receiver have?
//!
//! - **`device_registry`** – Owns one virtual controller per player.  Devices
//!   are created lazily on a player's first event and are never unplugged,
//!   so reconnecting phones land on the same controller.  The OS driver is
//!   injected as a `GamepadBackend` implementation.
//!
//! - **`translate_event`** – Merges each decoded `controller-input` event into
//!   the player's input state and commits one full report to the device.
//!
//! - **`handle_relay`** – Consumes everything the relay channel produces
//!   (connection changes, inputs, player disconnects, latency samples) in
//!   arrival order and never lets an error escape.

pub mod device_registry;
pub mod handle_relay;
pub mod translate_event;
