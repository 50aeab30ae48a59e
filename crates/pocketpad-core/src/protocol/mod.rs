//! Protocol module: the Engine.IO/Socket.IO text codec and relay payloads.

pub mod engineio;
pub mod messages;

pub use engineio::{decode_packet, EnginePacket, OpenHandshake, ProtocolError, SocketPacket};
pub use messages::{decode_controller_input, DecodeError, InputEvent, InputKind, RelayMessage};
