//! Text codec for the Engine.IO v4 WebSocket transport and the Socket.IO v4
//! packets carried inside it.
//!
//! The relay server is a Socket.IO server.  Rather than pulling in a full
//! Socket.IO client, the receiver speaks the handful of packets it needs
//! directly over a WebSocket.
//!
//! # Framing (for beginners)
//!
//! Every WebSocket text frame is one *Engine.IO packet*.  Its first character
//! is the packet type; the rest is the payload:
//!
//! ```text
//! 0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}
//! 2                      ← server ping, answer with "3"
//! 40                     ← message(4) carrying Socket.IO CONNECT(0)
//! 42["controller-input",{"player":1,"type":"AXIS","axis":"LX","value":0.5}]
//! ```
//!
//! A *message* packet (`4`) wraps a *Socket.IO packet*, which has its own
//! type digit, an optional `/namespace,` prefix, an optional numeric ack id,
//! and a JSON body.
//!
//! # Handshake
//!
//! 1. Server sends `0{...}` (open) with its ping timings.
//! 2. Client sends `40` to join the default namespace.
//! 3. Server answers `40{"sid":...}` (or `44{...}` on refusal).
//! 4. Server sends `2` every `pingInterval`; the client answers `3`.  If no
//!    ping arrives within `pingInterval + pingTimeout` the link is dead.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Engine.IO protocol revision spoken by the receiver.
pub const ENGINE_IO_VERSION: u8 = 4;

/// Default Socket.IO mount path on the relay.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// Errors produced while decoding packets or building the relay URL.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame was empty.
    #[error("empty packet")]
    Empty,

    /// The leading Engine.IO type character is not defined.
    #[error("unknown engine.io packet type: {0:?}")]
    UnknownEnginePacket(char),

    /// The Socket.IO type character inside a message packet is not defined.
    #[error("unknown socket.io packet type: {0:?}")]
    UnknownSocketPacket(char),

    /// A JSON body could not be parsed.
    #[error("malformed JSON body: {0}")]
    MalformedJson(String),

    /// An event packet did not carry `[name, ...args]`.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// The configured relay address cannot be turned into a WebSocket URL.
    #[error("invalid relay url {0:?}")]
    InvalidUrl(String),
}

/// Parameters from the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
    #[serde(default = "default_max_payload")]
    pub max_payload: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}
fn default_ping_timeout() -> u64 {
    20_000
}
fn default_max_payload() -> u64 {
    1_000_000
}

impl OpenHandshake {
    /// Longest silence tolerated before the connection is considered lost.
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// A decoded Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    /// Server ping with its (usually empty) probe payload.
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// A decoded Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    ConnectError(Value),
    /// Ack and binary packets, which the receiver never needs.
    Unsupported(char),
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decodes one WebSocket text frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] for empty frames, unknown type characters, and
/// JSON bodies that do not parse.
///
/// # Examples
///
/// ```rust
/// use pocketpad_core::protocol::engineio::{decode_packet, EnginePacket};
///
/// assert_eq!(decode_packet("2").unwrap(), EnginePacket::Ping(String::new()));
/// ```
pub fn decode_packet(text: &str) -> Result<EnginePacket, ProtocolError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    let body = chars.as_str();

    match kind {
        '0' => {
            let handshake: OpenHandshake = serde_json::from_str(body)
                .map_err(|e| ProtocolError::MalformedJson(e.to_string()))?;
            Ok(EnginePacket::Open(handshake))
        }
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(body.to_string())),
        '3' => Ok(EnginePacket::Pong(body.to_string())),
        '4' => decode_socket_packet(body).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(ProtocolError::UnknownEnginePacket(other)),
    }
}

fn decode_socket_packet(text: &str) -> Result<SocketPacket, ProtocolError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    let rest = chars.as_str();

    let (namespace, rest) = split_namespace(rest);
    let (ack_id, body) = split_ack_id(rest);

    match kind {
        '0' => {
            if body.is_empty() {
                Ok(SocketPacket::Connect(None))
            } else {
                parse_json(body).map(|v| SocketPacket::Connect(Some(v)))
            }
        }
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let value = parse_json(body)?;
            let Value::Array(mut items) = value else {
                return Err(ProtocolError::MalformedEvent(
                    "event body is not an array".to_string(),
                ));
            };
            if items.is_empty() {
                return Err(ProtocolError::MalformedEvent("event array is empty".to_string()));
            }
            let Value::String(name) = items.remove(0) else {
                return Err(ProtocolError::MalformedEvent(
                    "event name is not a string".to_string(),
                ));
            };
            Ok(SocketPacket::Event {
                namespace,
                ack_id,
                name,
                args: items,
            })
        }
        '4' => parse_json(body).map(SocketPacket::ConnectError),
        '3' | '5' | '6' => Ok(SocketPacket::Unsupported(kind)),
        other => Err(ProtocolError::UnknownSocketPacket(other)),
    }
}

/// Splits a leading `/namespace,` off the packet.  The default namespace is
/// reported as `"/"`.
fn split_namespace(text: &str) -> (String, &str) {
    if text.starts_with('/') {
        match text.split_once(',') {
            Some((ns, rest)) => (ns.to_string(), rest),
            None => (text.to_string(), ""),
        }
    } else {
        ("/".to_string(), text)
    }
}

fn split_ack_id(text: &str) -> (Option<u64>, &str) {
    let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return (None, text);
    }
    (text[..digits].parse().ok(), &text[digits..])
}

fn parse_json(body: &str) -> Result<Value, ProtocolError> {
    serde_json::from_str(body).map_err(|e| ProtocolError::MalformedJson(e.to_string()))
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Socket.IO CONNECT to the default namespace, wrapped in an Engine.IO message.
pub fn encode_connect() -> String {
    "40".to_string()
}

/// Engine.IO pong echoing the ping payload.
pub fn encode_pong(payload: &str) -> String {
    format!("3{payload}")
}

/// Socket.IO EVENT on the default namespace.
pub fn encode_event(name: &str, args: &[Value]) -> String {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Value::String(name.to_string()));
    items.extend(args.iter().cloned());
    format!("42{}", Value::Array(items))
}

// ── Relay URL ─────────────────────────────────────────────────────────────────

/// Turns the configured relay address into the Engine.IO WebSocket endpoint.
///
/// | Configured                    | Endpoint                                                 |
/// |-------------------------------|----------------------------------------------------------|
/// | `http://localhost:3000`       | `ws://localhost:3000/socket.io/?EIO=4&transport=websocket`  |
/// | `https://relay.lan`           | `wss://relay.lan/socket.io/?EIO=4&transport=websocket`      |
/// | `localhost:3000`              | `ws://localhost:3000/socket.io/?EIO=4&transport=websocket`  |
/// | `ws://h:1/custom/?EIO=4&...`  | unchanged                                                |
/// | `http://h:1?token=x`          | `ws://h:1/socket.io/?token=x&EIO=4&transport=websocket`  |
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidUrl`] for unsupported schemes or an empty
/// host.
pub fn relay_socket_url(base: &str) -> Result<String, ProtocolError> {
    let base = base.trim();
    let (scheme, rest) = match base.split_once("://") {
        Some(("http", rest)) | Some(("ws", rest)) => ("ws", rest),
        Some(("https", rest)) | Some(("wss", rest)) => ("wss", rest),
        Some(_) => return Err(ProtocolError::InvalidUrl(base.to_string())),
        None => ("ws", base),
    };

    let (authority, remainder) = match rest.find(['/', '?', '#']) {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    if authority.is_empty() {
        return Err(ProtocolError::InvalidUrl(base.to_string()));
    }

    // Fragments never reach the server.
    let remainder = remainder.split_once('#').map_or(remainder, |(head, _)| head);
    let (path, query) = match remainder.split_once('?') {
        Some((path, query)) => (path, query),
        None => (remainder, ""),
    };

    let path = if path.is_empty() || path == "/" {
        SOCKET_IO_PATH
    } else {
        path
    };

    let engine_params = format!("EIO={ENGINE_IO_VERSION}&transport=websocket");
    let query = if query.is_empty() {
        engine_params
    } else if query.split('&').any(|pair| pair.starts_with("EIO=")) {
        query.to_string()
    } else {
        format!("{query}&{engine_params}")
    };

    Ok(format!("{scheme}://{authority}{path}?{query}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
