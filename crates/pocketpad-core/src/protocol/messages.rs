//! Relay event payloads and their decoding into typed input events.
//!
//! The browser emits `controller-input` with a loosely typed JSON object and
//! the relay rebroadcasts it untouched:
//!
//! ```json
//! {"player": 1, "type": "AXIS",   "axis": "LX",   "value": 0.5}
//! {"player": 2, "type": "BUTTON", "button": "A",  "value": 1}
//! {"player": 2, "type": "BUTTON", "button": "XUSB_GAMEPAD_LEFT_TRIGGER", "value": 0.8}
//! ```
//!
//! # Decoding policy
//!
//! Three outcomes are kept apart because the receiver treats them differently:
//!
//! - **Valid** → [`InputKind::Axis`], [`InputKind::Button`], [`InputKind::Trigger`].
//! - **Unrecognised symbol** (unknown `type`, `axis`, or `button` name) →
//!   [`InputKind::Unrecognized`].  Not an error; newer senders may use names
//!   this receiver does not know yet.
//! - **Malformed** (missing required field, non-numeric or out-of-range value,
//!   bad player id) → [`DecodeError`].  Logged and dropped by the caller.
//!
//! Numbers may arrive as JSON numbers or numeric strings, and `player` falls
//! back to 1 when absent.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::buttons::{ButtonName, TriggerSide, XusbButton};
use crate::domain::input_state::Axis;
use crate::domain::player::PlayerId;

/// Socket.IO event name carrying controller input.
pub const CONTROLLER_INPUT_EVENT: &str = "controller-input";
/// Optional relay event announcing that a player's browser went away.
pub const PLAYER_DISCONNECTED_EVENT: &str = "player-disconnected";
/// Optional relay event reporting a player's round-trip latency.
pub const PLAYER_PING_EVENT: &str = "player-ping";

/// Why a relay payload was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("`{field}` value {value} outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("event `{0}` carried no payload")]
    MissingPayload(String),
}

/// A decoded controller input for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub player: PlayerId,
    pub kind: InputKind,
}

/// What the input does.
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    /// One stick axis moved; `value` is in `[-1.0, 1.0]`.
    Axis { axis: Axis, value: f32 },
    /// A digital button edge.
    Button { button: XusbButton, pressed: bool },
    /// An analog trigger; `magnitude` is in `[0.0, 1.0]`.
    Trigger { side: TriggerSide, magnitude: f32 },
    /// A kind, axis, or button this receiver does not know.
    Unrecognized(Unrecognized),
}

/// The symbol that made an input unrecognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unrecognized {
    Kind(String),
    Axis(String),
    Button(String),
}

/// A relay event the receiver acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    ControllerInput(InputEvent),
    PlayerDisconnected(PlayerId),
    PlayerPing { player: PlayerId, latency_ms: u64 },
    /// Any other event name; ignored.
    Other(String),
}

impl RelayMessage {
    /// Decodes a Socket.IO event by name and argument list.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when a known event carries a malformed payload.
    pub fn from_event(name: &str, args: &[Value]) -> Result<Self, DecodeError> {
        let payload = || args.first().ok_or_else(|| DecodeError::MissingPayload(name.to_string()));
        match name {
            CONTROLLER_INPUT_EVENT => decode_controller_input(payload()?).map(Self::ControllerInput),
            PLAYER_DISCONNECTED_EVENT => {
                let value = payload()?;
                let raw = match value {
                    Value::Object(map) => map.get("player").ok_or(DecodeError::MissingField("player"))?,
                    other => other,
                };
                parse_player(raw).map(Self::PlayerDisconnected)
            }
            PLAYER_PING_EVENT => {
                let value = payload()?;
                let map = value.as_object().ok_or(DecodeError::NotAnObject)?;
                let player = parse_player(map.get("player").ok_or(DecodeError::MissingField("player"))?)?;
                let latency = map.get("latency").ok_or(DecodeError::MissingField("latency"))?;
                let latency = number(latency, "latency")?;
                if !latency.is_finite() || latency < 0.0 {
                    return Err(DecodeError::InvalidField {
                        field: "latency",
                        reason: format!("{latency} is not a non-negative duration"),
                    });
                }
                Ok(Self::PlayerPing {
                    player,
                    latency_ms: latency.round() as u64,
                })
            }
            other => Ok(Self::Other(other.to_string())),
        }
    }
}

/// Loose wire shape of a `controller-input` payload.
#[derive(Debug, Deserialize)]
struct ControllerInputWire {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    axis: Option<String>,
    #[serde(default)]
    button: Option<String>,
    #[serde(default)]
    value: Option<Value>,
}

/// Decodes one `controller-input` payload.
///
/// # Errors
///
/// Returns [`DecodeError`] for malformed payloads.  Unknown symbols are not
/// errors; they decode to [`InputKind::Unrecognized`].
pub fn decode_controller_input(payload: &Value) -> Result<InputEvent, DecodeError> {
    if !payload.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    let wire: ControllerInputWire =
        serde_json::from_value(payload.clone()).map_err(|e| DecodeError::InvalidField {
            field: "payload",
            reason: e.to_string(),
        })?;

    // Only an absent `player` defaults; an explicit `null` is malformed.
    let player = match payload.get("player") {
        None => PlayerId::DEFAULT,
        Some(raw) => parse_player(raw)?,
    };
    let kind_name = wire.kind.ok_or(DecodeError::MissingField("type"))?;

    let kind = match kind_name.as_str() {
        "AXIS" => {
            let axis_name = wire.axis.ok_or(DecodeError::MissingField("axis"))?;
            match Axis::from_wire(&axis_name) {
                Some(axis) => {
                    // A missing value means centred.
                    let value = match wire.value {
                        None | Some(Value::Null) => 0.0,
                        Some(ref raw) => number(raw, "value")?,
                    };
                    let value = bounded(value, "value", -1.0, 1.0)?;
                    InputKind::Axis { axis, value }
                }
                None => InputKind::Unrecognized(Unrecognized::Axis(axis_name)),
            }
        }
        "BUTTON" => {
            let button_name = wire.button.ok_or(DecodeError::MissingField("button"))?;
            match ButtonName::from_wire(&button_name) {
                Some(ButtonName::Digital(button)) => {
                    let raw = wire.value.ok_or(DecodeError::MissingField("value"))?;
                    InputKind::Button {
                        button,
                        pressed: pressed_flag(&raw)?,
                    }
                }
                Some(ButtonName::Trigger(side)) => {
                    let raw = wire.value.ok_or(DecodeError::MissingField("value"))?;
                    let magnitude = bounded(number(&raw, "value")?, "value", 0.0, 1.0)?;
                    InputKind::Trigger { side, magnitude }
                }
                None => InputKind::Unrecognized(Unrecognized::Button(button_name)),
            }
        }
        _ => InputKind::Unrecognized(Unrecognized::Kind(kind_name)),
    };

    Ok(InputEvent { player, kind })
}

// ── Field helpers ─────────────────────────────────────────────────────────────

fn parse_player(raw: &Value) -> Result<PlayerId, DecodeError> {
    let invalid = |reason: &str| DecodeError::InvalidField {
        field: "player",
        reason: reason.to_string(),
    };
    match raw {
        Value::Number(n) => {
            if let Some(id) = n.as_u64() {
                u32::try_from(id)
                    .map(PlayerId::new)
                    .map_err(|_| invalid("player id too large"))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => {
                        Ok(PlayerId::new(f as u32))
                    }
                    _ => Err(invalid("not a non-negative integer")),
                }
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map(PlayerId::new)
            .map_err(|_| invalid("not a non-negative integer")),
        _ => Err(invalid("not a number")),
    }
}

/// Reads a number that may be encoded as a JSON number or numeric string.
fn number(raw: &Value, field: &'static str) -> Result<f64, DecodeError> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.ok_or_else(|| DecodeError::InvalidField {
        field,
        reason: format!("{raw} is not a number"),
    })
}

fn bounded(value: f64, field: &'static str, min: f64, max: f64) -> Result<f32, DecodeError> {
    if !value.is_finite() || value < min || value > max {
        return Err(DecodeError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value as f32)
}

fn pressed_flag(raw: &Value) -> Result<bool, DecodeError> {
    let value = number(raw, "value")?;
    if value == 1.0 {
        Ok(true)
    } else if value == 0.0 {
        Ok(false)
    } else {
        Err(DecodeError::InvalidField {
            field: "value",
            reason: format!("button value must be 0 or 1, got {value}"),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
