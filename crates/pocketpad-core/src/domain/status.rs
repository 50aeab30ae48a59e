//! Status lines printed for the desktop launcher.
//!
//! The launcher reads the receiver's standard output line by line and looks
//! for three labels.  The format is fixed; the launcher splits on `:` and then
//! on whitespace:
//!
//! ```text
//! PLAYER_CONNECTED: 2
//! PLAYER_DISCONNECTED: 2
//! PLAYER_PING: 2 37ms
//! ```
//!
//! [`StatusLine`]'s `Display` impl is the only place these strings are
//! produced, and its `FromStr` impl is the matching parser.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::player::PlayerId;

const CONNECTED_LABEL: &str = "PLAYER_CONNECTED";
const DISCONNECTED_LABEL: &str = "PLAYER_DISCONNECTED";
const PING_LABEL: &str = "PLAYER_PING";

/// One status notification for the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    PlayerConnected(PlayerId),
    PlayerDisconnected(PlayerId),
    PlayerPing { player: PlayerId, latency_ms: u64 },
}

impl StatusLine {
    /// The player this line is about.
    pub fn player(&self) -> PlayerId {
        match *self {
            Self::PlayerConnected(p) | Self::PlayerDisconnected(p) => p,
            Self::PlayerPing { player, .. } => player,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerConnected(p) => write!(f, "{CONNECTED_LABEL}: {p}"),
            Self::PlayerDisconnected(p) => write!(f, "{DISCONNECTED_LABEL}: {p}"),
            Self::PlayerPing { player, latency_ms } => {
                write!(f, "{PING_LABEL}: {player} {latency_ms}ms")
            }
        }
    }
}

/// Error returned when a line is not a recognised status line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusParseError {
    #[error("line has no status label")]
    MissingLabel,
    #[error("unknown status label: {0}")]
    UnknownLabel(String),
    #[error("invalid player id: {0:?}")]
    InvalidPlayer(String),
    #[error("invalid latency: {0:?}")]
    InvalidLatency(String),
}

impl FromStr for StatusLine {
    type Err = StatusParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (label, rest) = line
            .trim_end()
            .split_once(':')
            .ok_or(StatusParseError::MissingLabel)?;
        if ![CONNECTED_LABEL, DISCONNECTED_LABEL, PING_LABEL].contains(&label) {
            return Err(StatusParseError::UnknownLabel(label.to_string()));
        }

        let mut fields = rest.split_whitespace();
        let player_field = fields.next().unwrap_or_default();
        let player = player_field
            .parse::<u32>()
            .map(PlayerId::new)
            .map_err(|_| StatusParseError::InvalidPlayer(player_field.to_string()))?;

        match label {
            CONNECTED_LABEL => Ok(Self::PlayerConnected(player)),
            DISCONNECTED_LABEL => Ok(Self::PlayerDisconnected(player)),
            PING_LABEL => {
                let raw = fields.next().unwrap_or_default();
                let latency_ms = raw
                    .strip_suffix("ms")
                    .and_then(|n| n.parse::<u64>().ok())
                    .ok_or_else(|| StatusParseError::InvalidLatency(raw.to_string()))?;
                Ok(Self::PlayerPing { player, latency_ms })
            }
            other => Err(StatusParseError::UnknownLabel(other.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
