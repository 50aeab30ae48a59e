//! Player identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one browser controller session.
///
/// Player ids are small positive integers (the web client offers slots 1–4)
/// and are the key for every piece of per-player state on the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Player used when a sender omits the `player` field.
    pub const DEFAULT: PlayerId = PlayerId(1);

    /// Wraps a raw player number.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw player number.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns `true` if the id falls in `1..=max_players`.
    pub fn is_within(self, max_players: u32) -> bool {
        (1..=max_players).contains(&self.0)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlayerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
