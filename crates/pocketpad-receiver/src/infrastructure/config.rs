//! TOML-based configuration for the receiver.
//!
//! Settings are read from an optional file:
//! - Windows:  `%APPDATA%\PocketPad\receiver.toml`
//! - Linux:    `~/.config/pocketpad/receiver.toml`
//! - macOS:    `~/Library/Application Support/PocketPad/receiver.toml`
//!
//! or from an explicit `--config <path>`.  Command-line flags and
//! `POCKETPAD_*` environment variables override the file (see `main.rs`).
//!
//! ```toml
//! [relay]
//! url = "http://192.168.1.20:3000"
//! reconnect_interval_secs = 3
//!
//! [players]
//! max_players = 4
//! preinitialize = [1]
//!
//! [device]
//! backend = "uinput"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so an empty or partial file is valid and
//! a missing file at the default location means "all defaults".

use std::path::{Path, PathBuf};
use std::time::Duration;

use pocketpad_core::PlayerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::relay::RelayChannelConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but makes no sense.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level receiver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReceiverConfig {
    #[serde(default)]
    pub relay: RelaySettings,
    #[serde(default)]
    pub players: PlayerSettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the relay lives and how to stay connected to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelaySettings {
    /// Relay base URL (`http`, `https`, `ws` or `wss`).
    #[serde(default = "default_relay_url")]
    pub url: String,
    /// Pause between connection attempts.
    #[serde(default = "default_reconnect_interval_secs")]
    pub reconnect_interval_secs: u64,
    /// Upper bound on one WebSocket connect attempt.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Player slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSettings {
    /// Highest accepted player id.  Ids start at 1.
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    /// Players whose controller is plugged in at startup.
    #[serde(default = "default_preinitialize")]
    pub preinitialize: Vec<u32>,
}

/// Which virtual gamepad driver to use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSettings {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
}

/// Available gamepad backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Linux kernel uinput devices.
    Uinput,
    /// No OS devices; reports are only logged.
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_relay_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_reconnect_interval_secs() -> u64 {
    3
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_max_players() -> u32 {
    4
}
fn default_preinitialize() -> Vec<u32> {
    vec![1]
}
fn default_backend() -> BackendKind {
    if cfg!(target_os = "linux") {
        BackendKind::Uinput
    } else {
        BackendKind::Mock
    }
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            url: default_relay_url(),
            reconnect_interval_secs: default_reconnect_interval_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            max_players: default_max_players(),
            preinitialize: default_preinitialize(),
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ReceiverConfig {
    /// Rejects values the receiver cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "relay.url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.relay.reconnect_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "relay.reconnect_interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.players.max_players == 0 {
            return Err(ConfigError::Invalid {
                field: "players.max_players",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(bad) = self
            .players
            .preinitialize
            .iter()
            .find(|id| !PlayerId::new(**id).is_within(self.players.max_players))
        {
            return Err(ConfigError::Invalid {
                field: "players.preinitialize",
                reason: format!("player {bad} is outside 1..={}", self.players.max_players),
            });
        }
        Ok(())
    }

    /// Relay channel settings derived from this config.
    pub fn relay_channel_config(&self) -> RelayChannelConfig {
        RelayChannelConfig {
            relay_url: self.relay.url.clone(),
            reconnect_interval: Duration::from_secs(self.relay.reconnect_interval_secs),
            connect_timeout: Duration::from_secs(self.relay.connect_timeout_secs),
            ..RelayChannelConfig::default()
        }
    }

    /// Players to create controllers for at startup.
    pub fn preinitialized_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.preinitialize.iter().copied().map(PlayerId::new)
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("receiver.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration.
///
/// With `Some(path)` the file must exist.  With `None` the default location
/// is tried and a missing file yields [`ReceiverConfig::default`].
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors, [`ConfigError::Parse`]
/// if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<ReceiverConfig, ConfigError> {
    match path {
        Some(path) => read_config(path),
        None => {
            let path = match config_file_path() {
                Ok(path) => path,
                Err(ConfigError::NoPlatformConfigDir) => return Ok(ReceiverConfig::default()),
                Err(e) => return Err(e),
            };
            match read_config(&path) {
                Err(ConfigError::Io { source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    Ok(ReceiverConfig::default())
                }
                other => other,
            }
        }
    }
}

fn read_config(path: &Path) -> Result<ReceiverConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Resolves the platform config base directory including the `pocketpad`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("PocketPad"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("pocketpad"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("PocketPad")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
