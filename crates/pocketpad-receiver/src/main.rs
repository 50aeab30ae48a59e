//! PocketPad receiver entry point.
//!
//! Wires together the relay channel, the gamepad backend, and the event
//! translator, then runs the Tokio event loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config() + CLI overrides
//!  └─ open_backend()              -- fatal if the device subsystem is missing
//!  └─ preinitialize players       -- controller #1 is plugged in up front
//!  └─ RelayChannel::start()       -- WebSocket reconnect loop (spawned task)
//!  └─ dispatch loop               -- one RelayEvent at a time, FIFO
//!       ├─ controller-input     -> EventTranslator::apply
//!       ├─ player-disconnected  -> EventTranslator::reset_player
//!       └─ player-ping          -> PLAYER_PING status line
//! ```
//!
//! stdout carries only `PLAYER_*` status lines; logs go to stderr.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pocketpad_receiver::application::{
    device_registry::DeviceSessionRegistry, handle_relay::HandleRelayUseCase,
    translate_event::EventTranslator,
};
use pocketpad_receiver::infrastructure::{
    config::{load_config, BackendKind, ReceiverConfig},
    gamepad::open_backend,
    relay::RelayChannel,
    status::StdoutStatusReporter,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// PocketPad receiver.
///
/// Connects to the PocketPad relay and drives one virtual gamepad per phone.
/// Flags override the config file; every flag also reads an environment
/// variable.
#[derive(Debug, Parser)]
#[command(
    name = "pocketpad-receiver",
    about = "Turns relayed phone input into virtual gamepads",
    version
)]
struct Cli {
    /// Path to a TOML config file.
    ///
    /// Defaults to `pocketpad/receiver.toml` in the platform config
    /// directory; a missing default file is not an error.
    #[arg(long, env = "POCKETPAD_CONFIG")]
    config: Option<PathBuf>,

    /// Relay base URL, e.g. `http://192.168.1.20:3000`.
    #[arg(long, env = "POCKETPAD_RELAY_URL")]
    relay_url: Option<String>,

    /// Virtual gamepad backend.
    #[arg(long, value_enum, env = "POCKETPAD_BACKEND")]
    backend: Option<BackendKind>,

    /// Seconds to wait between relay connection attempts.
    #[arg(long, env = "POCKETPAD_RECONNECT_INTERVAL")]
    reconnect_interval: Option<u64>,

    /// Highest accepted player id.
    #[arg(long, env = "POCKETPAD_MAX_PLAYERS")]
    max_players: Option<u32>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "POCKETPAD_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Applies the flags that were given on top of `config`.
    fn apply_to(&self, mut config: ReceiverConfig) -> ReceiverConfig {
        if let Some(url) = &self.relay_url {
            config.relay.url = url.clone();
        }
        if let Some(backend) = self.backend {
            config.device.backend = backend;
        }
        if let Some(secs) = self.reconnect_interval {
            config.relay.reconnect_interval_secs = secs;
        }
        if let Some(max) = self.max_players {
            config.players.max_players = max;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        config
    }

    /// Loads the config file and layers the flags over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// combined settings are invalid.
    fn into_config(self) -> anyhow::Result<ReceiverConfig> {
        let file = load_config(self.config.as_deref()).context("failed to load configuration")?;
        let config = self.apply_to(file);
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.into_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "PocketPad receiver starting (relay={}, backend={:?}, players=1..={})",
        config.relay.url, config.device.backend, config.players.max_players
    );

    // ── Gamepad backend ───────────────────────────────────────────────────────
    let backend = open_backend(config.device.backend)
        .context("virtual gamepad backend could not be initialised")?;

    let status = Arc::new(StdoutStatusReporter::stdout());
    let mut translator = EventTranslator::new(
        DeviceSessionRegistry::new(backend),
        status,
        config.players.max_players,
    );

    for player in config.preinitialized_players() {
        match translator.preinitialize(player) {
            Ok(handle) => info!("controller {handle} ready for player {player}"),
            Err(e) => warn!("could not pre-create controller: {e}"),
        }
    }

    let mut dispatcher = HandleRelayUseCase::new(translator);

    // ── Relay connection ──────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let channel = Arc::new(RelayChannel::new(config.relay_channel_config()));
    let mut relay_rx = Arc::clone(&channel)
        .start(Arc::clone(&running))
        .await
        .context("relay channel could not be started")?;

    // ── Main dispatch loop ────────────────────────────────────────────────────
    info!("receiver ready; waiting for relay events");

    loop {
        tokio::select! {
            event = relay_rx.recv() => match event {
                Some(event) => dispatcher.handle(event),
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("received Ctrl+C; shutting down"),
                    Err(e) => warn!("failed to listen for Ctrl+C: {e}; shutting down"),
                }
                break;
            }
        }
    }

    running.store(false, Ordering::Relaxed);
    let stats = dispatcher.stats();
    info!(
        "PocketPad receiver stopped ({} inputs applied, {} ignored, {} dropped)",
        stats.applied, stats.ignored, stats.dropped
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
