//! Status-line output for the desktop launcher.
//!
//! The launcher reads the receiver's stdout line by line and looks for
//! `PLAYER_*` lines.  Nothing else is ever written to stdout; logs go to
//! stderr.

use std::io::{self, Write};
use std::sync::Mutex;

use pocketpad_core::StatusLine;
use tracing::warn;

use crate::application::translate_event::StatusReporter;

/// Writes each status line to a sink and flushes it immediately.
pub struct LineStatusReporter<W: Write + Send> {
    out: Mutex<W>,
}

/// The reporter used by the binary.
pub type StdoutStatusReporter = LineStatusReporter<io::Stdout>;

impl StdoutStatusReporter {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> LineStatusReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the sink, consuming the reporter.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> StatusReporter for LineStatusReporter<W> {
    fn report(&self, line: StatusLine) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!("could not write status line `{line}`: {e}");
        }
    }
}
