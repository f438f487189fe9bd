// src/console.rs

//! Output stream resolution.
//!
//! When a run is not given an explicit output stream it writes to stdout.
//! On Windows consoles without ANSICON, coloured output needs the console
//! switched to ANSI (virtual terminal) mode first. That adaptation is
//! best-effort: if it cannot be engaged, a warning goes to the error stream
//! and the run continues with plain stdout.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, warn};

/// A writable output stream owned by a run.
pub type Sink = Box<dyn Write + Send>;

pub const ADAPTER_UNAVAILABLE_WARNING: &str = "Color output on Windows requires a console with ANSI support or ANSICON; \
     neither was found, so this may get messy...";

#[derive(Debug, Error)]
#[error("console ANSI translation unavailable: {0}")]
pub struct AdapterUnavailable(pub String);

/// Something that can produce an ANSI-capable stdout.
pub trait ConsoleAdapter: Send + Sync {
    fn adapt(&self) -> Result<Sink, AdapterUnavailable>;
}

/// Production adapter: enables virtual terminal processing on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiConsole;

impl ConsoleAdapter for AnsiConsole {
    #[cfg(windows)]
    fn adapt(&self) -> Result<Sink, AdapterUnavailable> {
        if crossterm::ansi_support::supports_ansi() {
            Ok(Box::new(io::stdout()))
        } else {
            Err(AdapterUnavailable(
                "virtual terminal processing could not be enabled".to_string(),
            ))
        }
    }

    #[cfg(not(windows))]
    fn adapt(&self) -> Result<Sink, AdapterUnavailable> {
        Err(AdapterUnavailable(
            "console translation only exists on Windows".to_string(),
        ))
    }
}

/// The parts of the host environment that decide whether adaptation is
/// needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEnvironment {
    pub windows: bool,
    /// Whether the `ANSICON` variable is set.
    pub ansicon: bool,
}

impl HostEnvironment {
    pub fn detect() -> Self {
        Self {
            windows: cfg!(windows),
            ansicon: std::env::var_os("ANSICON").is_some(),
        }
    }

    pub fn needs_translation(&self, color: bool) -> bool {
        color && self.windows && !self.ansicon
    }
}

/// Pick the stream a run writes its output to.
///
/// An explicit `out` is always used as is.
pub fn resolve_output(
    out: Option<Sink>,
    color: bool,
    env: &HostEnvironment,
    adapter: &dyn ConsoleAdapter,
    err: &mut (dyn Write + Send),
) -> Sink {
    if let Some(out) = out {
        return out;
    }

    if env.needs_translation(color) {
        match adapter.adapt() {
            Ok(sink) => {
                debug!("using ANSI-translating console output");
                return sink;
            }
            Err(e) => {
                warn!(error = %e, "falling back to unadapted stdout");
                let _ = writeln!(err, "{ADAPTER_UNAVAILABLE_WARNING}");
            }
        }
    }

    Box::new(io::stdout())
}
