// src/interrupt.rs

//! Ctrl-C handling with escalation.
//!
//! The first interrupt sets the cancellation indicator and prints a notice;
//! the engine notices the flag and stops at the next opportunity. An
//! interrupt that arrives while the flag is still set terminates the process
//! on the spot with status 1, skipping every cleanup step. On unix that
//! includes stdio buffers and `atexit` handlers; elsewhere the abort goes
//! through `std::process::exit`, which still flushes stdout.
//!
//! The listener lives on its own thread with its own current-thread Tokio
//! runtime, so it keeps working across runs that build and drop their own
//! runtimes.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::state::{CancellationFlag, ProcessState};

pub const INTERRUPT_NOTICE: &str = "\nExiting... Interrupt again to exit immediately.";

/// Status used by the immediate abort.
pub const ABORT_EXIT_CODE: i32 = 1;

/// What the listener should do after an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Cancellation was requested; keep running.
    Notified,
    /// Cancellation was already pending; terminate now.
    Abort,
}

#[derive(Debug, Clone)]
pub struct InterruptTrap {
    cancellation: CancellationFlag,
}

impl InterruptTrap {
    pub fn new(cancellation: CancellationFlag) -> Self {
        Self { cancellation }
    }

    /// React to a single interrupt.
    ///
    /// Touches only the atomic flag and does one best-effort write.
    pub fn handle_interrupt(&self, err: &mut dyn Write) -> InterruptAction {
        if self.cancellation.request_again() {
            return InterruptAction::Abort;
        }
        let _ = writeln!(err, "{INTERRUPT_NOTICE}");
        let _ = err.flush();
        InterruptAction::Notified
    }

    /// Install the process-wide listener for `state`.
    ///
    /// Only the first call per state spawns a listener.
    pub fn install(state: &Arc<ProcessState>) -> Result<()> {
        if !state.mark_trap_installed() {
            return Ok(());
        }

        let trap = InterruptTrap::new(state.cancellation().clone());
        let spawned = thread::Builder::new()
            .name("specrun-interrupt".to_string())
            .spawn(move || trap.listen());

        if let Err(e) = spawned {
            state.clear_trap_installed();
            return Err(e.into());
        }

        debug!("interrupt trap installed");
        Ok(())
    }

    /// React to every interrupt received on `interrupts`.
    ///
    /// Returns the status the process must terminate with once an interrupt
    /// arrives while cancellation is still pending, or `None` when the
    /// interrupt source goes away.
    pub async fn watch(
        &self,
        interrupts: &mut mpsc::UnboundedReceiver<()>,
        err: &mut dyn Write,
    ) -> Option<i32> {
        while interrupts.recv().await.is_some() {
            match self.handle_interrupt(err) {
                InterruptAction::Notified => debug!("cancellation requested by interrupt"),
                InterruptAction::Abort => return Some(ABORT_EXIT_CODE),
            }
        }
        None
    }

    fn listen(self) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "could not start interrupt listener runtime");
                return;
            }
        };

        runtime.block_on(async move {
            let (tx, mut rx) = mpsc::unbounded_channel();
            tokio::spawn(forward_os_interrupts(tx));

            if let Some(code) = self.watch(&mut rx, &mut io::stderr()).await {
                hard_exit(code);
            }
        });
    }
}

/// Forward every Ctrl-C the process receives into `tx`.
#[cfg(unix)]
async fn forward_os_interrupts(tx: mpsc::UnboundedSender<()>) {
    use tokio::signal::unix::{SignalKind, signal};

    // One long-lived stream, so interrupts arriving back to back are not lost.
    let mut interrupts = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
    };
    while interrupts.recv().await.is_some() {
        if tx.send(()).is_err() {
            return;
        }
    }
}

#[cfg(not(unix))]
async fn forward_os_interrupts(tx: mpsc::UnboundedSender<()>) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        if tx.send(()).is_err() {
            return;
        }
    }
}

/// Terminate at once: no destructors, no stdio flushing, no `atexit`
/// handlers.
#[cfg(unix)]
fn hard_exit(code: i32) -> ! {
    // SAFETY: `_exit` ends the process immediately and touches no Rust state.
    unsafe { libc::_exit(code) }
}

#[cfg(not(unix))]
fn hard_exit(code: i32) -> ! {
    std::process::exit(code)
}
