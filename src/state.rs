// src/state.rs

//! Process-wide launcher state.
//!
//! Everything the launcher needs to remember for the lifetime of the process
//! lives in a single [`ProcessState`] that is passed explicitly through the
//! pipeline:
//!
//! - whether autorun has been disabled,
//! - whether the autorun hook has been installed,
//! - whether the interrupt trap has been installed,
//! - the cancellation indicator shared with the execution engine,
//! - the address this process is serving remote runs on, if any.
//!
//! The zero-argument entry points in the crate root use the lazily created
//! [`ProcessState::global`] instance.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

/// Cooperative cancellation indicator.
///
/// Set by the interrupt trap, polled by the execution engine and cleared by
/// the orchestrator at the end of every run. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    requested: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Set the flag and report whether it was already set.
    pub fn request_again(&self) -> bool {
        self.requested.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// Process-wide flags for one launcher process.
#[derive(Debug, Default)]
pub struct ProcessState {
    autorun_disabled: AtomicBool,
    autorun_installed: AtomicBool,
    trap_installed: AtomicBool,
    cancellation: CancellationFlag,
    serving_on: Mutex<Option<SocketAddr>>,
}

static GLOBAL: OnceLock<Arc<ProcessState>> = OnceLock::new();

impl ProcessState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The state backing `specrun::autorun()`, `specrun::run()` and the
    /// binary.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(ProcessState::new))
    }

    pub fn disable_autorun(&self) {
        self.autorun_disabled.store(true, Ordering::SeqCst);
    }

    pub fn autorun_disabled(&self) -> bool {
        self.autorun_disabled.load(Ordering::SeqCst)
    }

    pub fn autorun_installed(&self) -> bool {
        self.autorun_installed.load(Ordering::SeqCst)
    }

    /// Flip `autorun_installed` from false to true.
    ///
    /// Returns `false` if it was already set.
    pub(crate) fn mark_autorun_installed(&self) -> bool {
        self.autorun_installed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn trap_installed(&self) -> bool {
        self.trap_installed.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_trap_installed(&self) -> bool {
        self.trap_installed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn clear_trap_installed(&self) {
        self.trap_installed.store(false, Ordering::SeqCst);
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    /// Record that this process serves remote runs on `addr`.
    pub fn mark_serving(&self, addr: SocketAddr) {
        *self.serving_on.lock().unwrap_or_else(PoisonError::into_inner) = Some(addr);
    }

    pub fn clear_serving(&self) {
        *self.serving_on.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn serving_on(&self) -> Option<SocketAddr> {
        *self.serving_on.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when this process is itself a remote execution server bound to a
    /// loopback address.
    pub fn running_as_loopback_server(&self) -> bool {
        self.serving_on().is_some_and(|addr| addr.ip().is_loopback())
    }

    /// Return transient per-run state to its initial value.
    pub fn reset(&self) {
        debug!("resetting per-run process state");
        self.cancellation.reset();
    }

    /// Guard that calls [`ProcessState::reset`] when dropped, including
    /// during unwinding.
    pub fn reset_on_drop(self: &Arc<Self>) -> ResetGuard {
        ResetGuard {
            state: Arc::clone(self),
        }
    }
}

/// See [`ProcessState::reset_on_drop`].
#[derive(Debug)]
#[must_use = "the state is reset as soon as the guard is dropped"]
pub struct ResetGuard {
    state: Arc<ProcessState>,
}

impl Drop for ResetGuard {
    fn drop(&mut self) {
        self.state.reset();
    }
}
