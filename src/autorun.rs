// src/autorun.rs

//! Run the suite automatically when the host process ends normally.
//!
//! A host that calls [`autorun`] once at startup gets a run at the end of
//! `main` without invoking the runner itself. The hook stays out of the way
//! when `main` failed for an unrelated reason, and it only touches the exit
//! code when the run failed.

use std::sync::Arc;

use tracing::{debug, error};

use crate::errors::Result;
use crate::lifecycle::{HostProcess, LastError, Lifecycle};
use crate::runner::{RunRequest, Runner};
use crate::state::ProcessState;
use crate::types::ExitStatus;

/// Starts one run and reports its status.
pub type Launch = Box<dyn FnOnce() -> Result<ExitStatus> + Send>;

/// Register the autorun hook on the real host process.
pub fn autorun() {
    let state = ProcessState::global();
    let launch_state = Arc::clone(&state);
    register_autorun(
        &state,
        HostProcess::global(),
        Box::new(move || launch_from_process(launch_state)),
    );
}

/// Suppress all future autorun registration in this process.
pub fn disable_autorun() {
    ProcessState::global().disable_autorun();
}

/// Register `launch` to run at shutdown, unless autorun is disabled, already
/// installed, or this process is a loopback remote server.
///
/// Returns whether a hook was registered by this call.
pub fn register_autorun<L>(state: &ProcessState, lifecycle: &L, launch: Launch) -> bool
where
    L: Lifecycle + ?Sized,
{
    if state.autorun_disabled() {
        debug!("autorun disabled; not registering");
        return false;
    }
    if state.autorun_installed() {
        debug!("autorun already installed");
        return false;
    }
    if state.running_as_loopback_server() {
        debug!("process is a loopback remote server; not registering autorun");
        return false;
    }
    if !state.mark_autorun_installed() {
        return false;
    }

    lifecycle.on_shutdown(Box::new(move |last_error| on_shutdown(last_error, launch)));
    debug!("autorun hook registered");
    true
}

fn on_shutdown(last_error: &LastError, launch: Launch) -> Option<i32> {
    if !last_error.permits_autorun() {
        debug!(?last_error, "host ended with a fault; skipping autorun");
        return None;
    }

    match launch() {
        Ok(status) if status.is_success() => None,
        Ok(status) => Some(status.code()),
        Err(e) => {
            error!(error = %e, "autorun failed");
            eprintln!("specrun error: {e}");
            Some(ExitStatus::Failure.code())
        }
    }
}

/// Run with the process arguments and standard streams.
fn launch_from_process(state: Arc<ProcessState>) -> Result<ExitStatus> {
    crate::logging::init_logging(None)?;
    let mut runner = Runner::new(state);
    runner.run_blocking(RunRequest::from_process())
}
