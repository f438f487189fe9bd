// src/lib.rs

//! `specrun`: a test-run launcher.
//!
//! Turns a command line into a completed suite run with a correct exit
//! status, cooperating with the host process lifecycle (autorun at normal
//! termination, Ctrl-C escalation) and an optional remote server.

pub mod autorun;
pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod interrupt;
pub mod lifecycle;
pub mod logging;
pub mod remote;
pub mod runner;
pub mod state;
pub mod types;

use tracing::info;

pub use autorun::{autorun, disable_autorun};
pub use runner::{RunRequest, Runner};
pub use types::ExitStatus;

use crate::cli::ServeArgs;
use crate::errors::Result;
use crate::interrupt::InterruptTrap;
use crate::remote::RemoteServer;
use crate::state::ProcessState;

/// Run with `arguments` on the process-wide state, using stderr and stdout.
pub async fn run(arguments: Vec<String>) -> Result<ExitStatus> {
    let mut runner = Runner::new(ProcessState::global());
    runner.run(RunRequest::new(arguments)).await
}

/// High-level entry point for `specrun serve`.
///
/// Binds the listener, installs the interrupt trap and serves runs until
/// interrupted.
pub async fn serve(args: ServeArgs) -> Result<()> {
    let state = ProcessState::global();
    InterruptTrap::install(&state)?;

    let server = RemoteServer::bind(Runner::new(state), args.listen).await?;
    info!(addr = %server.local_addr()?, "serving remote runs; press Ctrl+C to stop");
    server.serve().await
}
