#![allow(dead_code)]

use specrun::console::{AnsiConsole, HostEnvironment};
use specrun::exec::ExecutionBackend;
use specrun::state::ProcessState;
use specrun::Runner;
use std::sync::Arc;

pub use specrun_test_utils::{args, init_tracing};

/// A plain non-Windows host: no console translation is ever attempted.
pub const PLAIN_HOST: HostEnvironment = HostEnvironment {
    windows: false,
    ansicon: false,
};

/// Runner over the given backends with a deterministic host environment.
pub fn runner_with<L, R>(state: &Arc<ProcessState>, local: L, remote: R) -> Runner<L, R>
where
    L: ExecutionBackend,
    R: ExecutionBackend,
{
    Runner::with_backends(Arc::clone(state), local, remote)
        .with_console(Box::new(AnsiConsole), PLAIN_HOST)
}
