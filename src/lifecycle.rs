// src/lifecycle.rs

//! Host process lifecycle: shutdown hooks that can see how `main` ended.
//!
//! A host wraps its body with [`HostProcess::main`]. Once the body finishes,
//! the registered [`ShutdownHook`]s run in reverse registration order and are
//! told what ended the body through a [`LastError`]:
//!
//! - the body returned `Ok(())`: [`LastError::None`],
//! - the body returned the error built by [`exit`]: [`LastError::ExitRequested`],
//! - the body returned any other error, or panicked: [`LastError::Fault`].
//!
//! A hook may override the process exit code by returning `Some(code)`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, OnceLock, PoisonError};

use thiserror::Error;
use tracing::debug;

/// Exit code used when the body panics, matching Rust's own panic exit code.
pub const PANIC_EXIT_CODE: i32 = 101;

/// What ended the host body, as seen by shutdown hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastError {
    /// The body reached its end normally.
    None,
    /// The body asked for the process to exit with this code.
    ExitRequested(i32),
    /// The body failed with an error or panic unrelated to exiting.
    Fault(String),
}

impl LastError {
    /// Whether a normal-termination hook (such as autorun) should proceed.
    pub fn permits_autorun(&self) -> bool {
        matches!(self, LastError::None | LastError::ExitRequested(_))
    }
}

/// Deliberate exit request; returned from a host body through [`exit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("exit requested with status {code}")]
pub struct ExitRequest {
    pub code: i32,
}

/// Build the error a host body returns to end the process with `code`.
pub fn exit(code: i32) -> anyhow::Error {
    ExitRequest { code }.into()
}

pub type ShutdownHook = Box<dyn FnOnce(&LastError) -> Option<i32> + Send>;

/// Anything that can run callbacks when the host is about to terminate.
pub trait Lifecycle: Send + Sync {
    fn on_shutdown(&self, hook: ShutdownHook);
}

/// The real host process.
#[derive(Default)]
pub struct HostProcess {
    hooks: Mutex<Vec<ShutdownHook>>,
}

static GLOBAL: OnceLock<HostProcess> = OnceLock::new();

impl HostProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static HostProcess {
        GLOBAL.get_or_init(HostProcess::new)
    }

    pub fn pending_hooks(&self) -> usize {
        self.lock_hooks().len()
    }

    /// Run `body`, then the shutdown hooks, and return the exit code the
    /// process should terminate with.
    pub fn main<F>(&self, body: F) -> i32
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        let (last_error, code) = match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(Ok(())) => (LastError::None, 0),
            Ok(Err(err)) => match err.downcast_ref::<ExitRequest>() {
                Some(request) => (LastError::ExitRequested(request.code), request.code),
                None => {
                    eprintln!("specrun error: {err:?}");
                    (LastError::Fault(format!("{err:#}")), 1)
                }
            },
            Err(payload) => (LastError::Fault(panic_message(&*payload)), PANIC_EXIT_CODE),
        };

        self.shutdown(&last_error, code)
    }

    /// Drain the hooks, last registered first.
    ///
    /// Hooks registered while draining also run.
    pub fn shutdown(&self, last_error: &LastError, code: i32) -> i32 {
        let mut code = code;

        loop {
            let hook = self.lock_hooks().pop();
            let Some(hook) = hook else { break };

            if let Some(forced) = hook(last_error) {
                debug!(forced, previous = code, "shutdown hook overrode exit code");
                code = forced;
            }
        }

        code
    }

    fn lock_hooks(&self) -> std::sync::MutexGuard<'_, Vec<ShutdownHook>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Lifecycle for HostProcess {
    fn on_shutdown(&self, hook: ShutdownHook) {
        self.lock_hooks().push(hook);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recording_hook(seen: Arc<Mutex<Vec<LastError>>>, result: Option<i32>) -> ShutdownHook {
        Box::new(move |last| {
            seen.lock().unwrap().push(last.clone());
            result
        })
    }

    #[test]
    fn normal_end_reports_no_error() {
        let host = HostProcess::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        host.on_shutdown(recording_hook(seen.clone(), None));

        assert_eq!(host.main(|| Ok(())), 0);
        assert_eq!(*seen.lock().unwrap(), vec![LastError::None]);
        assert_eq!(host.pending_hooks(), 0);
    }

    #[test]
    fn exit_request_is_distinguished_from_faults() {
        let host = HostProcess::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        host.on_shutdown(recording_hook(seen.clone(), None));

        assert_eq!(host.main(|| Err(exit(3))), 3);
        assert_eq!(*seen.lock().unwrap(), vec![LastError::ExitRequested(3)]);
    }

    #[test]
    fn errors_and_panics_are_faults() {
        let host = HostProcess::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        host.on_shutdown(recording_hook(seen.clone(), None));
        assert_eq!(host.main(|| Err(anyhow::anyhow!("database exploded"))), 1);

        host.on_shutdown(recording_hook(seen.clone(), None));
        assert_eq!(host.main(|| panic!("boom")), PANIC_EXIT_CODE);

        let seen = seen.lock().unwrap();
        assert!(matches!(&seen[0], LastError::Fault(msg) if msg.contains("database exploded")));
        assert_eq!(seen[1], LastError::Fault("boom".to_string()));
        assert!(!seen[0].permits_autorun());
    }

    #[test]
    fn hooks_run_last_registered_first_and_can_override() {
        let host = HostProcess::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (i, forced) in [(1, Some(7)), (2, None)] {
            let order = order.clone();
            host.on_shutdown(Box::new(move |_| {
                order.lock().unwrap().push(i);
                forced
            }));
        }

        assert_eq!(host.main(|| Ok(())), 7);
        assert_eq!(*order.lock().unwrap(), vec![2, 1]);
    }
}
