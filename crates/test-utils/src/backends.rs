use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use specrun::cli::RunConfiguration;
use specrun::errors::LauncherError;
use specrun::exec::{BackendOutcome, BoxFuture, ExecutionBackend};
use specrun::state::CancellationFlag;
use specrun::types::ExitStatus;

/// What a [`FakeBackend`] does when executed.
#[derive(Debug, Clone)]
pub enum Script {
    Complete(ExitStatus),
    /// Behave like a remote backend with no server listening.
    Unreachable,
    Fail(String),
    /// Request cancellation (as an interrupt would) and then complete.
    CancelThenComplete(ExitStatus),
    Panic(String),
}

/// A backend that:
/// - counts how often it was executed
/// - follows its [`Script`]
/// - writes one `ran:<name>` line to `out` when it completes.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    name: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
    cancellation: CancellationFlag,
}

impl FakeBackend {
    pub fn new(name: &'static str, script: Script) -> Self {
        Self {
            name,
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            cancellation: CancellationFlag::new(),
        }
    }

    /// Share the cancellation flag the fake raises for
    /// [`Script::CancelThenComplete`].
    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Handle to the call counter, usable after the backend is moved.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExecutionBackend for FakeBackend {
    fn execute<'a>(
        &'a mut self,
        _config: &'a RunConfiguration,
        _err: &'a mut (dyn Write + Send),
        out: &'a mut (dyn Write + Send),
    ) -> BoxFuture<'a, BackendOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Box::pin(async move {
            let status = match &self.script {
                Script::Unreachable => {
                    return BackendOutcome::ConnectionUnavailable(io::Error::from(
                        io::ErrorKind::ConnectionRefused,
                    ));
                }
                Script::Fail(msg) => {
                    return BackendOutcome::Failed(LauncherError::Suite(msg.clone()));
                }
                Script::Panic(msg) => panic!("{msg}"),
                Script::Complete(status) => *status,
                Script::CancelThenComplete(status) => {
                    self.cancellation.request();
                    *status
                }
            };

            match writeln!(out, "ran:{}", self.name) {
                Ok(()) => BackendOutcome::Completed(status),
                Err(e) => BackendOutcome::Failed(e.into()),
            }
        })
    }
}
