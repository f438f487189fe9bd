// src/exec/backend.rs

//! Pluggable execution backend abstraction.
//!
//! The selector talks to an `ExecutionBackend` instead of a concrete engine.
//! This makes it easy to swap in a fake backend in tests while keeping the
//! production implementations in [`super::local`] and [`crate::remote`].

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;

use crate::cli::RunConfiguration;
use crate::errors::{LauncherError, Result};
use crate::types::ExitStatus;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a backend reports after an execution attempt.
///
/// Only `ConnectionUnavailable` is recoverable: the selector reacts to it
/// by running locally. Everything else is final.
#[derive(Debug)]
pub enum BackendOutcome {
    /// The run completed with this status.
    Completed(ExitStatus),
    /// No server could be reached; nothing was executed.
    ConnectionUnavailable(io::Error),
    /// Execution failed for any other reason.
    Failed(LauncherError),
}

impl BackendOutcome {
    /// Collapse into a `Result`, treating an unavailable connection as an
    /// IO error.
    pub fn into_result(self) -> Result<ExitStatus> {
        match self {
            BackendOutcome::Completed(status) => Ok(status),
            BackendOutcome::ConnectionUnavailable(e) => Err(LauncherError::Io(e)),
            BackendOutcome::Failed(e) => Err(e),
        }
    }
}

impl From<Result<ExitStatus>> for BackendOutcome {
    fn from(result: Result<ExitStatus>) -> Self {
        match result {
            Ok(status) => BackendOutcome::Completed(status),
            Err(e) => BackendOutcome::Failed(e),
        }
    }
}

/// Trait abstracting how a configured run is executed.
pub trait ExecutionBackend: Send {
    /// Execute one run, writing output to `out` and diagnostics to `err`.
    fn execute<'a>(
        &'a mut self,
        config: &'a RunConfiguration,
        err: &'a mut (dyn Write + Send),
        out: &'a mut (dyn Write + Send),
    ) -> BoxFuture<'a, BackendOutcome>;
}
