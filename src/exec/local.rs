// src/exec/local.rs

//! In-process execution through the local engine.

use std::io::Write;

use tracing::debug;

use crate::cli::RunConfiguration;
use crate::config::load_and_validate;
use crate::engine::{Selection, run_suite};
use crate::errors::Result;
use crate::exec::backend::{BackendOutcome, BoxFuture, ExecutionBackend};
use crate::state::CancellationFlag;
use crate::types::ExitStatus;

/// Runs the suite named by `--suite` in this process.
///
/// The suite file is loaded on every execution.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    cancellation: CancellationFlag,
}

impl LocalBackend {
    pub fn new(cancellation: CancellationFlag) -> Self {
        Self { cancellation }
    }

    async fn run(
        &self,
        config: &RunConfiguration,
        err: &mut (dyn Write + Send),
        out: &mut (dyn Write + Send),
    ) -> Result<ExitStatus> {
        debug!(suite = %config.suite.display(), "running suite locally");
        let suite = load_and_validate(&config.suite)?;
        let selection = Selection::from_config(config, &suite)?;
        let report = run_suite(&suite, &selection, &self.cancellation, err, out).await?;
        debug!(?report, "local run finished");
        Ok(report.status())
    }
}

impl ExecutionBackend for LocalBackend {
    fn execute<'a>(
        &'a mut self,
        config: &'a RunConfiguration,
        err: &'a mut (dyn Write + Send),
        out: &'a mut (dyn Write + Send),
    ) -> BoxFuture<'a, BackendOutcome> {
        Box::pin(async move { BackendOutcome::from(self.run(config, err, out).await) })
    }
}
