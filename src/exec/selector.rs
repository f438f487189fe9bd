// src/exec/selector.rs

//! Remote-or-local backend selection.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cli::RunConfiguration;
use crate::errors::Result;
use crate::exec::backend::{BackendOutcome, ExecutionBackend};
use crate::state::ProcessState;
use crate::types::ExitStatus;

pub const REMOTE_FALLBACK_NOTICE: &str =
    "No remote server is running. Running in local process instead ...";

/// Chooses where a run executes.
///
/// With `--remote`, the remote backend is tried first; if it reports that no
/// server is reachable, the run falls back to the local backend after a
/// notice on the error stream. Any other remote failure is returned as is.
pub struct BackendSelector<L, R> {
    state: Arc<ProcessState>,
    local: L,
    remote: R,
}

impl<L, R> BackendSelector<L, R>
where
    L: ExecutionBackend,
    R: ExecutionBackend,
{
    pub fn new(state: Arc<ProcessState>, local: L, remote: R) -> Self {
        Self {
            state,
            local,
            remote,
        }
    }

    /// Execute `config` on the selected backend.
    ///
    /// The shared process state is reset when this returns, fails, or
    /// unwinds.
    pub async fn execute(
        &mut self,
        config: &RunConfiguration,
        err: &mut (dyn Write + Send),
        out: &mut (dyn Write + Send),
    ) -> Result<ExitStatus> {
        let _reset = self.state.reset_on_drop();

        if config.remote {
            debug!(addr = %config.remote_addr, "trying remote backend");
            match self.remote.execute(config, &mut *err, &mut *out).await {
                BackendOutcome::Completed(status) => {
                    debug!(%status, "remote run completed");
                    return Ok(status);
                }
                BackendOutcome::ConnectionUnavailable(e) => {
                    warn!(addr = %config.remote_addr, error = %e, "no remote server reachable; running locally");
                    writeln!(err, "{REMOTE_FALLBACK_NOTICE}")?;
                }
                BackendOutcome::Failed(e) => return Err(e),
            }
        }

        debug!("running on local backend");
        self.local.execute(config, err, out).await.into_result()
    }
}
