// src/runner.rs

//! The run orchestrator.
//!
//! [`Runner::run`] is the one entry point every caller goes through: the
//! binary, the autorun hook, embedding tools. It
//!
//! 1. installs the interrupt trap,
//! 2. parses the arguments into a [`RunConfiguration`],
//! 3. resolves the output stream,
//! 4. hands the run to the [`BackendSelector`],
//! 5. resets the shared process state on every exit path,
//! 6. returns an [`ExitStatus`].

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use tracing::debug;

use crate::cli::RunConfiguration;
use crate::console::{self, AnsiConsole, ConsoleAdapter, HostEnvironment, Sink};
use crate::errors::Result;
use crate::exec::{BackendSelector, ExecutionBackend, LocalBackend};
use crate::interrupt::InterruptTrap;
use crate::remote::RemoteBackend;
use crate::state::ProcessState;
use crate::types::ExitStatus;

/// Inputs of one run.
pub struct RunRequest {
    /// Command-line arguments, without the program name.
    pub arguments: Vec<String>,
    pub err: Sink,
    /// `None` means stdout, adapted for the console when needed.
    pub out: Option<Sink>,
}

impl RunRequest {
    pub fn new(arguments: Vec<String>) -> Self {
        Self {
            arguments,
            err: Box::new(io::stderr()),
            out: None,
        }
    }

    /// The current process's arguments and standard streams.
    pub fn from_process() -> Self {
        Self::new(crate::cli::process_args())
    }

    pub fn with_err(mut self, err: Sink) -> Self {
        self.err = err;
        self
    }

    pub fn with_out(mut self, out: Sink) -> Self {
        self.out = Some(out);
        self
    }
}

impl fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunRequest")
            .field("arguments", &self.arguments)
            .field("explicit_out", &self.out.is_some())
            .finish_non_exhaustive()
    }
}

/// Orchestrates runs for one [`ProcessState`].
///
/// Safe to call repeatedly. The suite file is re-read by every run; a caller
/// that caches anything loaded from it is responsible for reloading.
pub struct Runner<L = LocalBackend, R = RemoteBackend> {
    state: Arc<ProcessState>,
    selector: BackendSelector<L, R>,
    console: Box<dyn ConsoleAdapter>,
    environment: HostEnvironment,
}

impl Runner {
    /// Runner with the production local and remote backends.
    pub fn new(state: Arc<ProcessState>) -> Self {
        let local = LocalBackend::new(state.cancellation().clone());
        Runner::with_backends(state, local, RemoteBackend::new())
    }
}

impl<L, R> Runner<L, R>
where
    L: ExecutionBackend,
    R: ExecutionBackend,
{
    pub fn with_backends(state: Arc<ProcessState>, local: L, remote: R) -> Self {
        let selector = BackendSelector::new(Arc::clone(&state), local, remote);
        Self {
            state,
            selector,
            console: Box::new(AnsiConsole),
            environment: HostEnvironment::detect(),
        }
    }

    /// Replace the console adapter and the detected host environment.
    pub fn with_console(
        mut self,
        console: Box<dyn ConsoleAdapter>,
        environment: HostEnvironment,
    ) -> Self {
        self.console = console;
        self.environment = environment;
        self
    }

    pub fn state(&self) -> &Arc<ProcessState> {
        &self.state
    }

    /// Run the suite described by `request.arguments`.
    ///
    /// Argument errors and execution errors are returned unchanged. The
    /// cancellation flag is reset before this returns, whatever the outcome.
    pub async fn run(&mut self, request: RunRequest) -> Result<ExitStatus> {
        let _reset = self.state.reset_on_drop();

        InterruptTrap::install(&self.state)?;

        let RunRequest {
            arguments,
            mut err,
            out,
        } = request;

        let config = RunConfiguration::parse_args(&arguments)?;
        debug!(?config, "parsed run configuration");

        let status = self.run_configured(&config, &mut *err, out).await;
        let _ = err.flush();
        status
    }

    /// Steps 3 to 6 of [`Runner::run`] for an already parsed configuration.
    pub async fn run_configured(
        &mut self,
        config: &RunConfiguration,
        err: &mut (dyn Write + Send),
        out: Option<Sink>,
    ) -> Result<ExitStatus> {
        let _reset = self.state.reset_on_drop();

        let mut out = console::resolve_output(
            out,
            config.color,
            &self.environment,
            self.console.as_ref(),
            &mut *err,
        );

        let status = self.selector.execute(config, err, &mut *out).await?;
        out.flush()?;

        debug!(%status, "run finished");
        Ok(status)
    }

    /// Run on a fresh current-thread Tokio runtime.
    ///
    /// For synchronous hosts such as the autorun hook. Must not be called
    /// from inside a Tokio runtime.
    pub fn run_blocking(&mut self, request: RunRequest) -> Result<ExitStatus> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(request))
    }
}
