// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! [`RunConfiguration`] is what the orchestrator derives from a run's
//! argument list. [`ServeArgs`] covers `specrun serve`, which turns the
//! process into a remote execution server.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::errors::Result;

/// Default address of the remote execution server.
pub const DEFAULT_REMOTE_ADDR: &str = "127.0.0.1:8989";

/// Default suite file, relative to the working directory.
pub const DEFAULT_SUITE_PATH: &str = "Specrun.toml";

/// The current process's arguments, without the program name.
pub fn process_args() -> Vec<String> {
    lossy_args(std::env::args_os().skip(1))
}

/// Convert arguments to `String`s, replacing invalid UTF-8.
pub fn lossy_args(args: impl IntoIterator<Item = OsString>) -> Vec<String> {
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Options for a single test run.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "specrun",
    version,
    about = "Run a test suite locally or on a remote specrun server.",
    long_about = None
)]
pub struct RunConfiguration {
    /// Request ANSI colour output.
    #[arg(long, visible_alias = "colour")]
    pub color: bool,

    /// Run on a remote specrun server, falling back to this process when
    /// none is reachable.
    #[arg(long, alias = "drb")]
    pub remote: bool,

    /// Address of the remote server used with `--remote`.
    #[arg(long, value_name = "ADDR", default_value = DEFAULT_REMOTE_ADDR)]
    pub remote_addr: SocketAddr,

    /// Path to the suite file (TOML).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SUITE_PATH)]
    pub suite: PathBuf,

    /// Only run tests whose name matches this regular expression.
    #[arg(short = 'e', long, value_name = "PATTERN")]
    pub example: Option<String>,

    /// Stop after the first failing test.
    #[arg(long)]
    pub fail_fast: bool,

    /// The raw arguments this configuration was parsed from.
    #[arg(skip)]
    pub args: Vec<String>,
}

impl RunConfiguration {
    /// Parse a run's argument list (without the program name).
    pub fn parse_args(args: &[String]) -> Result<Self> {
        let argv = std::iter::once("specrun").chain(args.iter().map(String::as_str));
        let mut config = Self::try_parse_from(argv)?;
        config.args = args.to_vec();
        Ok(config)
    }
}

/// Command-line arguments for `specrun serve`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "specrun serve",
    about = "Serve test runs to `specrun --remote` clients.",
    long_about = None
)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, value_name = "ADDR", default_value = DEFAULT_REMOTE_ADDR)]
    pub listen: SocketAddr,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPECRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl ServeArgs {
    /// Parse the arguments following `serve`; exits on malformed input.
    pub fn parse_args(args: &[String]) -> Self {
        let argv = std::iter::once("specrun serve").chain(args.iter().map(String::as_str));
        Self::parse_from(argv)
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
