// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    /// Malformed command-line arguments (including `--help` / `--version`
    /// requests, which clap reports as errors).
    #[error("{0}")]
    Config(#[from] clap::Error),

    #[error("Invalid example filter: {0}")]
    Filter(#[from] regex::Error),

    #[error("Suite error: {0}")]
    Suite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Remote execution error: {0}")]
    Remote(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LauncherError>;
