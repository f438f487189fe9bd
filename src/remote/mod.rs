// src/remote/mod.rs

//! Remote execution: a `specrun serve` process runs suites on behalf of
//! `specrun --remote` clients.
//!
//! - [`protocol`] defines the newline-delimited JSON frames.
//! - [`client`] is the `RemoteBackend` the selector tries first.
//! - [`server`] accepts connections and runs each request through the
//!   orchestrator's configured pipeline.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::RemoteBackend;
pub use protocol::{Frame, RunRequestFrame};
pub use server::RemoteServer;
