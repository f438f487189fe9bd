// src/exec/mod.rs

//! Execution backends.
//!
//! - [`backend`] provides the `ExecutionBackend` trait and the tagged
//!   `BackendOutcome` every backend reports.
//! - [`local`] runs the suite in this process through the local engine.
//! - [`selector`] chooses between the remote backend and the local one,
//!   falling back to local when no remote server is reachable.
//!
//! The remote backend itself lives in [`crate::remote`].

pub mod backend;
pub mod local;
pub mod selector;

pub use backend::{BackendOutcome, BoxFuture, ExecutionBackend};
pub use local::LocalBackend;
pub use selector::{BackendSelector, REMOTE_FALLBACK_NOTICE};
