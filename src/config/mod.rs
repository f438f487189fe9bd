// src/config/mod.rs

//! Suite file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a suite file from disk (`loader.rs`).
//! - Validate basic invariants like non-empty commands (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{RawSuiteFile, SuiteFile, SuiteSection, TestConfig};
