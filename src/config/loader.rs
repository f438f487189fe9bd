// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawSuiteFile, SuiteFile};
use crate::errors::Result;

/// Load a suite file from a given path and return the raw `RawSuiteFile`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// the checked version.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSuiteFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let suite: RawSuiteFile = toml::from_str(&contents)?;

    Ok(suite)
}

/// Load a suite file from path and validate it.
///
/// The file is read on every call; nothing is cached between runs.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SuiteFile> {
    let raw = load_from_path(&path)?;
    let suite = SuiteFile::try_from(raw)?;
    Ok(suite)
}
