// src/config/validate.rs

use crate::config::model::{RawSuiteFile, SuiteFile};
use crate::errors::{LauncherError, Result};

impl TryFrom<RawSuiteFile> for SuiteFile {
    type Error = LauncherError;

    fn try_from(raw: RawSuiteFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_suite(&raw)?;
        Ok(SuiteFile::new_unchecked(raw.suite, raw.test))
    }
}

fn validate_raw_suite(raw: &RawSuiteFile) -> Result<()> {
    ensure_has_tests(raw)?;
    validate_commands(raw)?;
    Ok(())
}

fn ensure_has_tests(raw: &RawSuiteFile) -> Result<()> {
    if raw.test.is_empty() {
        return Err(LauncherError::Suite(
            "suite must contain at least one [test.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(raw: &RawSuiteFile) -> Result<()> {
    for (name, test) in raw.test.iter() {
        if test.cmd.trim().is_empty() {
            return Err(LauncherError::Suite(format!(
                "test '{name}' has an empty `cmd`"
            )));
        }
    }
    Ok(())
}
