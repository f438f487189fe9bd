// src/engine/session.rs

//! Sequential suite execution.

use std::io::Write;

use regex::Regex;
use tracing::{debug, info};

use crate::cli::RunConfiguration;
use crate::config::SuiteFile;
use crate::engine::{SuiteReport, TestOutcome, run_test};
use crate::errors::Result;
use crate::state::CancellationFlag;

/// Which tests to run and when to stop.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub filter: Option<Regex>,
    pub fail_fast: bool,
}

impl Selection {
    /// Combine the run options with the suite's own settings.
    ///
    /// An invalid `--example` pattern is a configuration error.
    pub fn from_config(config: &RunConfiguration, suite: &SuiteFile) -> Result<Self> {
        let filter = config.example.as_deref().map(Regex::new).transpose()?;
        Ok(Self {
            filter,
            fail_fast: config.fail_fast || suite.suite.fail_fast,
        })
    }

    pub fn includes(&self, name: &str) -> bool {
        self.filter.as_ref().is_none_or(|re| re.is_match(name))
    }
}

/// Run the selected tests of `suite` in name order.
///
/// The cancellation flag is checked before every test and polled while a
/// test runs. The summary line is written to `out`.
pub async fn run_suite(
    suite: &SuiteFile,
    selection: &Selection,
    cancellation: &CancellationFlag,
    err: &mut (dyn Write + Send),
    out: &mut (dyn Write + Send),
) -> Result<SuiteReport> {
    let mut report = SuiteReport::default();

    for (name, test) in suite.tests() {
        if !selection.includes(name) {
            debug!(test = %name, "skipped by example filter");
            continue;
        }

        if cancellation.is_requested() {
            info!(test = %name, "cancellation requested; not starting remaining tests");
            report.interrupted = true;
            break;
        }

        let outcome = run_test(name, &test.cmd, cancellation, &mut *err, &mut *out).await?;
        report.record(outcome);

        match outcome {
            TestOutcome::Cancelled => break,
            TestOutcome::Failed(code) if selection.fail_fast => {
                info!(test = %name, exit_code = code, "fail_fast: stopping after first failure");
                break;
            }
            _ => {}
        }
    }

    writeln!(out, "\n{report}")?;
    out.flush()?;
    Ok(report)
}
