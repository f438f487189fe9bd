// src/engine/mod.rs

//! Local test engine.
//!
//! Runs the tests of a suite file one after another as shell commands:
//! - [`session`] walks the selected tests, honours `fail_fast` and stops
//!   when cancellation is requested.
//! - [`test_runner`] runs a single test process, forwarding its output and
//!   killing it if cancellation is requested mid-test.

use std::fmt;

pub mod session;
pub mod test_runner;

pub use session::{Selection, run_suite};
pub use test_runner::run_test;

use crate::types::ExitStatus;

/// Outcome of a single test process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed(i32),
    /// Stopped because cancellation was requested.
    Cancelled,
}

/// Aggregate result of one suite run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteReport {
    /// Tests that ran to completion.
    pub run: usize,
    pub failures: usize,
    pub interrupted: bool,
}

impl SuiteReport {
    pub fn record(&mut self, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Passed => self.run += 1,
            TestOutcome::Failed(_) => {
                self.run += 1;
                self.failures += 1;
            }
            TestOutcome::Cancelled => self.interrupted = true,
        }
    }

    /// Success only if nothing failed and the run was not cut short.
    pub fn status(&self) -> ExitStatus {
        ExitStatus::from_passed(self.failures == 0 && !self.interrupted)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tests = if self.run == 1 { "test" } else { "tests" };
        let failures = if self.failures == 1 { "failure" } else { "failures" };
        write!(f, "{} {tests}, {} {failures}", self.run, self.failures)?;
        if self.interrupted {
            write!(f, ", interrupted")?;
        }
        Ok(())
    }
}
