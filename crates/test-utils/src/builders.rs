#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Builder for suite files written to a temporary TOML file.
#[derive(Debug, Default)]
pub struct SuiteBuilder {
    fail_fast: bool,
    tests: Vec<(String, String)>,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test(mut self, name: &str, cmd: &str) -> Self {
        self.tests.push((name.to_string(), cmd.to_string()));
        self
    }

    pub fn fail_fast(mut self, val: bool) -> Self {
        self.fail_fast = val;
        self
    }

    pub fn to_toml(&self) -> String {
        let mut out = format!("[suite]\nfail_fast = {}\n", self.fail_fast);
        for (name, cmd) in &self.tests {
            out.push_str(&format!("\n[test.{name}]\ncmd = {cmd:?}\n"));
        }
        out
    }

    /// Write the suite to a temporary file that lives as long as the
    /// returned handle.
    pub fn write(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp suite file");
        file.write_all(self.to_toml().as_bytes())
            .expect("write temp suite file");
        file
    }
}

/// Arguments selecting `suite` plus any `extra` flags.
pub fn suite_args(suite: &Path, extra: &[&str]) -> Vec<String> {
    let mut args = vec!["--suite".to_string(), suite.display().to_string()];
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}
