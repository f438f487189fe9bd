// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Suite file as read from TOML, before validation.
///
/// ```toml
/// [suite]
/// fail_fast = false
///
/// [test.parser]
/// cmd = "cargo test -p parser"
///
/// [test.lint]
/// cmd = "cargo clippy -- -D warnings"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSuiteFile {
    #[serde(default)]
    pub suite: SuiteSection,

    /// All tests from `[test.<name>]`, keyed by test name.
    #[serde(default)]
    pub test: BTreeMap<String, TestConfig>,
}

/// `[suite]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuiteSection {
    /// Stop after the first failing test.
    #[serde(default)]
    pub fail_fast: bool,
}

/// `[test.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    /// Shell command; the test passes when it exits with status 0.
    pub cmd: String,
}

/// Validated suite. Construct through `SuiteFile::try_from(RawSuiteFile)`.
#[derive(Debug, Clone)]
pub struct SuiteFile {
    pub suite: SuiteSection,
    test: BTreeMap<String, TestConfig>,
}

impl SuiteFile {
    pub(crate) fn new_unchecked(suite: SuiteSection, test: BTreeMap<String, TestConfig>) -> Self {
        Self { suite, test }
    }

    /// Tests in name order.
    pub fn tests(&self) -> impl Iterator<Item = (&str, &TestConfig)> {
        self.test.iter().map(|(name, cfg)| (name.as_str(), cfg))
    }

    pub fn len(&self) -> usize {
        self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test.is_empty()
    }
}
