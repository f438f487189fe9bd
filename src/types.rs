use std::fmt;

/// Final status of a run, as reported to the host process.
///
/// Only two codes exist: `0` for success and `1` for everything else
/// (failing tests, interrupted runs, the double-interrupt abort).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Success
    }

    pub fn from_passed(passed: bool) -> Self {
        if passed {
            ExitStatus::Success
        } else {
            ExitStatus::Failure
        }
    }
}

impl From<ExitStatus> for i32 {
    fn from(status: ExitStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for ExitStatus {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ExitStatus::Success),
            1 => Ok(ExitStatus::Failure),
            other => Err(format!("invalid exit status: {other} (expected 0 or 1)")),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Success => write!(f, "success (0)"),
            ExitStatus::Failure => write!(f, "failure (1)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_zero_or_one() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failure.code(), 1);
        assert_eq!(i32::from(ExitStatus::Failure), 1);
    }

    #[test]
    fn rejects_codes_outside_the_contract() {
        assert_eq!(ExitStatus::try_from(0), Ok(ExitStatus::Success));
        assert_eq!(ExitStatus::try_from(1), Ok(ExitStatus::Failure));
        assert!(ExitStatus::try_from(2).is_err());
        assert!(ExitStatus::try_from(-1).is_err());
    }
}
