mod common;
use crate::common::{args, init_tracing, runner_with};

use std::error::Error;
use std::panic::{self, AssertUnwindSafe};

use specrun::errors::LauncherError;
use specrun::state::ProcessState;
use specrun::types::ExitStatus;
use specrun::RunRequest;
use specrun_test_utils::backends::{FakeBackend, Script};
use specrun_test_utils::buffer::SharedBuffer;

type TestResult = Result<(), Box<dyn Error>>;

fn quiet_request(list: &[&str]) -> RunRequest {
    RunRequest::new(args(list))
        .with_err(SharedBuffer::new().sink())
        .with_out(SharedBuffer::new().sink())
}

#[tokio::test]
async fn cancellation_is_cleared_after_a_successful_run() -> TestResult {
    init_tracing();

    let state = ProcessState::new();
    let local = FakeBackend::new("local", Script::CancelThenComplete(ExitStatus::Success))
        .with_cancellation(state.cancellation().clone());
    let mut runner = runner_with(&state, local, FakeBackend::new("remote", Script::Unreachable));

    let status = runner.run(quiet_request(&[])).await?;

    assert_eq!(status, ExitStatus::Success);
    assert!(!state.cancellation().is_requested());
    Ok(())
}

#[tokio::test]
async fn cancellation_is_cleared_after_a_failing_run() -> TestResult {
    let state = ProcessState::new();
    let local = FakeBackend::new("local", Script::CancelThenComplete(ExitStatus::Failure))
        .with_cancellation(state.cancellation().clone());
    let mut runner = runner_with(&state, local, FakeBackend::new("remote", Script::Unreachable));

    let status = runner.run(quiet_request(&[])).await?;

    assert_eq!(status.code(), 1);
    assert!(!state.cancellation().is_requested());
    Ok(())
}

#[tokio::test]
async fn cancellation_is_cleared_after_a_backend_error() {
    let state = ProcessState::new();
    let mut runner = runner_with(
        &state,
        FakeBackend::new("local", Script::Fail("engine crashed".into())),
        FakeBackend::new("remote", Script::Unreachable),
    );
    state.cancellation().request();

    let result = runner.run(quiet_request(&[])).await;

    assert!(matches!(result, Err(LauncherError::Suite(_))));
    assert!(!state.cancellation().is_requested());
}

#[tokio::test]
async fn cancellation_is_cleared_after_an_argument_error() {
    let state = ProcessState::new();
    let local = FakeBackend::new("local", Script::Complete(ExitStatus::Success));
    let local_calls = local.calls();
    let mut runner = runner_with(&state, local, FakeBackend::new("remote", Script::Unreachable));
    state.cancellation().request();

    let result = runner.run(quiet_request(&["--definitely-not-a-flag"])).await;

    assert!(matches!(result, Err(LauncherError::Config(_))));
    assert!(!state.cancellation().is_requested());
    assert_eq!(local_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn cancellation_is_cleared_when_the_backend_panics() {
    let state = ProcessState::new();
    let mut runner = runner_with(
        &state,
        FakeBackend::new("local", Script::Panic("engine panicked".into())),
        FakeBackend::new("remote", Script::Unreachable),
    );
    state.cancellation().request();

    let result = panic::catch_unwind(AssertUnwindSafe(|| runner.run_blocking(quiet_request(&[]))));

    assert!(result.is_err());
    assert!(!state.cancellation().is_requested());
}

#[tokio::test]
async fn repeated_runs_are_independent() -> TestResult {
    let state = ProcessState::new();
    let local = FakeBackend::new("local", Script::Complete(ExitStatus::Success));
    let local_calls = local.calls();
    let mut runner = runner_with(&state, local, FakeBackend::new("remote", Script::Unreachable));

    for _ in 0..3 {
        let status = runner.run(quiet_request(&[])).await?;
        assert!(matches!(status.code(), 0 | 1));
        assert_eq!(status, ExitStatus::Success);
    }
    assert_eq!(local_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    Ok(())
}
