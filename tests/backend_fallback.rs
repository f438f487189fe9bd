mod common;
use crate::common::{args, init_tracing, runner_with, PLAIN_HOST};

use std::error::Error;
use std::net::TcpListener;

use specrun::console::AnsiConsole;
use specrun::errors::LauncherError;
use specrun::exec::REMOTE_FALLBACK_NOTICE;
use specrun::state::ProcessState;
use specrun::types::ExitStatus;
use specrun::{RunRequest, Runner};
use specrun_test_utils::backends::{FakeBackend, Script};
use specrun_test_utils::buffer::SharedBuffer;
use specrun_test_utils::builders::{suite_args, SuiteBuilder};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn unreachable_remote_falls_back_to_local_once() -> TestResult {
    init_tracing();

    let state = ProcessState::new();
    let local = FakeBackend::new("local", Script::Complete(ExitStatus::Failure));
    let remote = FakeBackend::new("remote", Script::Unreachable);
    let (local_calls, remote_calls) = (local.calls(), remote.calls());
    let mut runner = runner_with(&state, local, remote);

    let err = SharedBuffer::new();
    let out = SharedBuffer::new();
    let status = runner
        .run(
            RunRequest::new(args(&["--remote"]))
                .with_err(err.sink())
                .with_out(out.sink()),
        )
        .await?;

    assert_eq!(status, ExitStatus::Failure);
    assert_eq!(err.count(REMOTE_FALLBACK_NOTICE), 1);
    assert_eq!(out.contents(), "ran:local\n");
    assert_eq!(remote_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(local_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn remote_failure_other_than_connectivity_propagates() -> TestResult {
    let state = ProcessState::new();
    let local = FakeBackend::new("local", Script::Complete(ExitStatus::Success));
    let local_calls = local.calls();
    let mut runner = runner_with(
        &state,
        local,
        FakeBackend::new("remote", Script::Fail("remote suite exploded".into())),
    );

    let err = SharedBuffer::new();
    let result = runner
        .run(
            RunRequest::new(args(&["--remote"]))
                .with_err(err.sink())
                .with_out(SharedBuffer::new().sink()),
        )
        .await;

    match result {
        Err(LauncherError::Suite(msg)) => assert_eq!(msg, "remote suite exploded"),
        other => panic!("expected the remote error unchanged, got {other:?}"),
    }
    assert_eq!(err.count(REMOTE_FALLBACK_NOTICE), 0);
    assert_eq!(local_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn local_run_never_touches_remote() -> TestResult {
    let state = ProcessState::new();
    let remote = FakeBackend::new("remote", Script::Complete(ExitStatus::Failure));
    let remote_calls = remote.calls();
    let mut runner = runner_with(
        &state,
        FakeBackend::new("local", Script::Complete(ExitStatus::Success)),
        remote,
    );

    let status = runner
        .run(
            RunRequest::new(args(&[]))
                .with_err(SharedBuffer::new().sink())
                .with_out(SharedBuffer::new().sink()),
        )
        .await?;

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(remote_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn real_remote_backend_without_server_falls_back_to_real_engine() -> TestResult {
    init_tracing();

    // Reserve a port, then free it so nothing listens there.
    let addr = TcpListener::bind("127.0.0.1:0")?.local_addr()?;

    let suite = SuiteBuilder::new().with_test("greet", "echo hello").write();
    let addr_arg = addr.to_string();
    let arguments = suite_args(suite.path(), &["--remote", "--remote-addr", &addr_arg]);

    let state = ProcessState::new();
    let mut runner = Runner::new(state).with_console(Box::new(AnsiConsole), PLAIN_HOST);

    let err = SharedBuffer::new();
    let out = SharedBuffer::new();
    let status = runner
        .run(
            RunRequest::new(arguments)
                .with_err(err.sink())
                .with_out(out.sink()),
        )
        .await?;

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(err.count(REMOTE_FALLBACK_NOTICE), 1);
    assert!(out.contents().contains("hello\n"));
    assert!(out.contents().contains("1 test, 0 failures"));
    Ok(())
}
