use specrun::interrupt::{ABORT_EXIT_CODE, INTERRUPT_NOTICE, InterruptAction, InterruptTrap};
use specrun::state::ProcessState;
use specrun_test_utils::buffer::SharedBuffer;

#[test]
fn single_interrupt_requests_cancellation_and_keeps_running() {
    let state = ProcessState::new();
    let trap = InterruptTrap::new(state.cancellation().clone());
    let mut err = SharedBuffer::new();

    let action = trap.handle_interrupt(&mut err);

    assert_eq!(action, InterruptAction::Notified);
    assert!(state.cancellation().is_requested());
    assert_eq!(err.count("Exiting... Interrupt again to exit immediately."), 1);
    assert_eq!(err.contents(), format!("{INTERRUPT_NOTICE}\n"));
}

#[test]
fn second_interrupt_while_pending_aborts_with_status_one() {
    let state = ProcessState::new();
    let trap = InterruptTrap::new(state.cancellation().clone());
    let mut err = SharedBuffer::new();

    trap.handle_interrupt(&mut err);
    let action = trap.handle_interrupt(&mut err);

    assert_eq!(action, InterruptAction::Abort);
    assert_eq!(ABORT_EXIT_CODE, 1);
    assert_eq!(err.count("Interrupt again"), 1);
}

#[test]
fn interrupt_after_a_reset_is_graceful_again() {
    let state = ProcessState::new();
    let trap = InterruptTrap::new(state.cancellation().clone());
    let mut err = SharedBuffer::new();

    trap.handle_interrupt(&mut err);
    state.reset();

    assert_eq!(trap.handle_interrupt(&mut err), InterruptAction::Notified);
    assert_eq!(err.count("Interrupt again"), 2);
}

#[cfg(unix)]
mod process {
    use std::io::{BufRead, BufReader, Read};
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    use specrun::interrupt::{ABORT_EXIT_CODE, INTERRUPT_NOTICE};
    use specrun_test_utils::builders::{SuiteBuilder, suite_args};

    fn interrupt(pid: u32) {
        // SAFETY: plain signal delivery to a child we own.
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
        assert_eq!(rc, 0, "failed to signal child");
    }

    #[test]
    fn double_interrupt_exits_with_status_one() {
        let suite = SuiteBuilder::new()
            .with_test("waits", "echo ready; sleep 5")
            .write();

        let mut child = Command::new(env!("CARGO_BIN_EXE_specrun"))
            .args(suite_args(suite.path(), &[]))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn specrun");

        let mut stdout = BufReader::new(child.stdout.take().expect("piped stdout"));
        let mut first = String::new();
        stdout.read_line(&mut first).expect("read first line");
        assert_eq!(first, "ready\n");

        // The trap is installed before the run starts; give its listener
        // thread time to register for the signal.
        thread::sleep(Duration::from_millis(300));

        interrupt(child.id());
        thread::sleep(Duration::from_millis(5));
        interrupt(child.id());

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().expect("poll child") {
                break status;
            }
            assert!(
                started.elapsed() < Duration::from_secs(4),
                "specrun kept running after two interrupts"
            );
            thread::sleep(Duration::from_millis(20));
        };

        let mut err = String::new();
        child
            .stderr
            .take()
            .expect("piped stderr")
            .read_to_string(&mut err)
            .expect("read stderr");

        assert_eq!(status.code(), Some(ABORT_EXIT_CODE));
        assert!(err.contains(INTERRUPT_NOTICE.trim()), "stderr was {err:?}");
    }
}
