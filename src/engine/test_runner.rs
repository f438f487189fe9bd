// src/engine/test_runner.rs

//! Individual test process runner.

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use crate::engine::TestOutcome;
use crate::errors::Result;
use crate::state::CancellationFlag;

/// How often a running test checks the cancellation flag.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run a single test command, forwarding stdout lines to `out` and stderr
/// lines to `err`.
///
/// - If cancellation is requested while the process runs, it is killed and
///   the outcome is [`TestOutcome::Cancelled`].
/// - Otherwise the exit status decides between `Passed` and `Failed(code)`.
pub async fn run_test(
    name: &str,
    cmd: &str,
    cancellation: &CancellationFlag,
    err: &mut (dyn Write + Send),
    out: &mut (dyn Write + Send),
) -> Result<TestOutcome> {
    info!(test = %name, cmd = %cmd, "starting test process");

    let mut child = shell_command(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning process for test '{name}'"))?;

    let stdout = child
        .stdout
        .take()
        .with_context(|| format!("capturing stdout of test '{name}'"))?;
    let stderr = child
        .stderr
        .take()
        .with_context(|| format!("capturing stderr of test '{name}'"))?;

    // Split on raw newlines; test output is not required to be UTF-8.
    let mut stdout_lines = BufReader::new(stdout).split(b'\n');
    let mut stderr_lines = BufReader::new(stderr).split(b'\n');
    let mut stdout_open = true;
    let mut stderr_open = true;

    let mut poll = tokio::time::interval(CANCEL_POLL_INTERVAL);

    // Drain both pipes before waiting so a chatty child never blocks on a
    // full pipe; check the flag on every tick.
    loop {
        tokio::select! {
            line = stdout_lines.next_segment(), if stdout_open => {
                match line.with_context(|| format!("reading stdout of test '{name}'"))? {
                    Some(line) => forward_line(out, &line)?,
                    None => stdout_open = false,
                }
            }

            line = stderr_lines.next_segment(), if stderr_open => {
                match line.with_context(|| format!("reading stderr of test '{name}'"))? {
                    Some(line) => forward_line(err, &line)?,
                    None => stderr_open = false,
                }
            }

            status = child.wait(), if !stdout_open && !stderr_open => {
                let status = status
                    .with_context(|| format!("waiting for process of test '{name}'"))?;
                let code = status.code().unwrap_or(-1);

                info!(
                    test = %name,
                    exit_code = code,
                    success = status.success(),
                    "test process exited"
                );

                return Ok(if status.success() {
                    TestOutcome::Passed
                } else {
                    TestOutcome::Failed(code)
                });
            }

            _ = poll.tick() => {
                if cancellation.is_requested() {
                    info!(test = %name, "cancellation requested; killing test process");
                    if let Err(e) = child.kill().await {
                        warn!(test = %name, error = %e, "failed to kill test process on cancellation");
                    }
                    return Ok(TestOutcome::Cancelled);
                }
            }
        }
    }
}

/// Write one line of child output, replacing invalid UTF-8 and dropping a
/// trailing `\r`.
fn forward_line(sink: &mut (dyn Write + Send), line: &[u8]) -> std::io::Result<()> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    writeln!(sink, "{}", String::from_utf8_lossy(line))
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}
