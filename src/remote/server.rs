// src/remote/server.rs

//! `specrun serve`: run suites for remote clients, one connection at a time.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::RunConfiguration;
use crate::errors::{LauncherError, Result};
use crate::exec::ExecutionBackend;
use crate::remote::protocol::{Channel, Frame, FrameWriter, RunRequestFrame, decode, write_frame};
use crate::runner::Runner;
use crate::state::ProcessState;
use crate::types::ExitStatus;

/// How often an idle server checks whether it should stop.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a connected client may take to send its request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A bound remote execution server.
///
/// While it exists, the process state records the bound address, which
/// keeps autorun from registering inside a loopback server.
///
/// Connections are served one at a time. A client that connects but does not
/// send its request within the request timeout is dropped, so it cannot hold
/// the server.
pub struct RemoteServer<L, R> {
    state: Arc<ProcessState>,
    listener: TcpListener,
    runner: Runner<L, R>,
    request_timeout: Duration,
}

impl<L, R> RemoteServer<L, R>
where
    L: ExecutionBackend,
    R: ExecutionBackend,
{
    pub async fn bind(runner: Runner<L, R>, addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let state = Arc::clone(runner.state());
        state.mark_serving(local_addr);
        info!(addr = %local_addr, "remote server listening");
        Ok(Self {
            state,
            listener,
            runner,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until cancellation is requested while idle.
    ///
    /// A request's run resets the cancellation flag when it ends, so the
    /// first interrupt during a run only stops that run.
    pub async fn serve(mut self) -> Result<()> {
        let mut poll = tokio::time::interval(IDLE_POLL_INTERVAL);

        loop {
            if self.state.cancellation().is_requested() {
                info!("cancellation requested; stopping remote server");
                break;
            }

            tokio::select! {
                accepted = self.listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "failed to accept remote connection");
                            continue;
                        }
                    };
                    debug!(%peer, "accepted remote run");
                    if let Err(e) = self.handle_connection(socket).await {
                        warn!(%peer, error = %e, "remote run failed");
                    }
                }
                _ = poll.tick() => {}
            }
        }

        self.state.clear_serving();
        self.state.reset();
        Ok(())
    }

    async fn handle_connection(&mut self, socket: TcpStream) -> Result<()> {
        let (reader, writer) = socket.into_split();
        let request = self.read_request(reader).await?;
        debug!(args = ?request.args, "remote run requested");

        let (tx, rx) = mpsc::unbounded_channel::<Frame>();
        let forward = tokio::spawn(forward_frames(rx, writer));

        let mut err = FrameWriter::new(Channel::Err, tx.clone());
        let out = FrameWriter::new(Channel::Out, tx.clone());

        let status = match self.run_request(&request.args, &mut err, out).await {
            Ok(status) => status,
            Err(e) => {
                let _ = writeln!(err, "specrun error: {e}");
                ExitStatus::Failure
            }
        };
        info!(%status, "remote run finished");

        // The status frame must be the last one: drop every sender so the
        // forwarder drains and stops.
        let _ = tx.send(Frame::Status(status.code()));
        drop(err);
        drop(tx);

        let mut writer = forward
            .await
            .map_err(|e| LauncherError::Remote(format!("frame forwarder failed: {e}")))??;
        writer.shutdown().await?;
        Ok(())
    }

    /// Wait for the client's request line, giving up on timeout or when
    /// cancellation is requested.
    async fn read_request(&self, reader: OwnedReadHalf) -> Result<RunRequestFrame> {
        let mut lines = BufReader::new(reader).lines();
        let deadline = Instant::now() + self.request_timeout;
        let mut poll = tokio::time::interval(IDLE_POLL_INTERVAL);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = line?.ok_or_else(|| {
                        LauncherError::Remote(
                            "client closed the connection before sending a request".into(),
                        )
                    })?;
                    return decode(&line);
                }
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(LauncherError::Remote(format!(
                        "no request received within {:?}",
                        self.request_timeout
                    )));
                }
                _ = poll.tick() => {
                    if self.state.cancellation().is_requested() {
                        return Err(LauncherError::Remote(
                            "cancelled while waiting for a request".into(),
                        ));
                    }
                }
            }
        }
    }

    async fn run_request(
        &mut self,
        args: &[String],
        err: &mut FrameWriter,
        out: FrameWriter,
    ) -> Result<ExitStatus> {
        let mut config = RunConfiguration::parse_args(args)?;
        // Never dispatch back to a server from inside one.
        config.remote = false;
        self.runner.run_configured(&config, err, Some(Box::new(out))).await
    }
}

async fn forward_frames(
    mut rx: mpsc::UnboundedReceiver<Frame>,
    mut writer: OwnedWriteHalf,
) -> Result<OwnedWriteHalf> {
    while let Some(frame) = rx.recv().await {
        write_frame(&mut writer, &frame).await?;
    }
    Ok(writer)
}
