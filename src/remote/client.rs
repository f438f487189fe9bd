// src/remote/client.rs

//! Client side of remote execution.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::cli::RunConfiguration;
use crate::errors::{LauncherError, Result};
use crate::exec::backend::{BackendOutcome, BoxFuture, ExecutionBackend};
use crate::remote::protocol::{Frame, RunRequestFrame, decode, write_frame};
use crate::types::ExitStatus;

/// Sends the run's arguments to the server at `--remote-addr` and relays
/// its output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteBackend;

impl RemoteBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionBackend for RemoteBackend {
    fn execute<'a>(
        &'a mut self,
        config: &'a RunConfiguration,
        err: &'a mut (dyn Write + Send),
        out: &'a mut (dyn Write + Send),
    ) -> BoxFuture<'a, BackendOutcome> {
        Box::pin(async move {
            let stream = match TcpStream::connect(config.remote_addr).await {
                Ok(stream) => stream,
                Err(e) => return BackendOutcome::ConnectionUnavailable(e),
            };
            debug!(addr = %config.remote_addr, "connected to remote server");
            BackendOutcome::from(drive(stream, config, err, out).await)
        })
    }
}

/// Send the request and relay frames until the final status arrives.
async fn drive(
    stream: TcpStream,
    config: &RunConfiguration,
    err: &mut (dyn Write + Send),
    out: &mut (dyn Write + Send),
) -> Result<ExitStatus> {
    let (reader, mut writer) = stream.into_split();

    let request = RunRequestFrame {
        args: config.args.clone(),
    };
    write_frame(&mut writer, &request).await?;

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        match decode::<Frame>(&line)? {
            Frame::Out(chunk) => out.write_all(chunk.as_bytes())?,
            Frame::Err(chunk) => err.write_all(chunk.as_bytes())?,
            Frame::Status(code) => {
                out.flush()?;
                return ExitStatus::try_from(code).map_err(LauncherError::Remote);
            }
        }
    }

    Err(LauncherError::Remote(
        "remote server closed the connection before reporting a status".to_string(),
    ))
}
