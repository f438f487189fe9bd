// src/remote/protocol.rs

//! Wire format between `specrun --remote` and `specrun serve`.
//!
//! One JSON document per line:
//!
//! ```text
//! client -> server   {"args":["-e","parser"]}
//! server -> client   {"out":"..."}          zero or more
//!                    {"err":"..."}          zero or more
//!                    {"status":0}           exactly one, last
//! ```

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::errors::{LauncherError, Result};

/// First and only client frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequestFrame {
    pub args: Vec<String>,
}

/// Server frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    Out(String),
    Err(String),
    Status(i32),
}

pub fn encode<T: Serialize>(frame: &T) -> Result<String> {
    let mut line = serde_json::to_string(frame)
        .map_err(|e| LauncherError::Remote(format!("encoding frame: {e}")))?;
    line.push('\n');
    Ok(line)
}

pub fn decode<'de, T: Deserialize<'de>>(line: &'de str) -> Result<T> {
    serde_json::from_str(line)
        .map_err(|e| LauncherError::Remote(format!("malformed frame {line:?}: {e}")))
}

pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let line = encode(frame)?;
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

/// Which server frame a [`FrameWriter`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Out,
    Err,
}

/// Synchronous `Write` adapter that turns every write into an `out` or
/// `err` frame queued for the connection writer task.
#[derive(Debug, Clone)]
pub struct FrameWriter {
    channel: Channel,
    tx: mpsc::UnboundedSender<Frame>,
}

impl FrameWriter {
    pub fn new(channel: Channel, tx: mpsc::UnboundedSender<Frame>) -> Self {
        Self { channel, tx }
    }
}

impl Write for FrameWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let chunk = String::from_utf8_lossy(buf).into_owned();
        let frame = match self.channel {
            Channel::Out => Frame::Out(chunk),
            Channel::Err => Frame::Err(chunk),
        };
        self.tx
            .send(frame)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "remote client went away"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
