use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use specrun::console::Sink;

/// A cloneable in-memory sink; every clone writes to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> Sink {
        Box::new(self.clone())
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }

    /// Number of times `needle` occurs in the buffer.
    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
