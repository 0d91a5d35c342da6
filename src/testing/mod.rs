//! Testing utilities shared by unit and integration tests
//!
//! Sinks that can be inspected after being moved into a pipeline, a sink that
//! always fails, and a pinned clock.

use crate::log::TimeProvider;
use chrono::{TimeZone, Utc};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// In-memory sink whose clones share one buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
    writes: Arc<Mutex<usize>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buf = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Returns the contents and clears the buffer.
    pub fn take(&self) -> String {
        let mut buf = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let out = String::from_utf8_lossy(&buf).into_owned();
        buf.clear();
        out
    }

    /// Number of `write` calls seen so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that rejects every write, like a closed pipe.
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Clock pinned to `0001-01-01T00:00:00Z`.
pub fn fixed_time() -> TimeProvider {
    Arc::new(|| Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap())
}
