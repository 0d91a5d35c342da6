//! Error extractor: pass-through stage that remembers error-level messages

use super::scanner::LevelScanner;
use crate::log::Level;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared, append-only list of collected error messages.
#[derive(Debug, Clone, Default)]
pub struct ErrorMessages {
    messages: Arc<Mutex<Vec<String>>>,
}

impl ErrorMessages {
    fn push(&self, message: String) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Copy of the messages collected so far, in arrival order.
    pub fn snapshot(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Forwards every byte unchanged and keeps the stripped text of each message
/// that resolves to [`Level::Error`].
///
/// Runs its own [`LevelScanner`] so the collected list does not depend on what
/// later stages decide.
pub struct ErrorFinder<W: Write> {
    inner: W,
    scanner: LevelScanner,
    errors: ErrorMessages,
}

impl<W: Write> ErrorFinder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            scanner: LevelScanner::new(),
            errors: ErrorMessages::default(),
        }
    }

    /// Error messages seen so far, in arrival order.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.snapshot()
    }

    /// Handle that keeps seeing new messages after the finder is moved.
    pub fn messages(&self) -> ErrorMessages {
        self.errors.clone()
    }

    /// Drops any unresolved message; an unclosed marker never counts as an error.
    pub fn finish(&mut self) {
        if self.scanner.finish().is_some() {
            tracing::debug!("Discarding unterminated message at end of stream");
        }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ErrorFinder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write_all(buf)?;

        let chunk = String::from_utf8_lossy(buf);
        if let Some(resolved) = self.scanner.push(&chunk) {
            if resolved.level == Level::Error {
                self.errors.push(resolved.message);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
