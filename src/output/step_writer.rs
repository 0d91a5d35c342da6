//! Pipeline composer for one step's output
//!
//! Wires the stages as `SecretFilter -> ErrorFinder -> LevelWriter`, skipping
//! the redactor when there is nothing to redact.

use super::error_finder::{ErrorFinder, ErrorMessages};
use super::level_writer::LevelWriter;
use super::secret_filter::{is_redactable, SecretFilter};
use crate::config::LoggerOpts;
use crate::log::Logger;
use std::io::{self, Write};

enum Chain {
    Redacted(SecretFilter<ErrorFinder<LevelWriter>>),
    Plain(ErrorFinder<LevelWriter>),
}

pub struct StepOutputWriter {
    chain: Chain,
    errors: ErrorMessages,
}

impl StepOutputWriter {
    pub fn new<S: AsRef<str>>(secrets: &[S], opts: LoggerOpts) -> Self {
        let finder = ErrorFinder::new(LevelWriter::new(Logger::new(opts)));
        let errors = finder.messages();
        let chain = if secrets.iter().any(|secret| is_redactable(secret.as_ref())) {
            Chain::Redacted(SecretFilter::new(secrets, finder))
        } else {
            Chain::Plain(finder)
        };

        Self { chain, errors }
    }

    pub fn redacts_secrets(&self) -> bool {
        matches!(self.chain, Chain::Redacted(_))
    }

    /// Error-level messages seen so far, after redaction.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.snapshot()
    }

    /// Ends the stream: releases held secret lines, settles the error
    /// extractor, then emits whatever the classifier still holds.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Chain::Redacted(filter) = &mut self.chain {
            filter.finish()?;
        }

        let finder = self.finder()?;
        finder.finish();
        finder.get_mut().finish()
    }

    fn finder(&mut self) -> io::Result<&mut ErrorFinder<LevelWriter>> {
        match &mut self.chain {
            Chain::Redacted(filter) => filter.inner_mut(),
            Chain::Plain(finder) => Ok(finder),
        }
    }
}

impl Write for StepOutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.chain {
            Chain::Redacted(filter) => filter.write(buf),
            Chain::Plain(finder) => finder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.chain {
            Chain::Redacted(filter) => filter.flush(),
            Chain::Plain(finder) => finder.flush(),
        }
    }
}
