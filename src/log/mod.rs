//! Structured log records and the logger that emits them
//!
//! A [`Logger`] stamps each resolved message with a timestamp, producer and
//! level, then hands it to an encoder (`json` or `console`).

pub mod encoder;
pub mod level;
pub mod record;

pub use encoder::{fallback_error_record, ConsoleEncoder, JsonEncoder, LogEncoder};
pub use level::{Level, Producer};
pub use record::{format_timestamp, system_time_provider, LogRecord, MessageKind, TimeProvider};

use crate::config::{LoggerOpts, LoggerType};
use std::io;

pub struct Logger {
    encoder: Box<dyn LogEncoder>,
    producer: Producer,
    producer_id: String,
    debug_enabled: bool,
    time_provider: TimeProvider,
}

impl Logger {
    pub fn new(opts: LoggerOpts) -> Self {
        let encoder: Box<dyn LogEncoder> = match opts.logger_type {
            LoggerType::Json => Box::new(JsonEncoder::new(opts.writer)),
            LoggerType::Console => {
                Box::new(ConsoleEncoder::new(opts.writer).with_timestamps(opts.console.timestamps))
            }
        };

        Self {
            encoder,
            producer: opts.producer,
            producer_id: opts.producer_id,
            debug_enabled: opts.debug_log_enabled,
            time_provider: opts.time_provider,
        }
    }

    /// Emits one record. Debug records are dropped unless debug logging is on.
    pub fn log_message(&mut self, level: Level, message: &str) -> io::Result<()> {
        self.log_line(level, message, false)
    }

    /// Like [`log_message`](Self::log_message), remembering that the source
    /// line carried a terminator the markers were stripped along with.
    pub fn log_line(&mut self, level: Level, message: &str, terminated: bool) -> io::Result<()> {
        if level == Level::Debug && !self.debug_enabled {
            return Ok(());
        }

        let record = LogRecord::new(
            format_timestamp((self.time_provider)()),
            self.producer,
            self.producer_id.as_str(),
            level,
            message,
        )
        .with_terminator(terminated);
        self.encoder.encode(&record)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}
