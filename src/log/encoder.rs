//! Record encoders: newline-delimited JSON and plain console text

use super::level::{Level, Producer};
use super::record::{LogRecord, MessageKind};
use crate::output::markers;
use std::fmt::Display;
use std::io::{self, Write};

/// Turns a resolved record into bytes on some sink.
pub trait LogEncoder: Send {
    fn encode(&mut self, record: &LogRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// One JSON object per line.
pub struct JsonEncoder<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonEncoder<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> LogEncoder for JsonEncoder<W> {
    fn encode(&mut self, record: &LogRecord) -> io::Result<()> {
        match serde_json::to_vec(record) {
            Ok(mut line) => {
                line.push(b'\n');
                self.out.write_all(&line)
            }
            Err(e) => {
                tracing::error!("Failed to serialize log record: {}", e);
                let fallback = fallback_error_record(&e, &record.timestamp, &format!("{:?}", record));
                self.out.write_all(fallback.as_bytes())?;
                self.out.write_all(b"\n")
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Builds the substitute record written when a record cannot be serialized.
///
/// Assembled by hand so it cannot fail itself; every string goes through
/// JSON string escaping.
pub fn fallback_error_record(err: &dyn Display, timestamp: &str, payload: &str) -> String {
    let message = format!("log message ({}) serialization failed: {}", payload, err);
    format!(
        "{{\"timestamp\":{},\"type\":{},\"producer\":{},\"level\":{},\"message\":{}}}",
        json_string(timestamp),
        json_string(MessageKind::Log.as_str()),
        json_string(Producer::Cli.as_str()),
        json_string(Level::Error.as_str()),
        json_string(&message),
    )
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Human-facing output: the message text, re-coloured by level.
pub struct ConsoleEncoder<W: Write + Send> {
    out: W,
    timestamps: bool,
}

impl<W: Write + Send> ConsoleEncoder<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            timestamps: false,
        }
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn prefix(&self, record: &LogRecord) -> Option<String> {
        if !self.timestamps {
            return None;
        }
        chrono::DateTime::parse_from_rfc3339(&record.timestamp)
            .ok()
            .map(|time| format!("[{}] ", time.format("%H:%M:%S")))
    }
}

impl<W: Write + Send> LogEncoder for ConsoleEncoder<W> {
    fn encode(&mut self, record: &LogRecord) -> io::Result<()> {
        let mut text = self.prefix(record).unwrap_or_default();
        match markers::opening_marker(record.level) {
            Some(open) => {
                text.push_str(open);
                text.push_str(&record.message);
                text.push_str(markers::RESET);
                if record.terminated {
                    text.push('\n');
                }
            }
            None => text.push_str(&record.message),
        }
        self.out.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: Level, message: &str) -> LogRecord {
        LogRecord::new(
            "2024-05-06T07:08:09Z".to_string(),
            Producer::Step,
            "",
            level,
            message,
        )
    }

    #[test]
    fn test_json_encoder_writes_one_line_per_record() {
        let mut encoder = JsonEncoder::new(Vec::new());
        encoder.encode(&record(Level::Normal, "a")).unwrap();
        encoder.encode(&record(Level::Done, "b")).unwrap();

        let out = String::from_utf8(encoder.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(r#""level":"done","message":"b""#));
    }

    #[test]
    fn test_fallback_record_is_valid_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let fallback = fallback_error_record(&err, "2024-05-06T07:08:09Z", "LogRecord { \"quoted\" }");

        let parsed: serde_json::Value = serde_json::from_str(&fallback).unwrap();
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["type"], "log");
        assert_eq!(parsed["producer"], "cli");
        let message = parsed["message"].as_str().unwrap();
        assert!(message.starts_with("log message (LogRecord { \"quoted\" }) serialization failed"));
    }

    #[test]
    fn test_console_encoder_passes_normal_text_through() {
        let mut encoder = ConsoleEncoder::new(Vec::new());
        encoder.encode(&record(Level::Normal, "Hello!")).unwrap();
        assert_eq!(encoder.into_inner(), b"Hello!");
    }

    #[test]
    fn test_console_encoder_recolours_leveled_text() {
        let mut encoder = ConsoleEncoder::new(Vec::new());
        encoder.encode(&record(Level::Info, "Login")).unwrap();
        assert_eq!(encoder.into_inner(), b"\x1b[34;1mLogin\x1b[0m");
    }

    #[test]
    fn test_console_encoder_restores_stripped_terminator() {
        let mut encoder = ConsoleEncoder::new(Vec::new());
        encoder
            .encode(&record(Level::Error, "boom").with_terminator(true))
            .unwrap();
        encoder.encode(&record(Level::Normal, "next\n")).unwrap();
        assert_eq!(encoder.into_inner(), b"\x1b[31;1mboom\x1b[0m\nnext\n");
    }

    #[test]
    fn test_json_encoder_omits_terminator_flag() {
        let mut encoder = JsonEncoder::new(Vec::new());
        encoder
            .encode(&record(Level::Error, "boom").with_terminator(true))
            .unwrap();
        let line = String::from_utf8(encoder.into_inner()).unwrap();
        assert!(!line.contains("terminated"));
        assert!(line.contains("\"message\":\"boom\""));
    }

    #[test]
    fn test_console_encoder_timestamp_prefix() {
        let mut encoder = ConsoleEncoder::new(Vec::new()).with_timestamps(true);
        encoder.encode(&record(Level::Normal, "tick")).unwrap();
        assert_eq!(encoder.into_inner(), b"[07:08:09] tick");
    }
}
