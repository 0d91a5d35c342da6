//! Level classifier: turns written chunks into log records

use super::scanner::{LevelScanner, Resolved};
use crate::log::Logger;
use std::io::{self, Write};

/// Final stage of a step pipeline.
///
/// Every write is one chunk for the [`LevelScanner`]; each resolved message is
/// handed to the [`Logger`] in arrival order.
pub struct LevelWriter {
    scanner: LevelScanner,
    logger: Logger,
}

impl LevelWriter {
    pub fn new(logger: Logger) -> Self {
        Self {
            scanner: LevelScanner::new(),
            logger,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scanner.is_idle()
    }

    /// Emits any held partial message as a normal, unstripped record.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(resolved) = self.scanner.finish() {
            tracing::debug!("Releasing unterminated leveled message as normal text");
            self.emit(resolved)?;
        }
        self.logger.flush()
    }

    fn emit(&mut self, resolved: Resolved) -> io::Result<()> {
        self.logger
            .log_line(resolved.level, &resolved.message, resolved.terminated)
    }
}

impl Write for LevelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = String::from_utf8_lossy(buf);
        if let Some(resolved) = self.scanner.push(&chunk) {
            self.emit(resolved)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.logger.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggerOpts, LoggerType};
    use crate::testing::{fixed_time, FailingWriter, SharedBuffer};

    fn json_writer(buffer: &SharedBuffer) -> LevelWriter {
        let opts = LoggerOpts::new(LoggerType::Json, Box::new(buffer.clone()))
            .with_debug(true)
            .with_time_provider(fixed_time());
        LevelWriter::new(Logger::new(opts))
    }

    fn console_writer(buffer: &SharedBuffer) -> LevelWriter {
        let opts = LoggerOpts::new(LoggerType::Console, Box::new(buffer.clone()))
            .with_debug(true)
            .with_time_provider(fixed_time());
        LevelWriter::new(Logger::new(opts))
    }

    fn json_line(level: &str, message: &str) -> String {
        format!(
            "{{\"timestamp\":\"0001-01-01T00:00:00Z\",\"type\":\"log\",\"producer\":\"\",\"level\":\"{}\",\"message\":{}}}\n",
            level,
            serde_json::Value::String(message.to_string())
        )
    }

    /// Writes each message and collects what the sink saw after every write.
    fn run(writer: &mut LevelWriter, buffer: &SharedBuffer, messages: &[&str]) -> Vec<String> {
        let mut actual = Vec::new();
        for message in messages {
            writer.write_all(message.as_bytes()).unwrap();
            let out = buffer.take();
            if !out.is_empty() {
                actual.push(out);
            }
        }
        writer.finish().unwrap();
        let out = buffer.take();
        if !out.is_empty() {
            actual.push(out);
        }
        actual
    }

    #[test]
    fn test_writes_normal_level_by_default() {
        let buffer = SharedBuffer::new();
        let mut writer = json_writer(&buffer);
        assert_eq!(
            run(&mut writer, &buffer, &["Hello!"]),
            vec![json_line("normal", "Hello!")]
        );
    }

    #[test]
    fn test_detects_log_level() {
        let buffer = SharedBuffer::new();
        let mut writer = json_writer(&buffer);
        assert_eq!(
            run(&mut writer, &buffer, &["\x1b[34;1mLogin\x1b[0m"]),
            vec![json_line("info", "Login")]
        );
    }

    #[test]
    fn test_detects_each_level() {
        let cases = [
            ("\x1b[31;1mThis is an error\x1b[0m", "error", "This is an error"),
            ("\x1b[33;1mThis is a warning\x1b[0m", "warn", "This is a warning"),
            ("\x1b[34;1mThis is an Info\x1b[0m", "info", "This is an Info"),
            ("\x1b[32;1mThis is a done message\x1b[0m", "done", "This is a done message"),
            ("\x1b[35;1mThis is a debug message\x1b[0m", "debug", "This is a debug message"),
        ];

        for (input, level, message) in cases {
            let buffer = SharedBuffer::new();
            let mut writer = json_writer(&buffer);
            assert_eq!(
                run(&mut writer, &buffer, &[input]),
                vec![json_line(level, message)],
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_detects_level_across_writes() {
        let buffer = SharedBuffer::new();
        let mut writer = json_writer(&buffer);
        let actual = run(
            &mut writer,
            &buffer,
            &["\x1b[35;1mline1", "line2", "line3\x1b[0m"],
        );
        assert_eq!(actual, vec![json_line("debug", "line1\nline2\nline3")]);
    }

    #[test]
    fn test_records_keep_arrival_order() {
        let buffer = SharedBuffer::new();
        let mut writer = json_writer(&buffer);
        let actual = run(
            &mut writer,
            &buffer,
            &[
                "Hello!",
                "\x1b[35;1mdetected login method:",
                "- API key",
                "- username\x1b[0m",
                "\x1b[34;1mLogin to the service\x1b[0m",
            ],
        );
        assert_eq!(
            actual,
            vec![
                json_line("normal", "Hello!"),
                json_line("debug", "detected login method:\n- API key\n- username"),
                json_line("info", "Login to the service"),
            ]
        );
    }

    #[test]
    fn test_unclosed_message_released_on_finish() {
        let buffer = SharedBuffer::new();
        let mut writer = json_writer(&buffer);
        assert_eq!(
            run(&mut writer, &buffer, &["\x1b[31;1mAnother error\n"]),
            vec![json_line("normal", "\x1b[31;1mAnother error\n")]
        );
    }

    #[test]
    fn test_leading_whitespace_is_not_leveled() {
        let buffer = SharedBuffer::new();
        let mut writer = json_writer(&buffer);
        let input = "  \x1b[31;1mLast error\x1b[0m   \n";
        assert_eq!(
            run(&mut writer, &buffer, &[input]),
            vec![json_line("normal", input)]
        );
    }

    #[test]
    fn test_empty_and_newline_writes() {
        let buffer = SharedBuffer::new();
        let mut writer = json_writer(&buffer);
        assert!(run(&mut writer, &buffer, &[""]).is_empty());
        assert_eq!(
            run(&mut writer, &buffer, &["\n"]),
            vec![json_line("normal", "\n")]
        );
    }

    #[test]
    fn test_console_output_keeps_colours() {
        let buffer = SharedBuffer::new();
        let mut writer = console_writer(&buffer);
        let actual = run(
            &mut writer,
            &buffer,
            &[
                "Hello!",
                "\x1b[35;1mdetected login method:",
                "- API key",
                "- username\x1b[0m",
            ],
        );
        assert_eq!(
            actual,
            vec![
                "Hello!".to_string(),
                "\x1b[35;1mdetected login method:\n- API key\n- username\x1b[0m".to_string(),
            ]
        );
    }

    #[test]
    fn test_finish_twice_is_noop() {
        let buffer = SharedBuffer::new();
        let mut writer = json_writer(&buffer);
        writer.finish().unwrap();
        writer.finish().unwrap();
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_sink_failure_propagates() {
        let opts = LoggerOpts::new(LoggerType::Json, Box::new(FailingWriter))
            .with_time_provider(fixed_time());
        let mut writer = LevelWriter::new(Logger::new(opts));
        let err = writer.write(b"Hello!").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
