//! Idle/Collecting state machine that resolves chunks into leveled messages

use super::markers;
use crate::log::Level;

/// A message whose level is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub level: Level,
    pub message: String,
    /// A trailing `\n` followed the reset marker and was stripped.
    pub terminated: bool,
}

impl Resolved {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            terminated: false,
        }
    }

    fn terminated(mut self, terminated: bool) -> Self {
        self.terminated = terminated;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScannerState {
    #[default]
    Idle,
    Collecting { level: Level, text: String },
}

/// Scans chunk-granular text for leveled messages.
///
/// A chunk that starts with an opening marker is held until the accumulated
/// text is exactly `marker + content + reset [+ "\n"]`. Anything else is
/// resolved immediately as [`Level::Normal`] with its bytes untouched.
#[derive(Debug, Default)]
pub struct LevelScanner {
    state: ScannerState,
}

impl LevelScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ScannerState::Idle)
    }

    pub fn push(&mut self, chunk: &str) -> Option<Resolved> {
        if chunk.is_empty() {
            return None;
        }

        match std::mem::take(&mut self.state) {
            ScannerState::Idle => match markers::opening_level(chunk) {
                Some(level) => self.collect(level, chunk.to_string()),
                None => Some(Resolved::new(Level::Normal, chunk)),
            },
            ScannerState::Collecting { level, mut text } => {
                // redactor output already carries its terminator
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(chunk);
                self.collect(level, text)
            }
        }
    }

    /// Releases held text as-is at end of stream, unleveled.
    pub fn finish(&mut self) -> Option<Resolved> {
        match std::mem::take(&mut self.state) {
            ScannerState::Idle => None,
            ScannerState::Collecting { text, .. } => Some(Resolved::new(Level::Normal, text)),
        }
    }

    fn collect(&mut self, level: Level, text: String) -> Option<Resolved> {
        if let Some(content) = markers::leveled_content(&text) {
            return Some(Resolved::new(level, content).terminated(text.ends_with('\n')));
        }
        self.state = ScannerState::Collecting { level, text };
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_chunk_resolves_unchanged() {
        let mut scanner = LevelScanner::new();
        assert_eq!(
            scanner.push("  spaced \x1b[0m\n"),
            Some(Resolved::new(Level::Normal, "  spaced \x1b[0m\n"))
        );
        assert!(scanner.is_idle());
    }

    #[test]
    fn test_single_chunk_leveled_message() {
        let mut scanner = LevelScanner::new();
        assert_eq!(
            scanner.push("\x1b[31;1mThis is an error\x1b[0m"),
            Some(Resolved::new(Level::Error, "This is an error"))
        );
        assert!(scanner.is_idle());
    }

    #[test]
    fn test_collecting_joins_chunks_with_newline() {
        let mut scanner = LevelScanner::new();
        assert_eq!(scanner.push("\x1b[35;1mdetected login method:"), None);
        assert_eq!(
            scanner.state(),
            &ScannerState::Collecting {
                level: Level::Debug,
                text: "\x1b[35;1mdetected login method:".to_string()
            }
        );
        assert_eq!(scanner.push("- API key"), None);
        assert_eq!(
            scanner.push("- username\x1b[0m"),
            Some(Resolved::new(
                Level::Debug,
                "detected login method:\n- API key\n- username"
            ))
        );
    }

    #[test]
    fn test_collecting_does_not_double_line_breaks() {
        let mut scanner = LevelScanner::new();
        assert_eq!(scanner.push("\x1b[33;1mfirst\n"), None);
        assert_eq!(
            scanner.push("second\x1b[0m\n"),
            Some(Resolved::new(Level::Warn, "first\nsecond").terminated(true))
        );
    }

    #[test]
    fn test_interior_marker_does_not_end_message() {
        let mut scanner = LevelScanner::new();
        assert_eq!(scanner.push("\x1b[34;1mpart \x1b[31;1mred\x1b[0m tail"), None);
        assert_eq!(
            scanner.push("end\x1b[0m"),
            Some(Resolved::new(
                Level::Info,
                "part \x1b[31;1mred\x1b[0m tail\nend"
            ))
        );
    }

    #[test]
    fn test_unclosed_message_flushes_raw_as_normal() {
        let mut scanner = LevelScanner::new();
        assert_eq!(scanner.push("\x1b[31;1mAnother error\n"), None);
        assert_eq!(
            scanner.finish(),
            Some(Resolved::new(Level::Normal, "\x1b[31;1mAnother error\n"))
        );
        assert!(scanner.is_idle());
    }

    #[test]
    fn test_trailing_whitespace_after_reset_is_not_leveled() {
        let mut scanner = LevelScanner::new();
        assert_eq!(scanner.push("\x1b[31;1mLast error\x1b[0m   \n"), None);
        assert_eq!(
            scanner.finish(),
            Some(Resolved::new(Level::Normal, "\x1b[31;1mLast error\x1b[0m   \n"))
        );
    }

    #[test]
    fn test_finish_on_idle_is_noop() {
        let mut scanner = LevelScanner::new();
        assert_eq!(scanner.finish(), None);
        assert_eq!(scanner.finish(), None);
    }

    #[test]
    fn test_empty_chunk_is_ignored_in_every_state() {
        let mut scanner = LevelScanner::new();
        assert_eq!(scanner.push(""), None);
        assert!(scanner.is_idle());

        scanner.push("\x1b[33;1mopen");
        assert_eq!(scanner.push(""), None);
        assert_eq!(
            scanner.push("close\x1b[0m"),
            Some(Resolved::new(Level::Warn, "open\nclose"))
        );
    }
}
