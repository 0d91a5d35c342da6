//! ANSI colour markers that delimit leveled messages

use crate::log::Level;
use once_cell::sync::Lazy;
use regex::Regex;

pub const ERROR: &str = "\x1b[31;1m";
pub const WARN: &str = "\x1b[33;1m";
pub const INFO: &str = "\x1b[34;1m";
pub const DONE: &str = "\x1b[32;1m";
pub const DEBUG: &str = "\x1b[35;1m";
pub const RESET: &str = "\x1b[0m";

const OPENING: [(&str, Level); 5] = [
    (ERROR, Level::Error),
    (WARN, Level::Warn),
    (INFO, Level::Info),
    (DONE, Level::Done),
    (DEBUG, Level::Debug),
];

/// Opening marker, then content, then the reset marker and at most one `\n`.
static LEVELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\x1b\[(?:31|33|34|32|35);1m(.*)\x1b\[0m\n?\z")
        .expect("leveled message pattern is valid")
});

pub fn opening_marker(level: Level) -> Option<&'static str> {
    OPENING
        .iter()
        .find(|(_, l)| *l == level)
        .map(|(marker, _)| *marker)
}

/// Level of the opening marker `text` starts with, if any.
pub fn opening_level(text: &str) -> Option<Level> {
    OPENING
        .iter()
        .find(|(marker, _)| text.starts_with(marker))
        .map(|(_, level)| *level)
}

/// Content of a complete leveled message, markers and terminator stripped.
pub fn leveled_content(text: &str) -> Option<&str> {
    LEVELED
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|content| content.as_str())
}
