//! The structured record emitted once per resolved message

use super::level::{Level, Producer};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Source of timestamps for records. Tests pin it to a fixed instant.
pub type TimeProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_time_provider() -> TimeProvider {
    Arc::new(Utc::now)
}

/// Renders a timestamp the way records carry it, e.g. `0001-01-01T00:00:00Z`.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Log,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Log => "log",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub producer: Producer,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub producer_id: String,
    pub level: Level,
    pub message: String,
    /// The source line ended in a terminator that was stripped with the markers.
    #[serde(skip)]
    pub terminated: bool,
}

impl LogRecord {
    pub fn new(
        timestamp: String,
        producer: Producer,
        producer_id: impl Into<String>,
        level: Level,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            kind: MessageKind::Log,
            producer,
            producer_id: producer_id.into(),
            level,
            message: message.into(),
            terminated: false,
        }
    }

    pub fn with_terminator(mut self, terminated: bool) -> Self {
        self.terminated = terminated;
        self
    }
}
