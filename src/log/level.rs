use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity attached to a resolved log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Normal,
    Info,
    Warn,
    Error,
    Done,
    Debug,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Normal => "normal",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Done => "done",
            Level::Debug => "debug",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Normal
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical source tag attached to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Producer {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    #[serde(rename = "cli")]
    Cli,
    #[serde(rename = "step")]
    Step,
}

impl Producer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Producer::Unspecified => "",
            Producer::Cli => "cli",
            Producer::Step => "step",
        }
    }
}

impl std::str::FromStr for Producer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" => Ok(Producer::Unspecified),
            "cli" => Ok(Producer::Cli),
            "step" => Ok(Producer::Step),
            _ => Err(format!("Unknown producer: {}", s)),
        }
    }
}
