//! Configuration for the step output pipeline
//!
//! [`StepOutputConfig`] is the serializable form read from `config.toml` and
//! the environment; [`LoggerOpts`] is the runtime form that additionally owns
//! the output writer and the time provider.

use crate::error::{Error, Result};
use crate::log::{system_time_provider, Producer, TimeProvider};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the default location of the config file, e.g. `~/.config/steplog/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "steplog", "steplog").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Encoding used for emitted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoggerType {
    /// Newline-delimited JSON records
    Json,
    /// Plain text, re-coloured by level
    Console,
}

impl Default for LoggerType {
    fn default() -> Self {
        Self::Console
    }
}

impl std::str::FromStr for LoggerType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LoggerType::Json),
            "console" => Ok(LoggerType::Console),
            _ => Err(format!("Unknown logger type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleOpts {
    /// Prefix each console message with `[HH:MM:SS] `
    #[serde(default)]
    pub timestamps: bool,
}

/// Hang detection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangConfig {
    /// Consecutive silent ticks before the liveness-lost signal fires
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Time between ticks
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,
}

fn default_threshold() -> u32 {
    5
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for HangConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            tick_interval: default_tick_interval(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutputConfig {
    #[serde(default)]
    pub logger_type: LoggerType,
    #[serde(default)]
    pub producer: Producer,
    #[serde(default)]
    pub producer_id: Option<String>,
    #[serde(default)]
    pub debug_log_enabled: bool,
    #[serde(default)]
    pub console: ConsoleOpts,
    #[serde(default)]
    pub hang: HangConfig,
}

impl StepOutputConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StepOutputConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hang.threshold == 0 {
            return Err(Error::Config("hang.threshold must be at least 1".to_string()));
        }
        if self.hang.tick_interval.is_zero() {
            return Err(Error::Config("hang.tick_interval must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_env_vars_from(|key| std::env::var(key).ok())
    }

    /// Apply `STEPLOG_*` overrides using `lookup` as the environment.
    pub fn merge_env_vars_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(logger_type) = lookup("STEPLOG_LOGGER_TYPE") {
            self.logger_type = logger_type.parse().map_err(Error::Config)?;
        }

        if let Some(producer_id) = lookup("STEPLOG_PRODUCER_ID") {
            self.producer_id = Some(producer_id);
        }

        if let Some(debug) = lookup("STEPLOG_DEBUG") {
            self.debug_log_enabled = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }

    /// Runtime options writing to `writer` with wall-clock timestamps.
    pub fn logger_opts(&self, writer: Box<dyn Write + Send>) -> LoggerOpts {
        LoggerOpts {
            logger_type: self.logger_type,
            producer: self.producer,
            producer_id: self.producer_id.clone().unwrap_or_default(),
            debug_log_enabled: self.debug_log_enabled,
            console: self.console.clone(),
            writer,
            time_provider: system_time_provider(),
        }
    }
}

/// Everything a [`crate::log::Logger`] needs at runtime.
pub struct LoggerOpts {
    pub logger_type: LoggerType,
    pub producer: Producer,
    pub producer_id: String,
    pub debug_log_enabled: bool,
    pub console: ConsoleOpts,
    pub writer: Box<dyn Write + Send>,
    pub time_provider: TimeProvider,
}

impl LoggerOpts {
    pub fn new(logger_type: LoggerType, writer: Box<dyn Write + Send>) -> Self {
        Self {
            logger_type,
            producer: Producer::Unspecified,
            producer_id: String::new(),
            debug_log_enabled: false,
            console: ConsoleOpts::default(),
            writer,
            time_provider: system_time_provider(),
        }
    }

    pub fn with_producer(mut self, producer: Producer, producer_id: impl Into<String>) -> Self {
        self.producer = producer;
        self.producer_id = producer_id.into();
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_log_enabled = enabled;
        self
    }

    pub fn with_time_provider(mut self, time_provider: TimeProvider) -> Self {
        self.time_provider = time_provider;
        self
    }
}
