//! CLI argument structures

use crate::config::LoggerType;
use crate::log::Producer;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Pipe a build step's output through level detection and secret redaction
#[derive(Parser, Debug)]
#[command(name = "steplog")]
#[command(about = "steplog - Turn raw step output into leveled, redacted log records", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Record encoding
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<LoggerType>,

    /// Producer tag stamped on every record (cli, step)
    #[arg(long)]
    pub producer: Option<Producer>,

    /// Producer id stamped on every record
    #[arg(long)]
    pub producer_id: Option<String>,

    /// Emit debug-level records
    #[arg(long)]
    pub debug: bool,

    /// Secret value to redact (repeatable)
    #[arg(long = "secret", value_name = "VALUE")]
    pub secrets: Vec<String>,

    /// Environment variable holding a secret to redact (repeatable)
    #[arg(long = "secret-env", value_name = "NAME")]
    pub secret_envs: Vec<String>,

    /// JSON file with an array of secrets
    #[arg(long, value_name = "PATH")]
    pub secrets_file: Option<PathBuf>,

    /// Silent ticks before the step counts as hung
    #[arg(long, value_name = "N")]
    pub hang_ticks: Option<u32>,

    /// Time between hang detector ticks, e.g. "30s" or "1m"
    #[arg(long, value_name = "DURATION", value_parser = humantime_serde::re::humantime::parse_duration)]
    pub tick_interval: Option<Duration>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Filter directive for diagnostics on stderr.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}
