//! Drives a step output pipeline from an async byte source

use super::args::Cli;
use crate::config::{default_config_path, StepOutputConfig};
use crate::error::{Error, Result};
use crate::hang::{HangDetector, TickSource};
use crate::output::StepOutputWriter;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

/// Exit code used when the step stops producing output, as `timeout(1)` does.
pub const HANG_EXIT_CODE: i32 = 124;

const READ_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Input reached end of stream
    Completed { errors: Vec<String> },
    /// The hang detector fired before end of stream
    Hung { errors: Vec<String> },
}

impl Outcome {
    pub fn errors(&self) -> &[String] {
        match self {
            Outcome::Completed { errors } | Outcome::Hung { errors } => errors,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed { .. } => 0,
            Outcome::Hung { .. } => HANG_EXIT_CODE,
        }
    }
}

/// File, then `STEPLOG_*` environment, then command-line flags.
pub fn resolve_config(cli: &Cli) -> Result<StepOutputConfig> {
    let mut config = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Some(path) => StepOutputConfig::load(path)?,
        None => match default_config_path() {
            Some(path) => StepOutputConfig::load(&path)?,
            None => StepOutputConfig::default(),
        },
    };
    config.merge_env_vars()?;
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut StepOutputConfig, cli: &Cli) {
    if let Some(format) = cli.format {
        config.logger_type = format;
    }
    if let Some(producer) = cli.producer {
        config.producer = producer;
    }
    if let Some(producer_id) = &cli.producer_id {
        config.producer_id = Some(producer_id.clone());
    }
    if cli.debug {
        config.debug_log_enabled = true;
    }
    if let Some(threshold) = cli.hang_ticks {
        config.hang.threshold = threshold;
    }
    if let Some(interval) = cli.tick_interval {
        config.hang.tick_interval = interval;
    }
}

pub fn collect_secrets(cli: &Cli) -> Result<Vec<String>> {
    collect_secrets_from(cli, |name| std::env::var(name).ok())
}

/// Gathers `--secret`, `--secret-env` and `--secrets-file` values in that order.
pub fn collect_secrets_from<F>(cli: &Cli, lookup: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut secrets = cli.secrets.clone();

    for name in &cli.secret_envs {
        let value = lookup(name).ok_or_else(|| {
            Error::Config(format!("secret environment variable {} is not set", name))
        })?;
        secrets.push(value);
    }

    if let Some(path) = &cli.secrets_file {
        let content = std::fs::read_to_string(path)?;
        let from_file: Vec<String> = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} secret(s) from {}",
            from_file.len(),
            path.display()
        );
        secrets.extend(from_file);
    }

    Ok(secrets)
}

/// Feeds `input` line by line into `output` until end of stream or a hang.
///
/// Every read counts as activity for the hang detector, even one without a
/// line break. The pipeline is finished in both cases so held lines are still
/// released (redacted) before returning.
pub async fn run_pipeline<R, T>(
    mut input: R,
    output: StepOutputWriter,
    mut detector: HangDetector<T>,
) -> Result<Outcome>
where
    R: AsyncRead + Unpin,
    T: TickSource,
{
    let mut sink = detector.wrap_sink(LineSplitter::new(output));
    detector.start();

    let mut chunk = vec![0u8; READ_BUFFER_SIZE];

    let hung = loop {
        tokio::select! {
            read = input.read(&mut chunk) => {
                let n = read?;
                if n == 0 {
                    break false;
                }
                sink.write_all(&chunk[..n])?;
            }
            Some(()) = detector.signal().recv() => {
                warn!("Step produced no output, treating it as hung");
                break true;
            }
        }
    };

    detector.stop().await;

    let mut output = sink.into_inner().finish()?;
    output.finish()?;
    let errors = output.error_messages();
    debug!("Pipeline finished with {} error message(s)", errors.len());

    Ok(if hung {
        Outcome::Hung { errors }
    } else {
        Outcome::Completed { errors }
    })
}

/// Hands complete lines downstream one write each, holding the partial tail.
struct LineSplitter<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> LineSplitter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    /// Writes the unterminated tail, if any, and returns the inner writer.
    fn finish(mut self) -> std::io::Result<W> {
        if !self.pending.is_empty() {
            self.inner.write_all(&self.pending)?;
        }
        Ok(self.inner)
    }
}

impl<W: Write> Write for LineSplitter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let Some(last) = buf.iter().rposition(|&b| b == b'\n') else {
            self.pending.extend_from_slice(buf);
            return Ok(buf.len());
        };

        self.pending.extend_from_slice(&buf[..=last]);
        for line in self.pending.split_inclusive(|&b| b == b'\n') {
            self.inner.write_all(line)?;
        }
        self.pending.clear();
        self.pending.extend_from_slice(&buf[last + 1..]);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
