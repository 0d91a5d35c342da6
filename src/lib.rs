//! # steplog
//!
//! Live output pipeline for CI build steps.
//!
//! ## Usage
//!
//! ```bash
//! ./build.sh 2>&1 | steplog --format json --secret-env API_TOKEN
//! ```
//!
//! ## Modules
//!
//! - `cli` - Command-line front end driving a pipeline from stdin
//! - `config` - TOML configuration, environment overrides and logger options
//! - `error` - Crate error type
//! - `hang` - Hang detection over a step's output sink
//! - `log` - Log levels, records, encoders and the logger
//! - `output` - Stream stages: level classifier, secret redactor, error extractor
//! - `testing` - Shared sinks and clocks for tests
pub mod cli;
pub mod config;
pub mod error;
pub mod hang;
pub mod log;
pub mod output;

pub mod testing;

pub use error::{Error, Result};
pub use output::StepOutputWriter;
