//! Command-line front end
//!
//! Parses arguments, resolves configuration and secrets, and drives a
//! [`crate::output::StepOutputWriter`] from an async reader under a hang
//! detector.

pub mod args;
pub mod run;

pub use args::Cli;
pub use run::{collect_secrets, resolve_config, run_pipeline, Outcome, HANG_EXIT_CODE};
