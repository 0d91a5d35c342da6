//! Stream stages for a step's raw output
//!
//! Each stage is an [`std::io::Write`] so they stack like any other writer.
//! End of stream is signalled with `finish()`; `flush()` never releases
//! buffered state.

pub mod error_finder;
pub mod level_writer;
pub mod markers;
pub mod scanner;
pub mod secret_filter;
pub mod step_writer;

pub use error_finder::{ErrorFinder, ErrorMessages};
pub use level_writer::LevelWriter;
pub use scanner::{LevelScanner, Resolved, ScannerState};
pub use secret_filter::{is_redactable, SecretFilter, REDACTED};
pub use step_writer::StepOutputWriter;
