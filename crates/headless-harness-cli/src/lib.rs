//! headless-harness CLI library
//!
//! ## Usage
//!
//! ```bash
//! headless-harness plan run.yaml                       # Script order and staged names
//! headless-harness report run.yaml cov-*.json          # Merge dumps, write reports
//! headless-harness report run.yaml cov.json -f lcov    # Override report formats
//! headless-harness clean run.yaml                      # Remove staged test files
//! ```

#![warn(missing_docs)]

mod commands;
mod error;
pub mod handlers;

pub use commands::{CleanArgs, Cli, Commands, PlanArgs, ReportArgs};
pub use error::{CliError, CliResult};
