//! Command handlers
//!
//! Handlers print through a [`HostConsole`](headless_harness::HostConsole) so
//! their output can be captured in tests.

pub mod clean;
pub mod plan;
pub mod report;

pub use clean::execute_clean;
pub use plan::{execute_plan, render_plan};
pub use report::{execute_report, load_dumps};
