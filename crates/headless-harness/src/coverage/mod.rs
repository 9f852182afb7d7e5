//! Code Coverage
//!
//! Istanbul-format counters published by instrumented application scripts
//! on the document's [`COVERAGE_GLOBAL`] are merged by a [`Collector`],
//! summarized, and rendered by the writers of a [`ReportRegistry`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌────────────────┐   ┌──────────────┐
//! │ __coverage__ │──►│  Collector  │──►│ ReportRegistry │──►│ coverage dir │
//! │  (window)    │   │  (merge)    │   │  (per format)  │   │ / console    │
//! └──────────────┘   └─────────────┘   └────────────────┘   └──────────────┘
//! ```

mod collector;
pub mod formatters;
mod model;
mod summary;

pub use collector::Collector;
pub use formatters::{ReportContext, ReportRegistry, ReportWriter, WrittenReport};
pub use model::{BranchMeta, CoverageMap, FileCoverage, FunctionMeta, Position, Range};
pub use summary::{percent, CoverageSummary, Totals};

use crate::config::RunConfig;
use crate::console::HostConsole;
use crate::environment::{Window, COVERAGE_GLOBAL};
use crate::result::{HarnessError, HarnessResult};
use crate::temp_files::ensure_dir;

/// Collect the document's coverage and write every configured report.
///
/// A document without counters yields empty reports.
pub fn aggregate(
    window: &dyn Window,
    config: &RunConfig,
    registry: &ReportRegistry,
    console: &dyn HostConsole,
) -> HarnessResult<Vec<WrittenReport>> {
    registry.ensure_known(&config.code_coverage.report_type)?;

    let mut collector = Collector::new();
    match window.global(COVERAGE_GLOBAL) {
        Some(raw) => collector.add_value(raw)?,
        None => tracing::warn!(
            global = COVERAGE_GLOBAL,
            "coverage is active but the document published no counters"
        ),
    }
    write_reports(&collector, config, registry, console)
}

/// Write the configured reports for merged coverage.
///
/// Done messages are printed after all reports are written, once per format,
/// in `reportType` order.
pub fn write_reports(
    collector: &Collector,
    config: &RunConfig,
    registry: &ReportRegistry,
    console: &dyn HostConsole,
) -> HarnessResult<Vec<WrittenReport>> {
    let report_types = &config.code_coverage.report_type;
    let dir = config.coverage_dir();
    ensure_dir(dir).map_err(|e| HarnessError::coverage(e.to_string()))?;

    let ctx = ReportContext {
        collector,
        dir,
        console,
    };
    let written = registry.write_all(report_types, &ctx)?;
    tracing::info!(
        dir = %dir.display(),
        files = collector.files().len(),
        reports = written.len(),
        "coverage reports written"
    );

    for report in &written {
        if let Some(message) = config.done_message.get(&report.format) {
            console.log(message);
        }
    }
    Ok(written)
}
