//! Report command handler

use crate::{CliError, CliResult, ReportArgs};
use headless_harness::{write_reports, Collector, HostConsole, ReportRegistry, RunConfig, WrittenReport};
use std::path::PathBuf;

/// Execute the report command
pub fn execute_report(
    args: &ReportArgs,
    console: &dyn HostConsole,
) -> CliResult<Vec<WrittenReport>> {
    let mut config = RunConfig::from_path(&args.config)?;
    if !args.format.is_empty() {
        config.code_coverage.report_type.clone_from(&args.format);
    }
    if let Some(output) = &args.output {
        config.code_coverage.dir = Some(output.clone());
    }
    if config.code_coverage.report_type.is_empty() {
        return Err(CliError::invalid_argument(
            "no report formats: set codeCoverage.reportType or pass --format",
        ));
    }

    let registry = ReportRegistry::default();
    registry.ensure_known(&config.code_coverage.report_type)?;

    let collector = load_dumps(&args.coverage)?;
    tracing::info!(
        dumps = args.coverage.len(),
        files = collector.files().len(),
        "merged coverage dumps"
    );
    Ok(write_reports(&collector, &config, &registry, console)?)
}

/// Merge raw `__coverage__` JSON dumps
pub fn load_dumps(paths: &[PathBuf]) -> CliResult<Collector> {
    let mut collector = Collector::new();
    for path in paths {
        let dump_error = |message: String| CliError::CoverageDump {
            path: path.display().to_string(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| dump_error(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| dump_error(e.to_string()))?;
        collector
            .add_value(value)
            .map_err(|e| dump_error(e.to_string()))?;
    }
    Ok(collector)
}
