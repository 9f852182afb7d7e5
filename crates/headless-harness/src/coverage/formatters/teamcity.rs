//! TeamCity service messages.

use super::{ReportContext, ReportWriter};
use crate::coverage::CoverageSummary;
use crate::result::HarnessResult;
use std::path::PathBuf;

const BLOCK_NAME: &str = "Code Coverage Summary";

/// Prints `##teamcity[...]` build statistics to the host console
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamcityWriter;

impl TeamcityWriter {
    /// Service message lines
    #[must_use]
    pub fn render(total: &CoverageSummary) -> Vec<String> {
        let stats = [
            ("CodeCoverageAbsLCovered", total.lines.covered),
            ("CodeCoverageAbsLTotal", total.lines.total),
            ("CodeCoverageAbsBCovered", total.branches.covered),
            ("CodeCoverageAbsBTotal", total.branches.total),
            ("CodeCoverageAbsMCovered", total.functions.covered),
            ("CodeCoverageAbsMTotal", total.functions.total),
            ("CodeCoverageAbsSCovered", total.statements.covered),
            ("CodeCoverageAbsSTotal", total.statements.total),
        ];

        let mut lines = vec![
            String::new(),
            format!("##teamcity[blockOpened name='{BLOCK_NAME}']"),
        ];
        lines.extend(stats.iter().map(|(key, value)| {
            format!("##teamcity[buildStatisticValue key='{key}' value='{value}']")
        }));
        lines.push(format!("##teamcity[blockClosed name='{BLOCK_NAME}']"));
        lines
    }
}

impl ReportWriter for TeamcityWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        for line in Self::render(&ctx.collector.summary()) {
            ctx.console.log(&line);
        }
        Ok(Vec::new())
    }
}
