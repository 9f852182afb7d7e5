//! `json` and `json-summary` reports.

use super::{write_report_file, ReportContext, ReportWriter};
use crate::coverage::CoverageSummary;
use crate::result::HarnessResult;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Writes the merged raw coverage to `coverage-final.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl ReportWriter for JsonWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        let json = serde_json::to_string(ctx.collector.files())?;
        Ok(vec![write_report_file(ctx.dir, "coverage-final.json", &json)?])
    }
}

/// Writes totals and per-file summaries to `coverage-summary.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSummaryWriter;

impl ReportWriter for JsonSummaryWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        let mut summary: BTreeMap<String, CoverageSummary> = ctx
            .collector
            .file_summaries()
            .into_iter()
            .map(|(path, s)| (path.to_string(), s))
            .collect();
        summary.insert("total".to_string(), ctx.collector.summary());

        let json = serde_json::to_string(&summary)?;
        Ok(vec![write_report_file(ctx.dir, "coverage-summary.json", &json)?])
    }
}
