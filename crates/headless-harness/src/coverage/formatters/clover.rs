//! Clover XML report.

use super::{display_name, escape_markup, write_report_file, ReportContext, ReportWriter};
use crate::coverage::{Collector, CoverageSummary, FileCoverage};
use crate::result::HarnessResult;
use std::fmt::Write;
use std::path::PathBuf;

/// Writes `clover.xml`
#[derive(Debug, Clone, Copy, Default)]
pub struct CloverWriter;

impl CloverWriter {
    /// Render the XML document
    #[must_use]
    pub fn generate(collector: &Collector) -> String {
        let now = chrono::Utc::now().timestamp();
        let total = collector.summary();

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            xml,
            r#"<coverage generated="{now}" clover="3.2.0">"#
        );
        let _ = writeln!(
            xml,
            r#"  <project timestamp="{now}" name="All files">"#
        );
        let _ = writeln!(
            xml,
            "    {}",
            metrics(&total, Some(collector.files().len()))
        );
        for file in collector.files().values() {
            Self::write_file(&mut xml, file);
        }
        xml.push_str("  </project>\n");
        xml.push_str("</coverage>\n");
        xml
    }

    fn write_file(xml: &mut String, file: &FileCoverage) {
        let _ = writeln!(
            xml,
            r#"    <file name="{}" path="{}">"#,
            escape_markup(display_name(&file.path)),
            escape_markup(&file.path),
        );
        let _ = writeln!(xml, "      {}", metrics(&CoverageSummary::of(file), None));
        for (line, count) in file.line_hits() {
            let _ = writeln!(
                xml,
                r#"      <line num="{line}" count="{count}" type="stmt"/>"#
            );
        }
        xml.push_str("    </file>\n");
    }
}

fn metrics(summary: &CoverageSummary, files: Option<usize>) -> String {
    let mut out = format!(
        r#"<metrics statements="{}" coveredstatements="{}" conditionals="{}" coveredconditionals="{}" methods="{}" coveredmethods="{}" elements="{}" coveredelements="{}" complexity="0" loc="{}" ncloc="{}""#,
        summary.lines.total,
        summary.lines.covered,
        summary.branches.total,
        summary.branches.covered,
        summary.functions.total,
        summary.functions.covered,
        summary.lines.total + summary.branches.total + summary.functions.total,
        summary.lines.covered + summary.branches.covered + summary.functions.covered,
        summary.lines.total,
        summary.lines.total,
    );
    if let Some(files) = files {
        let _ = write!(out, r#" packages="1" files="{files}" classes="{files}""#);
    }
    out.push_str("/>");
    out
}

impl ReportWriter for CloverWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        Ok(vec![write_report_file(
            ctx.dir,
            "clover.xml",
            &Self::generate(ctx.collector),
        )?])
    }
}
