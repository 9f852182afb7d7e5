//! Console reports: `text` (per-file table) and `text-summary` (totals).

use super::{ReportContext, ReportWriter};
use crate::coverage::{CoverageSummary, Totals};
use crate::result::HarnessResult;
use std::path::PathBuf;

const HEADERS: [&str; 4] = ["% Stmts", "% Branch", "% Funcs", "% Lines"];

/// Prints a per-file coverage table to the host console
#[derive(Debug, Clone, Copy, Default)]
pub struct TextWriter;

impl TextWriter {
    /// Table lines, header and separators included
    #[must_use]
    pub fn render(rows: &[(&str, CoverageSummary)], total: &CoverageSummary) -> Vec<String> {
        let name_width = rows
            .iter()
            .map(|(path, _)| path.len())
            .chain(std::iter::once("All files".len()))
            .max()
            .unwrap_or(0);

        let separator = {
            let mut line = "-".repeat(name_width + 1);
            for header in HEADERS {
                line.push('|');
                line.push_str(&"-".repeat(header.len() + 2));
            }
            line.push('|');
            line
        };

        let mut lines = vec![separator.clone()];
        let mut header = format!("{:<name_width$} ", "File");
        for h in HEADERS {
            header.push_str(&format!("| {h} "));
        }
        header.push('|');
        lines.push(header);
        lines.push(separator.clone());
        lines.push(row("All files", total, name_width));
        for (path, summary) in rows {
            lines.push(row(path, summary, name_width));
        }
        lines.push(separator);
        lines
    }
}

fn row(name: &str, summary: &CoverageSummary, name_width: usize) -> String {
    let cells = [
        summary.statements.pct,
        summary.branches.pct,
        summary.functions.pct,
        summary.lines.pct,
    ];
    let mut line = format!("{name:<name_width$} ");
    for (pct, header) in cells.iter().zip(HEADERS) {
        let width = header.len();
        line.push_str(&format!("| {pct:>width$} "));
    }
    line.push('|');
    line
}

impl ReportWriter for TextWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        let lines = Self::render(&ctx.collector.file_summaries(), &ctx.collector.summary());
        for line in &lines {
            ctx.console.log(line);
        }
        Ok(Vec::new())
    }
}

/// Prints run totals to the host console
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSummaryWriter;

impl TextSummaryWriter {
    /// Summary block lines
    #[must_use]
    pub fn render(total: &CoverageSummary) -> Vec<String> {
        vec![
            String::new(),
            "=============================== Coverage summary ===============================".to_string(),
            metric_line("Statements", &total.statements),
            metric_line("Branches", &total.branches),
            metric_line("Functions", &total.functions),
            metric_line("Lines", &total.lines),
            "================================================================================".to_string(),
        ]
    }
}

fn metric_line(label: &str, totals: &Totals) -> String {
    format!(
        "{label:<13}: {}% ( {}/{} )",
        totals.pct, totals.covered, totals.total
    )
}

impl ReportWriter for TextSummaryWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        for line in Self::render(&ctx.collector.summary()) {
            ctx.console.log(&line);
        }
        Ok(Vec::new())
    }
}
