//! HTML report: an index table plus one annotated page per source file.
//!
//! Source text is read back from the path coverage is attributed to, which is
//! why application units are persisted before instrumentation. When a source
//! can no longer be read the page lists hit counts per line only.

use super::{display_name, escape_markup, write_report_file, ReportContext, ReportWriter};
use crate::coverage::{CoverageSummary, FileCoverage, Totals};
use crate::result::HarnessResult;
use crate::temp_files::identity_hash;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const PAGE_HASH_LEN: usize = 8;

const STYLE: &str = "body{font-family:sans-serif;margin:1em}\
table{border-collapse:collapse}td,th{padding:2px 8px;border-bottom:1px solid #ddd}\
.high{background:#e6f5d0}.medium{background:#fff4c2}.low{background:#fce1e5}\
.hit{background:#e6f5d0}.miss{background:#fce1e5}pre{margin:0}";

/// HTML report writer
#[derive(Debug, Clone, Default)]
pub struct HtmlWriter {
    subdir: String,
}

impl HtmlWriter {
    /// Write into `subdir` of the coverage directory (empty for the directory
    /// itself)
    #[must_use]
    pub fn new(subdir: impl Into<String>) -> Self {
        Self {
            subdir: subdir.into(),
        }
    }

    /// File name of the page for a source path.
    ///
    /// The readable part is lossy, so a short hash of the full path keeps
    /// pages distinct from each other and from `index.html`.
    #[must_use]
    pub fn page_name(path: &str) -> String {
        let sanitized: String = path
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let hash = identity_hash(Path::new(path));
        format!(
            "{}.{}.html",
            sanitized.trim_start_matches('_'),
            &hash[..PAGE_HASH_LEN]
        )
    }

    fn render_index(summaries: &[(&str, CoverageSummary)], total: &CoverageSummary) -> String {
        let mut html = page_head("All files");
        let _ = write!(
            html,
            "<h1>All files</h1>\n<p>Statements {} | Branches {} | Functions {} | Lines {}</p>\n",
            fraction(&total.statements),
            fraction(&total.branches),
            fraction(&total.functions),
            fraction(&total.lines),
        );
        html.push_str(
            "<table>\n<tr><th>File</th><th>Statements</th><th>Branches</th>\
             <th>Functions</th><th>Lines</th></tr>\n",
        );
        for (path, summary) in summaries {
            let _ = writeln!(
                html,
                "<tr><td><a href=\"{}\">{}</a></td>{}{}{}{}</tr>",
                escape_markup(&Self::page_name(path)),
                escape_markup(path),
                cell(&summary.statements),
                cell(&summary.branches),
                cell(&summary.functions),
                cell(&summary.lines),
            );
        }
        html.push_str("</table>\n");
        html.push_str(&page_foot());
        html
    }

    fn render_file(file: &FileCoverage) -> String {
        let summary = CoverageSummary::of(file);
        let hits = file.line_hits();
        let mut html = page_head(display_name(&file.path));
        let _ = write!(
            html,
            "<h1><a href=\"index.html\">All files</a> / {}</h1>\n\
             <p>Statements {} | Branches {} | Functions {} | Lines {}</p>\n<table>\n",
            escape_markup(&file.path),
            fraction(&summary.statements),
            fraction(&summary.branches),
            fraction(&summary.functions),
            fraction(&summary.lines),
        );

        if let Ok(source) = std::fs::read_to_string(&file.path) {
            for (index, text) in source.lines().enumerate() {
                let line = u32::try_from(index + 1).unwrap_or(u32::MAX);
                let (class, count) = match hits.get(&line) {
                    Some(0) => ("miss", "0".to_string()),
                    Some(n) => ("hit", format!("{n}x")),
                    None => ("", String::new()),
                };
                let _ = writeln!(
                    html,
                    "<tr class=\"{class}\"><td>{line}</td><td>{count}</td><td><pre>{}</pre></td></tr>",
                    escape_markup(text)
                );
            }
        } else {
            html.push_str("<tr><td colspan=\"3\">source not available</td></tr>\n");
            for (line, count) in &hits {
                let class = if *count > 0 { "hit" } else { "miss" };
                let _ = writeln!(
                    html,
                    "<tr class=\"{class}\"><td>{line}</td><td>{count}x</td><td></td></tr>"
                );
            }
        }
        html.push_str("</table>\n");
        html.push_str(&page_foot());
        html
    }
}

impl ReportWriter for HtmlWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        let dir = if self.subdir.is_empty() {
            ctx.dir.to_path_buf()
        } else {
            ctx.dir.join(&self.subdir)
        };

        let summaries = ctx.collector.file_summaries();
        let mut files = vec![write_report_file(
            &dir,
            "index.html",
            &Self::render_index(&summaries, &ctx.collector.summary()),
        )?];
        for (path, file) in ctx.collector.files() {
            files.push(write_report_file(
                &dir,
                &Self::page_name(path),
                &Self::render_file(file),
            )?);
        }
        Ok(files)
    }
}

fn page_head(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Code coverage report for {}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n",
        escape_markup(title)
    )
}

fn page_foot() -> String {
    format!(
        "<p>Generated {}</p>\n</body>\n</html>\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn fraction(totals: &Totals) -> String {
    format!("{}% ({}/{})", totals.pct, totals.covered, totals.total)
}

fn cell(totals: &Totals) -> String {
    let class = if totals.pct >= 80.0 {
        "high"
    } else if totals.pct >= 50.0 {
        "medium"
    } else {
        "low"
    };
    format!("<td class=\"{class}\">{}</td>", fraction(totals))
}
