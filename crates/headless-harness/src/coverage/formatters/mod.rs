//! Coverage Report Writers
//!
//! One writer per istanbul report name. Writers render the merged coverage of a
//! [`Collector`] into files under the coverage directory or onto the host
//! console.

mod clover;
mod cobertura;
mod html;
mod json;
mod lcov;
mod teamcity;
mod text;

pub use clover::CloverWriter;
pub use cobertura::CoberturaWriter;
pub use html::HtmlWriter;
pub use json::{JsonSummaryWriter, JsonWriter};
pub use lcov::LcovWriter;
pub use teamcity::TeamcityWriter;
pub use text::{TextSummaryWriter, TextWriter};

use crate::console::HostConsole;
use crate::coverage::Collector;
use crate::result::{HarnessError, HarnessResult};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Inputs shared by every writer
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    /// Merged coverage
    pub collector: &'a Collector,
    /// Directory reports are written to
    pub dir: &'a Path,
    /// Console for text-based reports
    pub console: &'a dyn HostConsole,
}

/// Renders one report format
pub trait ReportWriter: Debug + Send + Sync {
    /// Write the report; returns the files created (empty for console reports)
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>>;
}

/// Writer for the `none` format
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneWriter;

impl ReportWriter for NoneWriter {
    fn write(&self, _ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

/// A report that was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    /// Format name
    pub format: String,
    /// Files created
    pub files: Vec<PathBuf>,
}

/// Report writers by format name
#[derive(Debug)]
pub struct ReportRegistry {
    writers: BTreeMap<String, Box<dyn ReportWriter>>,
}

impl Default for ReportRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ReportRegistry {
    /// Registry without writers
    #[must_use]
    pub fn empty() -> Self {
        Self {
            writers: BTreeMap::new(),
        }
    }

    /// Registry with every built-in istanbul format
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("clover", Box::new(CloverWriter));
        registry.register("cobertura", Box::new(CoberturaWriter));
        registry.register("html", Box::new(HtmlWriter::new("")));
        registry.register("json", Box::new(JsonWriter));
        registry.register("json-summary", Box::new(JsonSummaryWriter));
        registry.register("lcov", Box::new(LcovWriter::with_html()));
        registry.register("lcovonly", Box::new(LcovWriter::new()));
        registry.register("none", Box::new(NoneWriter));
        registry.register("teamcity", Box::new(TeamcityWriter));
        registry.register("text", Box::new(TextWriter));
        registry.register("text-summary", Box::new(TextSummaryWriter));
        registry
    }

    /// Add or replace a writer
    pub fn register(&mut self, format: impl Into<String>, writer: Box<dyn ReportWriter>) {
        self.writers.insert(format.into(), writer);
    }

    /// Registered format names
    #[must_use]
    pub fn formats(&self) -> Vec<&str> {
        self.writers.keys().map(String::as_str).collect()
    }

    /// Fail on the first format without a writer
    pub fn ensure_known(&self, formats: &[String]) -> HarnessResult<()> {
        match formats.iter().find(|f| !self.writers.contains_key(f.as_str())) {
            Some(format) => Err(HarnessError::UnknownReportFormat {
                format: format.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Write each format once, in the order given
    pub fn write_all(
        &self,
        formats: &[String],
        ctx: &ReportContext<'_>,
    ) -> HarnessResult<Vec<WrittenReport>> {
        self.ensure_known(formats)?;
        let mut written: Vec<WrittenReport> = Vec::new();
        for format in formats {
            if written.iter().any(|w| &w.format == format) {
                continue;
            }
            let writer = self
                .writers
                .get(format.as_str())
                .ok_or_else(|| HarnessError::UnknownReportFormat {
                    format: format.clone(),
                })?;
            let files = writer.write(ctx).map_err(|e| match e {
                HarnessError::Coverage { .. } => e,
                other => HarnessError::coverage(format!("{format} report: {other}")),
            })?;
            tracing::debug!(%format, files = files.len(), "coverage report written");
            written.push(WrittenReport {
                format: format.clone(),
                files,
            });
        }
        Ok(written)
    }
}

/// Escape text for HTML/XML content and attributes
pub(crate) fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Last path component, for display
pub(crate) fn display_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Write `contents` to `dir/name`, creating `dir` if needed
pub(crate) fn write_report_file(dir: &Path, name: &str, contents: &str) -> HarnessResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}
