//! LCOV Report Writer
//!
//! ## LCOV Format
//!
//! ```text
//! TN:<test name>
//! SF:<source file>
//! FN:<line>,<function name>
//! FNF:<functions found>
//! FNH:<functions hit>
//! FNDA:<execution count>,<function name>
//! DA:<line>,<execution count>
//! LF:<lines found>
//! LH:<lines hit>
//! BRDA:<line>,<block>,<branch>,<taken>
//! BRF:<branches found>
//! BRH:<branches hit>
//! end_of_record
//! ```

use super::{write_report_file, HtmlWriter, ReportContext, ReportWriter};
use crate::coverage::{Collector, FileCoverage};
use crate::result::HarnessResult;
use std::fmt::Write;
use std::path::PathBuf;

/// Writes `lcov.info`, optionally with an HTML report under `lcov-report/`
#[derive(Debug, Clone, Default)]
pub struct LcovWriter {
    html: Option<HtmlWriter>,
    test_name: Option<String>,
}

impl LcovWriter {
    /// `lcovonly`: the tracefile only
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `lcov`: tracefile plus HTML in `lcov-report/`
    #[must_use]
    pub fn with_html() -> Self {
        Self {
            html: Some(HtmlWriter::new("lcov-report")),
            test_name: None,
        }
    }

    /// Set the `TN:` test name
    #[must_use]
    pub fn with_test_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = Some(name.into());
        self
    }

    /// Render the tracefile
    #[must_use]
    pub fn generate(&self, collector: &Collector) -> String {
        let mut output = String::new();
        for file in collector.files().values() {
            self.write_record(&mut output, file);
        }
        output
    }

    fn write_record(&self, output: &mut String, file: &FileCoverage) {
        let _ = writeln!(output, "TN:{}", self.test_name.as_deref().unwrap_or(""));
        let _ = writeln!(output, "SF:{}", file.path);

        let functions = file.functions();
        for (name, line, _) in &functions {
            let _ = writeln!(output, "FN:{line},{name}");
        }
        let _ = writeln!(output, "FNF:{}", functions.len());
        let _ = writeln!(
            output,
            "FNH:{}",
            functions.iter().filter(|(_, _, hits)| *hits > 0).count()
        );
        for (name, _, hits) in &functions {
            let _ = writeln!(output, "FNDA:{hits},{name}");
        }

        let lines = file.line_hits();
        for (line, hits) in &lines {
            let _ = writeln!(output, "DA:{line},{hits}");
        }
        let _ = writeln!(output, "LF:{}", lines.len());
        let _ = writeln!(output, "LH:{}", lines.values().filter(|h| **h > 0).count());

        let mut found = 0;
        let mut hit = 0;
        for (block, line, arms) in file.branches() {
            for (branch, taken) in arms.iter().enumerate() {
                found += 1;
                if *taken > 0 {
                    hit += 1;
                    let _ = writeln!(output, "BRDA:{line},{block},{branch},{taken}");
                } else {
                    let _ = writeln!(output, "BRDA:{line},{block},{branch},-");
                }
            }
        }
        let _ = writeln!(output, "BRF:{found}");
        let _ = writeln!(output, "BRH:{hit}");
        output.push_str("end_of_record\n");
    }
}

impl ReportWriter for LcovWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        let mut files = vec![write_report_file(
            ctx.dir,
            "lcov.info",
            &self.generate(ctx.collector),
        )?];
        if let Some(html) = &self.html {
            files.extend(html.write(ctx)?);
        }
        Ok(files)
    }
}
