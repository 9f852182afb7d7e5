//! Cobertura XML Report Writer
//!
//! ```xml
//! <?xml version="1.0" ?>
//! <!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd">
//! <coverage lines-valid="3" lines-covered="2" line-rate="0.6667" branch-rate="0.5" ...>
//!   <packages>
//!     <package name="build" line-rate="0.6667" branch-rate="0.5">
//!       <classes>
//!         <class name="app.js" filename="/build/app.js" line-rate="0.6667" branch-rate="0.5">
//!           <methods>...</methods>
//!           <lines>
//!             <line number="1" hits="1" branch="false"/>
//!           </lines>
//!         </class>
//!       </classes>
//!     </package>
//!   </packages>
//! </coverage>
//! ```

use super::{display_name, escape_markup, write_report_file, ReportContext, ReportWriter};
use crate::coverage::{Collector, CoverageSummary, FileCoverage, Totals};
use crate::result::HarnessResult;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

/// Writes `cobertura-coverage.xml`
#[derive(Debug, Clone, Copy, Default)]
pub struct CoberturaWriter;

impl CoberturaWriter {
    /// Render the XML document
    #[must_use]
    pub fn generate(collector: &Collector) -> String {
        let total = collector.summary();
        let packages = Self::group_by_package(collector);

        let mut xml = String::from("<?xml version=\"1.0\" ?>\n");
        xml.push_str(
            "<!DOCTYPE coverage SYSTEM \"http://cobertura.sourceforge.net/xml/coverage-04.dtd\">\n",
        );
        let _ = writeln!(
            xml,
            r#"<coverage lines-valid="{}" lines-covered="{}" line-rate="{:.4}" branches-valid="{}" branches-covered="{}" branch-rate="{:.4}" timestamp="{}" complexity="0" version="0.1">"#,
            total.lines.total,
            total.lines.covered,
            rate(&total.lines),
            total.branches.total,
            total.branches.covered,
            rate(&total.branches),
            chrono::Utc::now().timestamp_millis(),
        );
        xml.push_str("  <sources>\n    <source>.</source>\n  </sources>\n");
        xml.push_str("  <packages>\n");

        for (package, files) in &packages {
            let summary = files
                .iter()
                .fold(CoverageSummary::default(), |acc, f| {
                    acc.combine(&CoverageSummary::of(f))
                });
            let _ = writeln!(
                xml,
                r#"    <package name="{}" line-rate="{:.4}" branch-rate="{:.4}">"#,
                escape_markup(package),
                rate(&summary.lines),
                rate(&summary.branches),
            );
            xml.push_str("      <classes>\n");
            for file in files {
                Self::write_class(&mut xml, file);
            }
            xml.push_str("      </classes>\n");
            xml.push_str("    </package>\n");
        }

        xml.push_str("  </packages>\n");
        xml.push_str("</coverage>\n");
        xml
    }

    fn write_class(xml: &mut String, file: &FileCoverage) {
        let summary = CoverageSummary::of(file);
        let _ = writeln!(
            xml,
            r#"        <class name="{}" filename="{}" line-rate="{:.4}" branch-rate="{:.4}">"#,
            escape_markup(display_name(&file.path)),
            escape_markup(&file.path),
            rate(&summary.lines),
            rate(&summary.branches),
        );

        xml.push_str("          <methods>\n");
        for (name, line, hits) in file.functions() {
            let _ = writeln!(
                xml,
                r#"            <method name="{}" hits="{hits}" signature="()V">"#,
                escape_markup(name),
            );
            let _ = writeln!(
                xml,
                r#"              <lines><line number="{line}" hits="{hits}"/></lines>"#
            );
            xml.push_str("            </method>\n");
        }
        xml.push_str("          </methods>\n");

        let branch_lines: BTreeMap<u32, Vec<u64>> = file
            .branches()
            .into_iter()
            .fold(BTreeMap::new(), |mut acc, (_, line, arms)| {
                acc.entry(line).or_insert_with(Vec::new).extend(arms);
                acc
            });

        xml.push_str("          <lines>\n");
        for (line, hits) in file.line_hits() {
            match branch_lines.get(&line) {
                Some(arms) if !arms.is_empty() => {
                    let taken = arms.iter().filter(|h| **h > 0).count();
                    let pct = taken * 100 / arms.len();
                    let _ = writeln!(
                        xml,
                        r#"            <line number="{line}" hits="{hits}" branch="true" condition-coverage="{pct}% ({taken}/{})"/>"#,
                        arms.len()
                    );
                }
                _ => {
                    let _ = writeln!(
                        xml,
                        r#"            <line number="{line}" hits="{hits}" branch="false"/>"#
                    );
                }
            }
        }
        xml.push_str("          </lines>\n");
        xml.push_str("        </class>\n");
    }

    /// Files grouped by parent directory
    fn group_by_package(collector: &Collector) -> BTreeMap<String, Vec<&FileCoverage>> {
        let mut packages: BTreeMap<String, Vec<&FileCoverage>> = BTreeMap::new();
        for file in collector.files().values() {
            let package = file
                .path
                .rsplit_once(['/', '\\'])
                .map_or("", |(dir, _)| dir)
                .trim_start_matches(['/', '\\'])
                .replace(['/', '\\'], ".");
            let package = if package.is_empty() {
                "main".to_string()
            } else {
                package
            };
            packages.entry(package).or_default().push(file);
        }
        packages
    }
}

fn rate(totals: &Totals) -> f64 {
    if totals.total == 0 {
        1.0
    } else {
        totals.covered as f64 / totals.total as f64
    }
}

impl ReportWriter for CoberturaWriter {
    fn write(&self, ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        Ok(vec![write_report_file(
            ctx.dir,
            "cobertura-coverage.xml",
            &Self::generate(ctx.collector),
        )?])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::coverage::fixtures::sample_collector;

    #[test]
    fn test_generate_structure() {
        let xml = CoberturaWriter::generate(&sample_collector());

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<!DOCTYPE coverage"));
        assert!(xml.contains(r#"<package name="build""#));
        assert!(xml.contains(r#"<class name="app.js" filename="/build/app.js""#));
        assert!(xml.contains(r#"<method name="init" hits="1""#));
        assert!(xml.contains(r#"<line number="2" hits="4" branch="false"/>"#));
        assert!(xml.ends_with("</coverage>\n"));
    }

    #[test]
    fn test_rates() {
        let xml = CoberturaWriter::generate(&sample_collector());
        assert!(xml.contains(r#"lines-valid="2" lines-covered="2" line-rate="1.0000""#));
        assert!(xml.contains(r#"branches-valid="2" branches-covered="1" branch-rate="0.5000""#));
    }

    #[test]
    fn test_empty_collector() {
        let xml = CoberturaWriter::generate(&Collector::new());
        assert!(xml.contains(r#"line-rate="1.0000""#));
        assert!(xml.contains("<packages>\n  </packages>"));
    }
}
