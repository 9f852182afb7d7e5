//! Coverage summaries (statements, branches, functions, lines).

use super::model::FileCoverage;
use serde::{Deserialize, Serialize};

/// Covered/total counts for one metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Countable items
    pub total: usize,
    /// Items hit at least once
    pub covered: usize,
    /// Items excluded from coverage
    pub skipped: usize,
    /// Covered percentage, two decimals
    pub pct: f64,
}

impl Totals {
    /// Build totals and compute the percentage
    #[must_use]
    pub fn new(total: usize, covered: usize) -> Self {
        Self {
            total,
            covered,
            skipped: 0,
            pct: percent(covered, total),
        }
    }

    /// Sum of two totals
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self::new(self.total + other.total, self.covered + other.covered)
    }
}

/// Percentage rounded to two decimals; an empty metric counts as fully covered
#[must_use]
pub fn percent(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let scaled = 100_000.0 * covered as f64 / total as f64 + 5.0;
    (scaled / 10.0).floor() / 100.0
}

/// Summary of one file or of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Line coverage
    pub lines: Totals,
    /// Statement coverage
    pub statements: Totals,
    /// Function coverage
    pub functions: Totals,
    /// Branch arm coverage
    pub branches: Totals,
}

impl Default for CoverageSummary {
    fn default() -> Self {
        let empty = Totals::new(0, 0);
        Self {
            lines: empty,
            statements: empty,
            functions: empty,
            branches: empty,
        }
    }
}

impl CoverageSummary {
    /// Summarize one file
    #[must_use]
    pub fn of(file: &FileCoverage) -> Self {
        let lines = file.line_hits();
        let arms: Vec<u64> = file
            .branches()
            .into_iter()
            .flat_map(|(_, _, arms)| arms)
            .collect();

        Self {
            lines: Totals::new(lines.len(), lines.values().filter(|h| **h > 0).count()),
            statements: Totals::new(file.s.len(), file.s.values().filter(|h| **h > 0).count()),
            functions: Totals::new(file.f.len(), file.f.values().filter(|h| **h > 0).count()),
            branches: Totals::new(arms.len(), arms.iter().filter(|h| **h > 0).count()),
        }
    }

    /// Sum of two summaries
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            lines: self.lines.combine(&other.lines),
            statements: self.statements.combine(&other.statements),
            functions: self.functions.combine(&other.functions),
            branches: self.branches.combine(&other.branches),
        }
    }
}
