//! Coverage Collector
//!
//! Merges the raw counters of one or more runs, per source path.

use super::model::{CoverageMap, FileCoverage};
use super::summary::CoverageSummary;
use crate::result::{HarnessError, HarnessResult};

/// Merged coverage of every file seen so far
#[derive(Debug, Clone, Default)]
pub struct Collector {
    files: CoverageMap,
}

impl Collector {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a coverage map
    pub fn add(&mut self, coverage: &CoverageMap) {
        for (path, file) in coverage {
            self.files
                .entry(path.clone())
                .or_insert_with(|| FileCoverage::new(file.path.clone()))
                .merge(file);
        }
    }

    /// Merge a raw `__coverage__` value
    pub fn add_value(&mut self, raw: serde_json::Value) -> HarnessResult<()> {
        let coverage: CoverageMap = serde_json::from_value(raw)
            .map_err(|e| HarnessError::coverage(format!("malformed coverage object: {e}")))?;
        self.add(&coverage);
        Ok(())
    }

    /// Merged coverage, keyed by path
    #[must_use]
    pub fn files(&self) -> &CoverageMap {
        &self.files
    }

    /// Whether nothing was collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Per-file summaries, in path order
    #[must_use]
    pub fn file_summaries(&self) -> Vec<(&str, CoverageSummary)> {
        self.files
            .iter()
            .map(|(path, file)| (path.as_str(), CoverageSummary::of(file)))
            .collect()
    }

    /// Summary over every file
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        self.file_summaries()
            .iter()
            .fold(CoverageSummary::default(), |acc, (_, s)| acc.combine(s))
    }
}
