//! Istanbul per-file coverage objects.
//!
//! This is the shape instrumented code publishes on `__coverage__`: one entry
//! per source path, with counters (`s`, `f`, `b`) keyed by the same ids as the
//! location maps (`statementMap`, `fnMap`, `branchMap`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw coverage of every instrumented file, keyed by path
pub type CoverageMap = BTreeMap<String, FileCoverage>;

/// Line/column position (lines are 1-based)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line
    #[serde(default)]
    pub line: u32,
    /// Column
    #[serde(default)]
    pub column: u32,
}

/// Source range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Start of the range
    #[serde(default)]
    pub start: Position,
    /// End of the range
    #[serde(default)]
    pub end: Position,
}

/// Function declaration metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMeta {
    /// Function name (`(anonymous_N)` for anonymous functions)
    #[serde(default)]
    pub name: String,
    /// Declaration line
    #[serde(default)]
    pub line: u32,
    /// Body location
    #[serde(default)]
    pub loc: Range,
}

/// Branch point metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMeta {
    /// Line of the branch point
    #[serde(default)]
    pub line: u32,
    /// Branch kind (`if`, `cond-expr`, `switch`, `binary-expr`, ...)
    #[serde(default, rename = "type")]
    pub kind: String,
    /// One location per arm
    #[serde(default)]
    pub locations: Vec<Range>,
}

/// Coverage of one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    /// Source path coverage is attributed to
    #[serde(default)]
    pub path: String,
    /// Statement hit counts
    #[serde(default)]
    pub s: BTreeMap<String, u64>,
    /// Branch arm hit counts
    #[serde(default)]
    pub b: BTreeMap<String, Vec<u64>>,
    /// Function hit counts
    #[serde(default)]
    pub f: BTreeMap<String, u64>,
    /// Statement locations
    #[serde(default)]
    pub statement_map: BTreeMap<String, Range>,
    /// Function metadata
    #[serde(default)]
    pub fn_map: BTreeMap<String, FunctionMeta>,
    /// Branch metadata
    #[serde(default)]
    pub branch_map: BTreeMap<String, BranchMeta>,
}

impl FileCoverage {
    /// Empty coverage for a path
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add another run's counters for the same file.
    ///
    /// Counters are summed id by id and saturate at `u64::MAX`; metadata
    /// missing on this side is taken from `other`.
    pub fn merge(&mut self, other: &Self) {
        for (id, hits) in &other.s {
            let count = self.s.entry(id.clone()).or_insert(0);
            *count = count.saturating_add(*hits);
        }
        for (id, hits) in &other.f {
            let count = self.f.entry(id.clone()).or_insert(0);
            *count = count.saturating_add(*hits);
        }
        for (id, arms) in &other.b {
            let mine = self.b.entry(id.clone()).or_default();
            if mine.len() < arms.len() {
                mine.resize(arms.len(), 0);
            }
            for (slot, hits) in mine.iter_mut().zip(arms) {
                *slot = slot.saturating_add(*hits);
            }
        }
        for (id, range) in &other.statement_map {
            self.statement_map.entry(id.clone()).or_insert(*range);
        }
        for (id, meta) in &other.fn_map {
            self.fn_map.entry(id.clone()).or_insert_with(|| meta.clone());
        }
        for (id, meta) in &other.branch_map {
            self.branch_map.entry(id.clone()).or_insert_with(|| meta.clone());
        }
    }

    /// Hit count per line: the highest count of any statement starting on it
    #[must_use]
    pub fn line_hits(&self) -> BTreeMap<u32, u64> {
        let mut lines = BTreeMap::new();
        for (id, range) in &self.statement_map {
            let hits = self.s.get(id).copied().unwrap_or(0);
            let entry = lines.entry(range.start.line).or_insert(hits);
            if *entry < hits {
                *entry = hits;
            }
        }
        lines
    }

    /// Functions as `(name, line, hits)`, ordered by id
    #[must_use]
    pub fn functions(&self) -> Vec<(&str, u32, u64)> {
        let mut out: Vec<(u64, &str, u32, u64)> = self
            .fn_map
            .iter()
            .map(|(id, meta)| {
                (
                    numeric_id(id),
                    meta.name.as_str(),
                    meta.line,
                    self.f.get(id).copied().unwrap_or(0),
                )
            })
            .collect();
        out.sort_by_key(|(id, ..)| *id);
        out.into_iter().map(|(_, n, l, h)| (n, l, h)).collect()
    }

    /// Branch points as `(id, line, arm hits)`, ordered by id
    #[must_use]
    pub fn branches(&self) -> Vec<(u64, u32, Vec<u64>)> {
        let mut out: Vec<(u64, u32, Vec<u64>)> = self
            .branch_map
            .iter()
            .map(|(id, meta)| {
                let mut arms = self.b.get(id).cloned().unwrap_or_default();
                if arms.len() < meta.locations.len() {
                    arms.resize(meta.locations.len(), 0);
                }
                (numeric_id(id), meta.line, arms)
            })
            .collect();
        out.sort_by_key(|(id, ..)| *id);
        out
    }
}

/// Counter ids are decimal strings; sort them numerically
fn numeric_id(id: &str) -> u64 {
    id.parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::coverage::fixtures::SAMPLE;

    #[test]
    fn test_deserializes_istanbul_shape() {
        let map: CoverageMap = serde_json::from_str(SAMPLE).unwrap();
        let file = &map["/build/app.js"];
        assert_eq!(file.s.len(), 3);
        assert_eq!(file.branch_map["1"].kind, "if");
        assert_eq!(file.fn_map["2"].name, "unused");
    }

    #[test]
    fn test_line_hits_take_max_statement() {
        let map: CoverageMap = serde_json::from_str(SAMPLE).unwrap();
        let lines = map["/build/app.js"].line_hits();
        assert_eq!(lines.get(&1), Some(&1));
        assert_eq!(lines.get(&2), Some(&4));
    }

    #[test]
    fn test_merge_saturates_counters() {
        let mut file = FileCoverage::new("/a.js");
        file.s.insert("1".into(), u64::MAX);
        file.f.insert("1".into(), u64::MAX - 1);
        file.b.insert("1".into(), vec![u64::MAX, 1]);
        let other = file.clone();

        file.merge(&other);

        assert_eq!(file.s["1"], u64::MAX);
        assert_eq!(file.f["1"], u64::MAX);
        assert_eq!(file.b["1"], vec![u64::MAX, 2]);
    }

    #[test]
    fn test_merge_sums_counters() {
        let map: CoverageMap = serde_json::from_str(SAMPLE).unwrap();
        let mut file = map["/build/app.js"].clone();
        file.merge(&map["/build/app.js"]);

        assert_eq!(file.s["3"], 8);
        assert_eq!(file.f["1"], 2);
        assert_eq!(file.b["1"], vec![2, 0]);
        assert_eq!(file.statement_map.len(), 3);
    }

    #[test]
    fn test_merge_into_empty_takes_metadata() {
        let map: CoverageMap = serde_json::from_str(SAMPLE).unwrap();
        let mut file = FileCoverage::new("/build/app.js");
        file.merge(&map["/build/app.js"]);
        assert_eq!(file, map["/build/app.js"]);
    }

    #[test]
    fn test_functions_sorted_numerically() {
        let mut file = FileCoverage::new("x.js");
        for id in ["10", "2", "1"] {
            file.fn_map.insert(
                id.to_string(),
                FunctionMeta {
                    name: format!("fn{id}"),
                    line: id.parse().unwrap(),
                    loc: Range::default(),
                },
            );
        }
        let names: Vec<&str> = file.functions().into_iter().map(|(n, ..)| n).collect();
        assert_eq!(names, vec!["fn1", "fn2", "fn10"]);
    }
}
