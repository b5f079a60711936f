//! The ordered list of diffs between consecutive versions.

use skydm_fuzzy::{FuzzyKey, FuzzyList, LookupResult};

use crate::structural::StructuralDiff;

/// Line placed before each diff in a combined report.
pub const REPORT_SEPARATOR: &str = "---------------------";

fn diff_key(diff: &StructuralDiff) -> String {
    diff.diff_key()
}

/// Diffs between consecutive versions of a product, oldest pair first.
///
/// Each diff is looked up by `diff_<older>_<newer>`, exactly or fuzzily.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeLog {
    diffs: FuzzyList<StructuralDiff>,
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ChangeLog {
    pub fn new(diffs: Vec<StructuralDiff>) -> Self {
        Self {
            diffs: FuzzyList::from_items(diffs, diff_key),
        }
    }

    /// Look up a diff by key (`"diff_v1_v2"`) or position.
    pub fn get<'k>(&self, key: impl Into<FuzzyKey<'k>>) -> LookupResult<&StructuralDiff> {
        self.diffs.get(key)
    }

    pub fn contains<'k>(&self, key: impl Into<FuzzyKey<'k>>) -> bool {
        self.diffs.contains(key)
    }

    /// Keys of all diffs, in order.
    pub fn keys(&self) -> Vec<String> {
        self.diffs.names()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StructuralDiff> {
        self.diffs.iter()
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Combined report of every diff, each preceded by
    /// [`REPORT_SEPARATOR`] when `insert` is set.
    pub fn generate_report(&self, insert: bool) -> String {
        let mut report = String::new();
        for diff in &self.diffs {
            if insert {
                report.push_str(REPORT_SEPARATOR);
                report.push('\n');
            }
            report.push_str(&diff.report());
        }
        report
    }

    /// [`generate_report`](Self::generate_report) split on `\n`.
    pub fn generate_report_lines(&self, insert: bool) -> Vec<String> {
        self.generate_report(insert)
            .split('\n')
            .map(str::to_string)
            .collect()
    }
}

impl<'a> IntoIterator for &'a ChangeLog {
    type Item = &'a StructuralDiff;
    type IntoIter = std::slice::Iter<'a, StructuralDiff>;

    fn into_iter(self) -> Self::IntoIter {
        self.diffs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structural::{CatalogDiff, DiffOptions};
    use skydm_format::CatalogStructure;
    use skydm_types::VersionPair;
    use std::path::Path;

    fn diff(older: &str, newer: &str, rows: (usize, usize)) -> StructuralDiff {
        StructuralDiff::Catalog(CatalogDiff::from_structures(
            VersionPair::new(older, newer),
            (Path::new("a.csv"), &CatalogStructure::new(vec!["ra".into()], rows.0)),
            (Path::new("b.csv"), &CatalogStructure::new(vec!["ra".into()], rows.1)),
            &DiffOptions::default(),
        ))
    }

    fn changelog() -> ChangeLog {
        ChangeLog::new(vec![diff("DR15", "DR16", (1, 2)), diff("DR16", "DR17", (2, 5))])
    }

    #[test]
    fn keyed_by_lowercased_versions() {
        let log = changelog();
        assert_eq!(log.keys(), vec!["diff_dr15_dr16", "diff_dr16_dr17"]);
        let d = log.get("diff_dr16_dr17").unwrap();
        assert_eq!(d.as_catalog().unwrap().delta_rows, 3);
        assert_eq!(log.get(0).unwrap().versions().newer, "DR16");
    }

    #[test]
    fn report_inserts_separators() {
        let log = changelog();
        let report = log.generate_report(true);
        assert!(report.starts_with("---------------------\nVersion: DR15 to DR16\n"));
        assert_eq!(report.matches(REPORT_SEPARATOR).count(), 2);
        assert!(!log.generate_report(false).contains(REPORT_SEPARATOR));
    }

    #[test]
    fn report_lines_match_report() {
        let log = changelog();
        assert_eq!(log.generate_report_lines(true).join("\n"), log.generate_report(true));
        assert_eq!(log.generate_report_lines(true)[0], REPORT_SEPARATOR);
    }

    #[test]
    fn empty_changelog() {
        let log = ChangeLog::default();
        assert!(log.is_empty());
        assert_eq!(log.generate_report(true), "");
        assert!(log.get("diff_v1_v2").is_err());
    }
}
