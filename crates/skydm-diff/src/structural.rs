//! Structural diffs between two files of the same kind.

use std::path::{Path, PathBuf};

use skydm_format::{CatalogStructure, FileStructure, FitsStructure, FormatBackend, Header};
use skydm_types::{FileKind, VersionPair};

use crate::error::{DiffError, DiffResult};
use crate::full_report::full_report;
use crate::header_diff::{diff_headers, HeaderDiff, DEFAULT_RTOL};

/// Options controlling diff computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffOptions {
    /// Also compute the full line-by-line report.
    pub full: bool,
    /// Relative tolerance for floating-point header values.
    pub rtol: f64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            full: false,
            rtol: DEFAULT_RTOL,
        }
    }
}

/// Names in `a` that are not in `b`, keeping the order of `a`.
fn missing_from(a: &[&str], b: &[&str]) -> Vec<String> {
    a.iter()
        .filter(|n| !b.contains(n))
        .map(|n| n.to_string())
        .collect()
}

fn split_lines(report: String) -> Vec<String> {
    report.split('\n').map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// FITS
// ---------------------------------------------------------------------------

/// The difference between two FITS files.
#[derive(Clone, Debug, PartialEq)]
pub struct FitsDiff {
    pub versions: VersionPair,
    pub file1: PathBuf,
    pub file2: PathBuf,
    /// Number of header/data units in each file.
    pub counts: (usize, usize),
    /// `|count1 - count2|`.
    pub delta_count: usize,
    /// Sections in the second file but not the first, in file order.
    pub added_sections: Vec<String>,
    /// Sections in the first file but not the second, in file order.
    pub removed_sections: Vec<String>,
    /// Primary header comparison.
    pub primary_header: HeaderDiff,
    pub full_report: Option<String>,
}

impl FitsDiff {
    /// Compare two already opened FITS structures.
    pub fn from_structures(
        versions: VersionPair,
        (file1, old): (&Path, &FitsStructure),
        (file2, new): (&Path, &FitsStructure),
        options: &DiffOptions,
    ) -> Self {
        let old_names = old.names();
        let new_names = new.names();

        let empty = Header::new();
        let old_primary = old.primary().map_or(&empty, |s| &s.header);
        let new_primary = new.primary().map_or(&empty, |s| &s.header);

        let full = options.full.then(|| {
            full_report(
                &FileStructure::Fits(old.clone()),
                &FileStructure::Fits(new.clone()),
                &versions.older,
                &versions.newer,
            )
        });

        Self {
            file1: file1.to_path_buf(),
            file2: file2.to_path_buf(),
            counts: (old.len(), new.len()),
            delta_count: old.len().abs_diff(new.len()),
            added_sections: missing_from(&new_names, &old_names),
            removed_sections: missing_from(&old_names, &new_names),
            primary_header: diff_headers(old_primary, new_primary, options.rtol),
            full_report: full,
            versions,
        }
    }

    /// Render the report.
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("Version: {} to {}\n", self.versions.older, self.versions.newer));

        report.push_str(&format!("Changes in HDU number: {}\n", self.delta_count));
        if self.delta_count > 0 {
            report.push_str(&format!("Added HDUs: {}\n", self.added_sections.join(", ")));
            report.push_str(&format!("Removed HDUs: {}\n\n", self.removed_sections.join(", ")));
        }

        report.push_str("Primary Header Differences:\n");
        if self.primary_header.keywords_differ() {
            report.push_str(&format!("Added Keywords: {}\n", self.primary_header.added.join(", ")));
            report.push_str(&format!("Removed Keywords: {}\n", self.primary_header.removed.join(", ")));
        }
        for change in &self.primary_header.changed {
            report.push_str(&format!(
                "Changed Keyword {}: {} -> {}\n",
                change.keyword, change.old, change.new
            ));
        }

        if let Some(full) = &self.full_report {
            report.push_str("\nFull Report:\n");
            report.push_str(full);
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The difference between two catalogs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogDiff {
    pub versions: VersionPair,
    pub file1: PathBuf,
    pub file2: PathBuf,
    /// Number of rows in each catalog.
    pub rows: (usize, usize),
    /// `|rows1 - rows2|`.
    pub delta_rows: usize,
    /// Size of the symmetric difference of the column name sets.
    pub delta_cols: usize,
    /// Columns in the second catalog but not the first.
    pub added_columns: Vec<String>,
    /// Columns in the first catalog but not the second.
    pub removed_columns: Vec<String>,
    pub full_report: Option<String>,
}

impl CatalogDiff {
    /// Compare two already opened catalog structures.
    pub fn from_structures(
        versions: VersionPair,
        (file1, old): (&Path, &CatalogStructure),
        (file2, new): (&Path, &CatalogStructure),
        options: &DiffOptions,
    ) -> Self {
        let old_cols: Vec<&str> = old.columns.iter().map(String::as_str).collect();
        let new_cols: Vec<&str> = new.columns.iter().map(String::as_str).collect();
        let added_columns = missing_from(&new_cols, &old_cols);
        let removed_columns = missing_from(&old_cols, &new_cols);

        let full = options.full.then(|| {
            full_report(
                &FileStructure::Catalog(old.clone()),
                &FileStructure::Catalog(new.clone()),
                &versions.older,
                &versions.newer,
            )
        });

        Self {
            file1: file1.to_path_buf(),
            file2: file2.to_path_buf(),
            rows: (old.rows, new.rows),
            delta_rows: old.rows.abs_diff(new.rows),
            delta_cols: added_columns.len() + removed_columns.len(),
            added_columns,
            removed_columns,
            full_report: full,
            versions,
        }
    }

    /// Render the report.
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("Version: {} to {}\n", self.versions.older, self.versions.newer));
        report.push_str(&format!("Changes in row number: {}\n", self.delta_rows));
        report.push_str(&format!("Changes in column number: {}\n", self.delta_cols));
        if self.delta_cols > 0 {
            report.push_str(&format!("Added Columns: {}\n", self.added_columns.join(", ")));
            report.push_str(&format!("Removed Columns: {}\n\n", self.removed_columns.join(", ")));
        }
        if let Some(full) = &self.full_report {
            report.push_str("\nFull Report:\n");
            report.push_str(full);
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Either kind
// ---------------------------------------------------------------------------

/// A diff between two versions of a file, of either kind.
#[derive(Clone, Debug, PartialEq)]
pub enum StructuralDiff {
    Fits(FitsDiff),
    Catalog(CatalogDiff),
}

impl StructuralDiff {
    /// Compare two opened structures. Both must be the same kind.
    pub fn from_structures(
        versions: VersionPair,
        (file1, old): (&Path, &FileStructure),
        (file2, new): (&Path, &FileStructure),
        options: &DiffOptions,
    ) -> DiffResult<Self> {
        match (old, new) {
            (FileStructure::Fits(a), FileStructure::Fits(b)) => Ok(Self::Fits(
                FitsDiff::from_structures(versions, (file1, a), (file2, b), options),
            )),
            (FileStructure::Catalog(a), FileStructure::Catalog(b)) => Ok(Self::Catalog(
                CatalogDiff::from_structures(versions, (file1, a), (file2, b), options),
            )),
            _ => Err(DiffError::KindMismatch {
                left: old.kind(),
                right: new.kind(),
            }),
        }
    }

    /// Open both files as `kind` through `backend` and compare them.
    pub fn compute(
        backend: &dyn FormatBackend,
        versions: VersionPair,
        file1: &Path,
        file2: &Path,
        kind: FileKind,
        options: &DiffOptions,
    ) -> DiffResult<Self> {
        let old = backend.open(file1, kind)?;
        let new = backend.open(file2, kind)?;
        Self::from_structures(versions, (file1, &old), (file2, &new), options)
    }

    pub fn kind(&self) -> FileKind {
        match self {
            Self::Fits(_) => FileKind::Fits,
            Self::Catalog(_) => FileKind::Catalog,
        }
    }

    pub fn versions(&self) -> &VersionPair {
        match self {
            Self::Fits(d) => &d.versions,
            Self::Catalog(d) => &d.versions,
        }
    }

    /// Lookup key of this diff: `diff_<older>_<newer>`.
    pub fn diff_key(&self) -> String {
        self.versions().diff_key()
    }

    pub fn as_fits(&self) -> Option<&FitsDiff> {
        match self {
            Self::Fits(d) => Some(d),
            Self::Catalog(_) => None,
        }
    }

    pub fn as_catalog(&self) -> Option<&CatalogDiff> {
        match self {
            Self::Catalog(d) => Some(d),
            Self::Fits(_) => None,
        }
    }

    /// Render the report as one string.
    pub fn report(&self) -> String {
        match self {
            Self::Fits(d) => d.report(),
            Self::Catalog(d) => d.report(),
        }
    }

    /// Render the report as lines: [`report`](Self::report) split on `\n`.
    pub fn report_lines(&self) -> Vec<String> {
        split_lines(self.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skydm_format::{Card, HeaderValue, InMemoryBackend, Section, SectionKind};

    fn fits(names: &[&str], primary: &[(&str, i64)]) -> FitsStructure {
        let header: Header = primary
            .iter()
            .map(|(k, v)| Card::new(*k, HeaderValue::Int(*v)))
            .collect();
        let mut sections = vec![Section::from_header("PRIMARY", SectionKind::Primary, header)];
        sections.extend(
            names
                .iter()
                .map(|n| Section::from_header(*n, SectionKind::Image, Header::new())),
        );
        FitsStructure::new(sections)
    }

    fn fits_diff(old: &FitsStructure, new: &FitsStructure, options: &DiffOptions) -> FitsDiff {
        FitsDiff::from_structures(
            VersionPair::new("v1", "v2"),
            (Path::new("a.fits"), old),
            (Path::new("b.fits"), new),
            options,
        )
    }

    #[test]
    fn self_diff_is_empty() {
        let s = fits(&["FLUX", "IVAR"], &[("NAXIS", 0)]);
        let diff = fits_diff(&s, &s, &DiffOptions::default());
        assert_eq!(diff.delta_count, 0);
        assert!(diff.added_sections.is_empty());
        assert!(diff.removed_sections.is_empty());
        assert!(diff.primary_header.is_empty());
    }

    #[test]
    fn added_means_present_in_newer() {
        let old = fits(&["FLUX", "MASK"], &[]);
        let new = fits(&["FLUX", "EXTRA", "IVAR"], &[]);
        let diff = fits_diff(&old, &new, &DiffOptions::default());
        assert_eq!(diff.counts, (3, 4));
        assert_eq!(diff.delta_count, 1);
        assert_eq!(diff.added_sections, vec!["EXTRA", "IVAR"]);
        assert_eq!(diff.removed_sections, vec!["MASK"]);
    }

    #[test]
    fn fits_report_format() {
        let old = fits(&["FLUX"], &[("NAXIS", 0), ("OLDKEY", 1)]);
        let new = fits(&["FLUX", "EXTRA"], &[("NAXIS", 0), ("NEWKEY", 2)]);
        let diff = fits_diff(&old, &new, &DiffOptions::default());
        assert_eq!(
            diff.report(),
            "Version: v1 to v2\n\
             Changes in HDU number: 1\n\
             Added HDUs: EXTRA\n\
             Removed HDUs: \n\
             \n\
             Primary Header Differences:\n\
             Added Keywords: NEWKEY\n\
             Removed Keywords: OLDKEY\n"
        );
    }

    #[test]
    fn fits_report_without_changes() {
        let s = fits(&["FLUX"], &[]);
        let diff = fits_diff(&s, &s, &DiffOptions::default());
        assert_eq!(
            diff.report(),
            "Version: v1 to v2\nChanges in HDU number: 0\nPrimary Header Differences:\n"
        );
    }

    #[test]
    fn renamed_section_not_listed_with_zero_delta() {
        let old = fits(&["FLUX"], &[]);
        let new = fits(&["FLUX2"], &[]);
        let diff = fits_diff(&old, &new, &DiffOptions::default());
        assert_eq!(diff.added_sections, vec!["FLUX2"]);
        assert_eq!(diff.removed_sections, vec!["FLUX"]);
        assert_eq!(
            diff.report(),
            "Version: v1 to v2\nChanges in HDU number: 0\nPrimary Header Differences:\n"
        );
    }

    #[test]
    fn full_report_only_when_requested() {
        let old = fits(&["FLUX"], &[]);
        let new = fits(&["FLUX", "EXTRA"], &[]);
        assert!(fits_diff(&old, &new, &DiffOptions::default()).full_report.is_none());

        let options = DiffOptions {
            full: true,
            ..DiffOptions::default()
        };
        let diff = fits_diff(&old, &new, &options);
        let report = diff.report();
        assert!(report.contains("\nFull Report:\n--- v1\n+++ v2\n"));
        assert!(report.contains("+HDU 2: EXTRA (ImageHDU)"));
    }

    #[test]
    fn catalog_diff_and_report() {
        let old = CatalogStructure::new(vec!["plateifu".into(), "ra".into(), "old".into()], 10);
        let new = CatalogStructure::new(vec!["plateifu".into(), "ra".into(), "z".into()], 12);
        let diff = CatalogDiff::from_structures(
            VersionPair::new("DR15", "DR16"),
            (Path::new("a.csv"), &old),
            (Path::new("b.csv"), &new),
            &DiffOptions::default(),
        );
        assert_eq!(diff.delta_rows, 2);
        assert_eq!(diff.delta_cols, 2);
        assert_eq!(
            diff.report(),
            "Version: DR15 to DR16\n\
             Changes in row number: 2\n\
             Changes in column number: 2\n\
             Added Columns: z\n\
             Removed Columns: old\n\n"
        );
    }

    #[test]
    fn report_lines_match_report() {
        let old = fits(&["FLUX"], &[("A", 1)]);
        let new = fits(&["FLUX", "EXTRA"], &[("B", 1)]);
        let diff = StructuralDiff::Fits(fits_diff(&old, &new, &DiffOptions::default()));
        assert_eq!(diff.report_lines().join("\n"), diff.report());
        assert_eq!(diff.report_lines()[0], "Version: v1 to v2");
        assert_eq!(diff.diff_key(), "diff_v1_v2");
    }

    #[test]
    fn compute_through_backend() {
        let backend = InMemoryBackend::new();
        backend.insert("/sas/v1/cube.fits", FileStructure::Fits(fits(&["FLUX"], &[])));
        backend.insert("/sas/v2/cube.fits", FileStructure::Fits(fits(&["FLUX", "EXTRA"], &[])));
        let diff = StructuralDiff::compute(
            &backend,
            VersionPair::new("v1", "v2"),
            Path::new("/sas/v1/cube.fits"),
            Path::new("/sas/v2/cube.fits"),
            FileKind::Fits,
            &DiffOptions::default(),
        )
        .unwrap();
        assert_eq!(diff.as_fits().unwrap().added_sections, vec!["EXTRA"]);
    }

    #[test]
    fn compute_rejects_unreadable_file() {
        let backend = InMemoryBackend::new();
        backend.insert("/sas/v1/cube.fits", FileStructure::Fits(fits(&[], &[])));
        backend.insert(
            "/sas/v2/cube.fits",
            FileStructure::Catalog(CatalogStructure::new(vec!["a".into()], 1)),
        );
        let err = StructuralDiff::compute(
            &backend,
            VersionPair::new("v1", "v2"),
            Path::new("/sas/v1/cube.fits"),
            Path::new("/sas/v2/cube.fits"),
            FileKind::Fits,
            &DiffOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not appear to be a valid FITS file"));
    }

    #[test]
    fn mixed_kinds_rejected() {
        let a = FileStructure::Fits(fits(&[], &[]));
        let b = FileStructure::Catalog(CatalogStructure::default());
        let err = StructuralDiff::from_structures(
            VersionPair::new("v1", "v2"),
            (Path::new("a"), &a),
            (Path::new("b"), &b),
            &DiffOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DiffError::KindMismatch { .. }));
    }
}
