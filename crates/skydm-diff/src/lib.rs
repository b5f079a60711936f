//! Structural diffs and changelogs for SkyDM.
//!
//! A [`StructuralDiff`] compares the layout of two files of the same kind:
//! header/data units and primary header keywords for FITS files, rows and
//! columns for catalogs. A [`ChangeLog`] is the ordered list of diffs between
//! consecutive versions of a product, computed by the [`ChangelogEngine`].
//!
//! # Key Types
//!
//! - [`FitsDiff`] / [`CatalogDiff`] / [`StructuralDiff`] -- Per-pair diffs
//! - [`HeaderDiff`] -- Keyword-level header comparison
//! - [`ChangeLog`] -- Diffs keyed by `diff_<older>_<newer>`
//! - [`ChangelogEngine`] / [`DiffTarget`] -- Pairwise diffing with missing-file tolerance

pub mod changelog;
pub mod engine;
pub mod error;
pub mod full_report;
pub mod header_diff;
pub mod structural;

pub use changelog::{ChangeLog, REPORT_SEPARATOR};
pub use engine::{ChangelogEngine, DiffTarget};
pub use error::{DiffError, DiffResult};
pub use full_report::full_report;
pub use header_diff::{diff_headers, HeaderDiff, KeywordChange, DEFAULT_RTOL};
pub use structural::{CatalogDiff, DiffOptions, FitsDiff, StructuralDiff};
