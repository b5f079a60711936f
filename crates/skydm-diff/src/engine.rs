//! Pairwise changelog computation.

use std::path::Path;
use std::sync::Arc;

use skydm_format::FormatBackend;
use skydm_types::{FileKind, VersionPair, Warning, WarningSink};
use tracing::{debug, info};

use crate::changelog::ChangeLog;
use crate::error::{DiffError, DiffResult};
use crate::structural::{DiffOptions, StructuralDiff};

/// One version of a file that can take part in a changelog.
pub trait DiffTarget {
    /// The version label.
    fn version(&self) -> &str;

    /// Location of the file, if one is known.
    fn path(&self) -> Option<&Path>;

    /// Whether the file exists.
    fn file_exists(&self) -> bool;
}

impl<T: DiffTarget + ?Sized> DiffTarget for &T {
    fn version(&self) -> &str {
        (**self).version()
    }

    fn path(&self) -> Option<&Path> {
        (**self).path()
    }

    fn file_exists(&self) -> bool {
        (**self).file_exists()
    }
}

/// Computes diffs between consecutive versions.
///
/// Pairs where either file is missing are skipped with a
/// [`Warning::MissingFiles`]; the changelog is shorter, not an error.
pub struct ChangelogEngine {
    backend: Arc<dyn FormatBackend>,
    warnings: Arc<dyn WarningSink>,
    options: DiffOptions,
}

impl std::fmt::Debug for ChangelogEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangelogEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ChangelogEngine {
    pub fn new(backend: Arc<dyn FormatBackend>, warnings: Arc<dyn WarningSink>) -> Self {
        Self {
            backend,
            warnings,
            options: DiffOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    pub fn backend(&self) -> &Arc<dyn FormatBackend> {
        &self.backend
    }

    pub fn warnings(&self) -> &Arc<dyn WarningSink> {
        &self.warnings
    }

    /// Diff two files directly.
    pub fn compute_diff(
        &self,
        file1: &Path,
        file2: &Path,
        versions: VersionPair,
        kind: FileKind,
    ) -> DiffResult<StructuralDiff> {
        debug!(older = %versions.older, newer = %versions.newer, %kind, "computing diff");
        StructuralDiff::compute(self.backend.as_ref(), versions, file1, file2, kind, &self.options)
    }

    /// Diff each consecutive pair of `files`, in the order given.
    pub fn compute_changelog<T: DiffTarget>(&self, files: &[T], kind: FileKind) -> DiffResult<ChangeLog> {
        let mut diffs = Vec::with_capacity(files.len().saturating_sub(1));
        for pair in files.windows(2) {
            let (older, newer) = (&pair[0], &pair[1]);
            let (older_exists, newer_exists) = (older.file_exists(), newer.file_exists());
            if !(older_exists && newer_exists) {
                self.warnings.warn(Warning::MissingFiles {
                    older: older.version().to_string(),
                    older_exists,
                    newer: newer.version().to_string(),
                    newer_exists,
                });
                continue;
            }

            let file1 = existing_path(older)?;
            let file2 = existing_path(newer)?;
            let versions = VersionPair::new(older.version(), newer.version());
            diffs.push(self.compute_diff(file1, file2, versions, kind)?);
        }

        info!(versions = files.len(), diffs = diffs.len(), "computed changelog");
        Ok(ChangeLog::new(diffs))
    }
}

fn existing_path<T: DiffTarget>(target: &T) -> DiffResult<&Path> {
    target.path().ok_or_else(|| DiffError::MissingPath {
        version: target.version().to_string(),
    })
}
