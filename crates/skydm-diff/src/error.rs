//! Error types for the diff crate.

use skydm_types::FileKind;

/// Errors that can occur while computing diffs.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A file could not be opened or parsed.
    #[error(transparent)]
    Format(#[from] skydm_format::FormatError),

    /// The two sides of a diff are different kinds of file.
    #[error("cannot diff a {left} file against a {right} file")]
    KindMismatch { left: FileKind, right: FileKind },

    /// A version marked as existing has no path to open.
    #[error("version {version} has no file path")]
    MissingPath { version: String },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
