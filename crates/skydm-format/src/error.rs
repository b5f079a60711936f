use std::path::PathBuf;

use skydm_types::FileKind;

/// Errors from reading or writing structured files.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but cannot be parsed as the expected kind.
    #[error("{} does not appear to be a valid {kind} file: {reason}", .path.display())]
    Invalid {
        path: PathBuf,
        kind: FileKind,
        reason: String,
    },

    /// I/O error while reading or writing the file.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FormatError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, kind: FileKind, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for [`FormatError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for format operations.
pub type FormatResult<T> = Result<T, FormatError>;
