use std::path::Path;
use std::sync::Arc;

use skydm_types::FileKind;

use crate::catalog::read_catalog_file;
use crate::error::{FormatError, FormatResult};
use crate::fits::read_fits_file;
use crate::structure::FileStructure;

/// Source of file structures.
///
/// Implementations must distinguish a missing file
/// ([`FormatError::NotFound`]) from one that exists but cannot be read as
/// the requested kind ([`FormatError::Invalid`]).
pub trait FormatBackend: Send + Sync {
    /// Open `path` as a file of `kind` and return its structure.
    fn open(&self, path: &Path, kind: FileKind) -> FormatResult<FileStructure>;

    /// Check whether `path` exists.
    fn exists(&self, path: &Path) -> bool;
}

impl<B: FormatBackend + ?Sized> FormatBackend for Arc<B> {
    fn open(&self, path: &Path, kind: FileKind) -> FormatResult<FileStructure> {
        (**self).open(path, kind)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

impl<B: FormatBackend + ?Sized> FormatBackend for &B {
    fn open(&self, path: &Path, kind: FileKind) -> FormatResult<FileStructure> {
        (**self).open(path, kind)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

/// Reads files from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiskBackend;

impl FormatBackend for DiskBackend {
    fn open(&self, path: &Path, kind: FileKind) -> FormatResult<FileStructure> {
        if !path.exists() {
            return Err(FormatError::NotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(FormatError::invalid(path, kind, "not a regular file"));
        }
        match kind {
            FileKind::Fits => read_fits_file(path).map(FileStructure::Fits),
            FileKind::Catalog => read_catalog_file(path).map(FileStructure::Catalog),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
