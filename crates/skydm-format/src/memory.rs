use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use skydm_types::FileKind;

use crate::backend::FormatBackend;
use crate::error::{FormatError, FormatResult};
use crate::structure::FileStructure;

/// In-memory, `HashMap`-based backend.
///
/// Intended for tests and embedding. Structures are registered under a path
/// and cloned on every open.
pub struct InMemoryBackend {
    files: RwLock<HashMap<PathBuf, FileStructure>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Register `structure` under `path`, replacing any previous entry.
    pub fn insert(&self, path: impl Into<PathBuf>, structure: FileStructure) {
        self.files
            .write()
            .expect("lock poisoned")
            .insert(path.into(), structure);
    }

    /// Remove the entry for `path`. Returns `true` if it existed.
    pub fn remove(&self, path: &Path) -> bool {
        self.files.write().expect("lock poisoned").remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatBackend for InMemoryBackend {
    fn open(&self, path: &Path, kind: FileKind) -> FormatResult<FileStructure> {
        let files = self.files.read().expect("lock poisoned");
        let structure = files
            .get(path)
            .ok_or_else(|| FormatError::NotFound(path.to_path_buf()))?;
        if structure.kind() != kind {
            return Err(FormatError::invalid(
                path,
                kind,
                format!("registered as a {} file", structure.kind()),
            ));
        }
        Ok(structure.clone())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().expect("lock poisoned").contains_key(path)
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("file_count", &self.len())
            .finish()
    }
}
