//! File operations relative to a base directory

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// What a path resolves to on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Nothing at this path
    Missing,
    /// Regular file (or anything that is not a directory)
    File,
    /// Directory
    Directory,
}

/// File operations handler rooted at a base directory
///
/// Relative paths are joined onto `base_dir`; absolute paths are used as-is.
#[derive(Debug, Clone)]
pub struct FileOps {
    base_dir: PathBuf,
}

impl FileOps {
    /// Create a handler rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve a repository-relative path
    #[inline]
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Classify what `path` points at, following symlinks
    pub fn path_kind(&self, path: &str) -> PathKind {
        match std::fs::metadata(self.resolve(path)) {
            Ok(meta) if meta.is_dir() => PathKind::Directory,
            Ok(_) => PathKind::File,
            Err(_) => PathKind::Missing,
        }
    }

    /// Whether `path` is an existing non-directory
    #[inline]
    pub fn is_file(&self, path: &str) -> bool {
        self.path_kind(path) == PathKind::File
    }

    /// Names of the first-level subdirectories of `root`, sorted
    ///
    /// Returns `Ok(None)` when `root` does not exist.
    pub fn list_subdirectories(&self, root: &str) -> Result<Option<Vec<String>>> {
        let resolved = self.resolve(root);
        if !resolved.exists() {
            return Ok(None);
        }

        let entries = std::fs::read_dir(&resolved)
            .map_err(|e| Error::InvalidPath(format!("Error processing {}: {}", root, e)))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::InvalidPath(format!("Error processing {}: {}", root, e)))?;
            let file_type = entry
                .file_type()
                .map_err(|e| Error::InvalidPath(format!("Error processing {}: {}", root, e)))?;
            if file_type.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(Some(names))
    }

    /// Read a text file, treating a missing file as empty
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_optional(&self, path: &Path) -> std::io::Result<String> {
        let resolved = self.base_dir.join(path);
        match std::fs::read(&resolved) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}
