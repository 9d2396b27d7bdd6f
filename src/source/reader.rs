//! File-read capability.
//!
//! [`SourceLoader`](super::SourceLoader) never touches the filesystem
//! directly; it goes through a [`SourceReader`]. [`FsReader`] is the real
//! one, [`MemoryReader`] serves tests and fuzzing.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::SourceError;

/// File extensions picked up by `DIR(path)` expansion.
pub const DIR_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Reads source bytes and lists directories.
pub trait SourceReader: Send + Sync + fmt::Debug {
    /// Reads the whole file at `path`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `PermissionDenied` or `Io` for read failures and
    /// `TooLarge` when the content exceeds `limit` bytes.
    fn read(&self, path: &Path, limit: u64) -> Result<Vec<u8>, SourceError>;

    /// Lists the JSON/YAML files directly inside `dir`, sorted by name.
    ///
    /// # Errors
    ///
    /// Same error mapping as [`read`](Self::read).
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, SourceError>;
}

/// Returns `true` if `path` has one of [`DIR_EXTENSIONS`].
#[must_use]
pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DIR_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Maps an I/O error onto the source error kinds.
#[must_use]
pub fn map_io_error(path: &Path, err: std::io::Error) -> SourceError {
    match err.kind() {
        std::io::ErrorKind::NotFound => SourceError::NotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => SourceError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => SourceError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

// ============================================================================
// Filesystem
// ============================================================================

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path, limit: u64) -> Result<Vec<u8>, SourceError> {
        let metadata = std::fs::metadata(path).map_err(|e| map_io_error(path, e))?;
        if metadata.is_dir() {
            return Err(SourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("is a directory"),
            });
        }
        if metadata.len() > limit {
            return Err(SourceError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit,
            });
        }

        // The file may grow between stat and read; cap the read as well.
        let file = std::fs::File::open(path).map_err(|e| map_io_error(path, e))?;
        let mut bytes = Vec::new();
        file.take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| map_io_error(path, e))?;
        let size = bytes.len() as u64;
        if size > limit {
            return Err(SourceError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit,
            });
        }
        Ok(bytes)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|e| map_io_error(dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| map_io_error(dir, e))?;
            let path = entry.path();
            if path.is_file() && has_source_extension(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Serves sources from an in-memory table keyed by path.
///
/// A directory is any path prefix of a stored file.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryReader {
    /// Creates an empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Adds (or replaces) a file in place.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, path: &Path, limit: u64) -> Result<Vec<u8>, SourceError> {
        let bytes = self.files.get(path).ok_or_else(|| SourceError::NotFound {
            path: path.to_path_buf(),
        })?;
        let size = bytes.len() as u64;
        if size > limit {
            return Err(SourceError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit,
            });
        }
        Ok(bytes.clone())
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
        let mut found = false;
        let mut files = Vec::new();
        for path in self.files.keys() {
            if path.starts_with(dir) {
                found = true;
                if path.parent() == Some(dir) && has_source_extension(path) {
                    files.push(path.clone());
                }
            }
        }
        if !found {
            return Err(SourceError::NotFound {
                path: dir.to_path_buf(),
            });
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}
