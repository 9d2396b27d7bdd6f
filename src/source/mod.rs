//! Source loading
//!
//! Resolves source locators into parsed [`DocumentNode`]s:
//! 1. Locator list parsing (`FILE(...)`, `DIR(...)`, bare paths)
//! 2. `DIR(...)` expansion to its JSON/YAML files
//! 3. Read through a [`SourceReader`] with a size limit
//! 4. BOM strip, UTF-8 decode, empty check
//! 5. Format detection and parsing

mod locator;
mod reader;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::{DocumentNode, yaml_to_document};
use crate::error::SourceError;
use crate::observability::metrics;

pub use locator::{LIST_SEPARATOR, SourceLocator};
pub use reader::{DIR_EXTENSIONS, FsReader, MemoryReader, SourceReader, map_io_error};

// ============================================================================
// Options
// ============================================================================

/// Default source size limit (10 MiB).
pub const DEFAULT_MAX_SOURCE_SIZE: u64 = 10 * 1024 * 1024;

/// Limits applied to every source read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLimits {
    /// Maximum source size in bytes.
    pub max_source_size: u64,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            max_source_size: env_or("CONFIGMGR_MAX_SOURCE_SIZE", DEFAULT_MAX_SOURCE_SIZE),
        }
    }
}

/// Reads `name` from the environment, falling back to `default` when unset
/// or unparseable.
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Format
// ============================================================================

/// Serialization format of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// JSON
    Json,
    /// YAML
    Yaml,
}

impl SourceFormat {
    /// Picks the format from the extension, else from the first
    /// non-whitespace character (`{` or `[` means JSON).
    #[must_use]
    pub fn detect(path: &Path, text: &str) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => match text.trim_start().chars().next() {
                Some('{' | '[') => Self::Json,
                _ => Self::Yaml,
            },
        }
    }

    /// Lowercase name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Loader
// ============================================================================

/// One parsed source document.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSource {
    /// Path the document was read from.
    pub path: PathBuf,
    /// Detected format.
    pub format: SourceFormat,
    /// Parsed content.
    pub document: DocumentNode,
}

/// Loads locators into documents.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    reader: Arc<dyn SourceReader>,
    limits: SourceLimits,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new(SourceLimits::default())
    }
}

impl SourceLoader {
    /// Creates a loader over the local filesystem.
    #[must_use]
    pub fn new(limits: SourceLimits) -> Self {
        Self::with_reader(Arc::new(FsReader), limits)
    }

    /// Creates a loader over an arbitrary reader.
    #[must_use]
    pub fn with_reader(reader: Arc<dyn SourceReader>, limits: SourceLimits) -> Self {
        Self { reader, limits }
    }

    /// Returns the limits in effect.
    #[must_use]
    pub const fn limits(&self) -> SourceLimits {
        self.limits
    }

    /// Loads every segment of a `:`-separated locator list, left to right.
    ///
    /// # Errors
    ///
    /// The first failing segment aborts the whole list.
    pub fn load_list(&self, locators: &str) -> Result<Vec<LoadedSource>, SourceError> {
        let parsed = SourceLocator::parse_list(locators)?;
        self.load_all(&parsed)
    }

    /// Loads already parsed locators, left to right.
    ///
    /// # Errors
    ///
    /// The first failing locator aborts the whole list.
    pub fn load_all(&self, locators: &[SourceLocator]) -> Result<Vec<LoadedSource>, SourceError> {
        let mut loaded = Vec::with_capacity(locators.len());
        for locator in locators {
            loaded.extend(self.load(locator)?);
        }
        Ok(loaded)
    }

    /// Loads one locator. `DIR(...)` may yield any number of documents.
    ///
    /// # Errors
    ///
    /// Returns the [`SourceError`] of the first file that fails.
    pub fn load(&self, locator: &SourceLocator) -> Result<Vec<LoadedSource>, SourceError> {
        match locator {
            SourceLocator::Path(path) | SourceLocator::File(path) => {
                Ok(vec![self.load_path(path)?])
            }
            SourceLocator::Dir(dir) => {
                let files = self.reader.list_dir(dir)?;
                tracing::debug!(dir = %dir.display(), files = files.len(), "expanded directory locator");
                files.iter().map(|path| self.load_path(path)).collect()
            }
        }
    }

    /// Reads and parses a single file.
    ///
    /// # Errors
    ///
    /// Read, size, decode, empty and parse failures.
    pub fn load_path(&self, path: &Path) -> Result<LoadedSource, SourceError> {
        let bytes = self.reader.read(path, self.limits.max_source_size)?;
        let (format, document) = parse_source(path, &bytes)?;
        tracing::debug!(path = %path.display(), %format, "loaded source");
        metrics::record_source_loaded(format.as_str());
        Ok(LoadedSource {
            path: path.to_path_buf(),
            format,
            document,
        })
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Decodes and parses raw source bytes. `path` drives format detection and
/// error messages only.
///
/// # Errors
///
/// `Parse` for non-UTF-8 or malformed content, `Empty` when there is no
/// document.
pub fn parse_source(path: &Path, bytes: &[u8]) -> Result<(SourceFormat, DocumentNode), SourceError> {
    let text = std::str::from_utf8(bytes).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        line: None,
        column: None,
        message: format!("invalid UTF-8: {e}"),
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if is_blank(text) {
        return Err(SourceError::Empty {
            path: path.to_path_buf(),
        });
    }

    let format = SourceFormat::detect(path, text);
    let document = match format {
        SourceFormat::Json => parse_json(path, text)?,
        SourceFormat::Yaml => parse_yaml(path, text)?,
    };
    Ok((format, document))
}

/// Whitespace and `#` comment lines only.
fn is_blank(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

fn parse_json(path: &Path, text: &str) -> Result<DocumentNode, SourceError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        line: Some(e.line()).filter(|&l| l > 0),
        column: Some(e.column()).filter(|&c| c > 0),
        message: e.to_string(),
    })?;
    Ok(DocumentNode::from(value))
}

fn parse_yaml(path: &Path, text: &str) -> Result<DocumentNode, SourceError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
        let location = e.location();
        SourceError::Parse {
            path: path.to_path_buf(),
            line: location.as_ref().map(serde_yaml::Location::line),
            column: location.as_ref().map(serde_yaml::Location::column),
            message: e.to_string(),
        }
    })?;
    yaml_to_document(value).map_err(|message| SourceError::Parse {
        path: path.to_path_buf(),
        line: None,
        column: None,
        message,
    })
}
