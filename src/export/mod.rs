//! Export
//!
//! Serializes merged documents for diagnostics and reads typed fields out
//! of them. Mapping key order is preserved in both output formats.

use std::fmt;

use crate::document::DocumentNode;
use crate::error::{LookupError, SerializationError};

/// Output format for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// YAML block style
    #[default]
    Yaml,
    /// Pretty-printed JSON
    Json,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        })
    }
}

/// Serializes `document` as YAML.
///
/// Strings that would re-read as another type (`"true"`, `"8080"`, `"~"`)
/// are quoted by the emitter.
///
/// # Errors
///
/// Returns [`SerializationError::Yaml`] if the emitter fails.
pub fn to_yaml(document: &DocumentNode) -> Result<String, SerializationError> {
    Ok(serde_yaml::to_string(document)?)
}

/// Serializes `document` as JSON.
///
/// # Errors
///
/// Returns [`SerializationError::Json`] if the emitter fails.
pub fn to_json(document: &DocumentNode, pretty: bool) -> Result<String, SerializationError> {
    let text = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(text)
}

/// Serializes `document` in `format`.
///
/// # Errors
///
/// Propagates emitter failures.
pub fn render(document: &DocumentNode, format: ExportFormat) -> Result<String, SerializationError> {
    match format {
        ExportFormat::Yaml => to_yaml(document),
        ExportFormat::Json => to_json(document, true).map(|mut text| {
            text.push('\n');
            text
        }),
    }
}

// ============================================================================
// Typed field access
// ============================================================================

/// Resolves `path` and returns the value there.
///
/// # Errors
///
/// The [`LookupError`] for the first segment that cannot be followed.
pub fn get_value<'a>(document: &'a DocumentNode, path: &str) -> Result<&'a DocumentNode, LookupError> {
    document.lookup(path)
}

fn typed<'a, T>(
    document: &'a DocumentNode,
    path: &str,
    expected: &'static str,
    extract: impl FnOnce(&'a DocumentNode) -> Option<T>,
) -> Result<T, LookupError> {
    let value = document.lookup(path)?;
    extract(value).ok_or_else(|| LookupError::TypeMismatch {
        expected,
        found: value.type_name(),
        at: path.to_string(),
    })
}

/// Returns the string at `path`.
///
/// # Errors
///
/// Lookup failures, or `TypeMismatch` when the value is not a string.
pub fn get_str<'a>(document: &'a DocumentNode, path: &str) -> Result<&'a str, LookupError> {
    typed(document, path, "string", DocumentNode::as_str)
}

/// Returns the integer at `path`. Floats with no fraction are accepted.
///
/// # Errors
///
/// Lookup failures, or `TypeMismatch` when the value is not an integer.
#[allow(clippy::cast_possible_truncation)]
pub fn get_i64(document: &DocumentNode, path: &str) -> Result<i64, LookupError> {
    typed(document, path, "integer", |value| match value {
        DocumentNode::Integer(i) => Some(*i),
        DocumentNode::Float(f) if value.is_integer() && f.abs() < 9.2e18 => Some(*f as i64),
        _ => None,
    })
}

/// Returns the boolean at `path`.
///
/// # Errors
///
/// Lookup failures, or `TypeMismatch` when the value is not a boolean.
pub fn get_bool(document: &DocumentNode, path: &str) -> Result<bool, LookupError> {
    typed(document, path, "boolean", DocumentNode::as_bool)
}
