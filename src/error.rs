//! Error types for `configmgr`
//!
//! Every failure the engine can report is one of the domain errors below,
//! aggregated by [`ConfigMgrError`], which also maps each kind to a process
//! exit code.

use std::path::PathBuf;

use thiserror::Error;

use crate::manager::LifecycleState;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `configmgr` operations.
///
/// Zero is success; every error kind maps to its own non-zero code so that
/// callers driving the binary can tell failures apart.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration source error (missing, unreadable or malformed source)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error outside of source loading
    pub const IO_ERROR: i32 = 3;

    /// Schema error (malformed schema, unresolved reference)
    pub const SCHEMA_ERROR: i32 = 4;

    /// The merged document has validity exceptions
    pub const INVALID_DOCUMENT: i32 = 5;

    /// Serialization error (nothing to export, emitter failure)
    pub const SERIALIZATION_ERROR: i32 = 6;

    /// Field lookup error (missing key, bad index, type mismatch)
    pub const LOOKUP_ERROR: i32 = 7;

    /// Usage error (operation out of order, unknown or duplicate name)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `configmgr` operations.
#[derive(Debug, Error)]
pub enum ConfigMgrError {
    /// Configuration source could not be loaded
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Schema documents could not be composed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Operation invoked out of lifecycle order or on an unknown name
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// `add_config` on a name that is already registered
    #[error("configuration '{0}' is already registered")]
    DuplicateName(String),

    /// Export failed
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The validation walk could not run to completion
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Structured field access failed
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The merged document has validity exceptions and the caller required
    /// a conforming one
    #[error("configuration '{name}' has {exceptions} validity exception(s)")]
    InvalidDocument {
        /// Configuration name
        name: String,
        /// Number of leaf exceptions
        exceptions: usize,
    },

    /// The Prometheus recorder could not be installed
    #[error("metrics recorder: {0}")]
    Metrics(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigMgrError {
    /// Returns the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Source(_) => ExitCode::CONFIG_ERROR,
            Self::Schema(_) => ExitCode::SCHEMA_ERROR,
            Self::Usage(_) | Self::DuplicateName(_) => ExitCode::USAGE_ERROR,
            Self::Serialization(_) => ExitCode::SERIALIZATION_ERROR,
            Self::Validation(_) | Self::Metrics(_) => ExitCode::ERROR,
            Self::Lookup(_) => ExitCode::LOOKUP_ERROR,
            Self::InvalidDocument { .. } => ExitCode::INVALID_DOCUMENT,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }

    /// Returns `true` if this is a usage error (out of order, unknown name).
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

// ============================================================================
// Source Errors
// ============================================================================

/// Errors raised while resolving a locator or reading and parsing a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Referenced source does not exist
    #[error("source not found: {path}")]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Source exists but may not be read
    #[error("permission denied reading {path}")]
    PermissionDenied {
        /// Path that was refused
        path: PathBuf,
    },

    /// Any other read failure
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Content did not parse in its detected format
    #[error("parse error in {path}{}: {message}", format_position(.line.as_ref(), .column.as_ref()))]
    Parse {
        /// Path of the source
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Column where the error occurred (if available)
        column: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Source holds no document
    #[error("source {path} is empty")]
    Empty {
        /// Path of the source
        path: PathBuf,
    },

    /// Source exceeds the configured size limit
    #[error("source {path} is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Path of the source
        path: PathBuf,
        /// Actual size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Locator string is malformed
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator {
        /// The offending locator text
        locator: String,
        /// What is wrong with it
        reason: String,
    },

    /// Locator kind is recognized but not supported on this platform
    #[error("unsupported locator '{0}'")]
    UnsupportedLocator(String),
}

fn format_position(line: Option<&usize>, column: Option<&usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at line {line} column {column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

// ============================================================================
// Schema Errors
// ============================================================================

/// Errors raised while composing schema documents into a graph.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A schema document could not be loaded
    #[error("schema source error: {0}")]
    Source(#[from] SourceError),

    /// No schema locators were given
    #[error("no schema documents to compose")]
    NoSchemas,

    /// A schema document is structurally invalid
    #[error("invalid schema at {document}#{path}: {message}")]
    InvalidSchema {
        /// Key of the schema document
        document: String,
        /// JSON pointer into the schema document
        path: String,
        /// What is wrong
        message: String,
    },

    /// A `$ref` does not resolve within the composed set
    #[error("unresolved reference '{reference}' at {location}")]
    UnresolvedReference {
        /// The reference text
        reference: String,
        /// Where the reference occurs (`document#pointer`)
        location: String,
    },

    /// A chain of `$ref` hops loops back on itself
    #[error("circular reference chain starting at {location}")]
    CircularReference {
        /// Where the chain starts (`document#pointer`)
        location: String,
    },
}

// ============================================================================
// Usage Errors
// ============================================================================

/// Facade operations invoked on unknown names or out of lifecycle order.
#[derive(Debug, Error)]
pub enum UsageError {
    /// Name was never registered (or has been removed)
    #[error("no configuration named '{name}'{}", suggestion_suffix(.suggestion.as_deref()))]
    UnknownName {
        /// The requested name
        name: String,
        /// Closest registered name, if any is close enough
        suggestion: Option<String>,
    },

    /// Operation requires a later lifecycle state than the one reached
    #[error("cannot {operation} '{name}' in state {state}")]
    OutOfOrder {
        /// Configuration name
        name: String,
        /// Operation that was attempted
        operation: &'static str,
        /// State the configuration is in
        state: LifecycleState,
    },

    /// Configuration names must be non-empty
    #[error("configuration name must not be empty")]
    EmptyName,
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

// ============================================================================
// Serialization Errors
// ============================================================================

/// Export failures.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// There is no merged document to export
    #[error("configuration '{0}' has no merged document")]
    NoDocument(String),

    /// YAML emitter failed
    #[error("YAML emit failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON emitter failed
    #[error("JSON emit failed: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Failures that stop the validation walk itself.
///
/// These are distinct from validity exceptions, which describe a document
/// that does not conform and are reported as data.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema recursion went deeper than the configured limit
    #[error("validation exceeded maximum depth {limit} at '{path}'")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
        /// Instance path at which the limit was hit
        path: String,
    },
}

// ============================================================================
// Lookup Errors
// ============================================================================

/// Structured field access failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Path text could not be parsed
    #[error("invalid path '{0}'")]
    InvalidPath(String),

    /// Mapping has no such key
    #[error("no key '{key}' at '{at}'")]
    MissingKey {
        /// Missing key
        key: String,
        /// Path of the mapping
        at: String,
    },

    /// Sequence was indexed with something that is not an index
    #[error("'{segment}' is not an array index at '{at}'")]
    IndexNotInteger {
        /// Offending segment
        segment: String,
        /// Path of the sequence
        at: String,
    },

    /// Sequence index past the end
    #[error("index {index} out of bounds (length {len}) at '{at}'")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
        /// Path of the sequence
        at: String,
    },

    /// Path continues below a scalar
    #[error("cannot descend into scalar at '{at}'")]
    ScalarTraversal {
        /// Path of the scalar
        at: String,
    },

    /// Value exists but has another type
    #[error("expected {expected} at '{at}', found {found}")]
    TypeMismatch {
        /// Requested type
        expected: &'static str,
        /// Actual type
        found: &'static str,
        /// Path of the value
        at: String,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `configmgr` operations.
pub type Result<T> = std::result::Result<T, ConfigMgrError>;

// ============================================================================
// Tests
// ============================================================================
