//! Source locator grammar.
//!
//! A locator list is a `:`-separated sequence of segments, each one of
//! `FILE(path)`, `DIR(path)`, `LIBRARY(name)`, `PARMLIBS` or a bare path.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SourceError;

/// Separator between segments of a locator list.
pub const LIST_SEPARATOR: char = ':';

/// One parsed locator segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// Bare path
    Path(PathBuf),
    /// `FILE(path)`
    File(PathBuf),
    /// `DIR(path)`: every JSON/YAML file directly inside, in name order
    Dir(PathBuf),
}

impl SourceLocator {
    /// Parses a single segment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocator` for empty or unterminated segments and
    /// `UnsupportedLocator` for `LIBRARY(...)` and `PARMLIBS`.
    pub fn parse(segment: &str) -> Result<Self, SourceError> {
        let text = segment.trim();
        if text.is_empty() {
            return Err(invalid(segment, "empty segment"));
        }
        if text == "PARMLIBS" || text.starts_with("LIBRARY(") {
            return Err(SourceError::UnsupportedLocator(text.to_string()));
        }
        if let Some(inner) = wrapped(text, "FILE")? {
            return Ok(Self::File(PathBuf::from(inner)));
        }
        if let Some(inner) = wrapped(text, "DIR")? {
            return Ok(Self::Dir(PathBuf::from(inner)));
        }
        Ok(Self::Path(PathBuf::from(text)))
    }

    /// Parses a `:`-separated locator list, preserving order.
    ///
    /// # Errors
    ///
    /// Fails on the first segment that does not parse; an empty list or an
    /// empty segment (`a::b`) is `InvalidLocator`.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, SourceError> {
        if text.trim().is_empty() {
            return Err(invalid(text, "empty locator"));
        }
        text.split(LIST_SEPARATOR)
            .map(|segment| {
                if segment.trim().is_empty() {
                    Err(invalid(text, "empty segment"))
                } else {
                    Self::parse(segment)
                }
            })
            .collect()
    }

    /// Returns the path this locator names.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Path(p) | Self::File(p) | Self::Dir(p) => p,
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::File(p) => write!(f, "FILE({})", p.display()),
            Self::Dir(p) => write!(f, "DIR({})", p.display()),
        }
    }
}

/// Returns the inner text of `KEYWORD(inner)`, `None` if `text` does not
/// start with `KEYWORD(`.
fn wrapped<'a>(text: &'a str, keyword: &str) -> Result<Option<&'a str>, SourceError> {
    let Some(rest) = text
        .strip_prefix(keyword)
        .and_then(|r| r.strip_prefix('('))
    else {
        return Ok(None);
    };
    let inner = rest
        .strip_suffix(')')
        .ok_or_else(|| invalid(text, "missing closing parenthesis"))?
        .trim();
    if inner.is_empty() {
        return Err(invalid(text, "empty path"));
    }
    Ok(Some(inner))
}

fn invalid(locator: &str, reason: &str) -> SourceError {
    SourceError::InvalidLocator {
        locator: locator.to_string(),
        reason: reason.to_string(),
    }
}
