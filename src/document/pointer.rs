//! Path lookups into documents.
//!
//! Two spellings are accepted: RFC 6901 JSON pointers (`/zowe/setup/0`,
//! `~0` and `~1` escapes) and dotted paths (`zowe.setup.0`). The empty
//! string addresses the whole document.

use std::fmt;

use super::DocumentNode;
use crate::error::LookupError;

/// Escapes a mapping key for use as a JSON pointer token.
#[must_use]
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// A parsed lookup path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Parses a JSON pointer (leading `/`) or a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidPath`] for malformed `~` escapes or
    /// empty dotted segments.
    pub fn parse(text: &str) -> Result<Self, LookupError> {
        if text.is_empty() {
            return Ok(Self::default());
        }
        let segments = if let Some(pointer) = text.strip_prefix('/') {
            pointer
                .split('/')
                .map(|token| unescape_token(token).ok_or_else(|| invalid(text)))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let segments: Vec<String> = text.split('.').map(str::to_string).collect();
            if segments.iter().any(String::is_empty) {
                return Err(invalid(text));
            }
            segments
        };
        Ok(Self { segments })
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` if this path addresses the whole document.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Follows this path from `root`.
    ///
    /// # Errors
    ///
    /// Returns the [`LookupError`] for the first segment that cannot be
    /// followed.
    pub fn resolve<'a>(&self, root: &'a DocumentNode) -> Result<&'a DocumentNode, LookupError> {
        let mut current = root;
        for (depth, segment) in self.segments.iter().enumerate() {
            let at = render_pointer(&self.segments[..depth]);
            current = match current {
                DocumentNode::Mapping(map) => {
                    map.get(segment).ok_or_else(|| LookupError::MissingKey {
                        key: segment.clone(),
                        at,
                    })?
                }
                DocumentNode::Sequence(items) => {
                    let index = parse_index(segment).ok_or_else(|| {
                        LookupError::IndexNotInteger {
                            segment: segment.clone(),
                            at: at.clone(),
                        }
                    })?;
                    items.get(index).ok_or(LookupError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                        at,
                    })?
                }
                _ => return Err(LookupError::ScalarTraversal { at }),
            };
        }
        Ok(current)
    }
}

impl fmt::Display for DocumentPath {
    /// Renders as a JSON pointer; the root renders as `/`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_pointer(&self.segments))
    }
}

fn render_pointer(segments: &[String]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments
        .iter()
        .map(|s| format!("/{}", escape_token(s)))
        .collect()
}

fn invalid(text: &str) -> LookupError {
    LookupError::InvalidPath(text.to_string())
}

fn unescape_token(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Array indexes are `0` or digits without a leading zero.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty()
        || !segment.bytes().all(|b| b.is_ascii_digit())
        || (segment.len() > 1 && segment.starts_with('0'))
    {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> DocumentNode {
        DocumentNode::from(json!({
            "zowe": {
                "setup": {"dataset": {"prefix": "IBMUSER.ZWE"}},
                "launchers": ["gateway", "discovery"],
                "a/b": 1,
                "m~n": 2
            },
            "port": 7554
        }))
    }

    #[test]
    fn test_json_pointer_lookup() {
        let d = doc();
        let v = d.lookup("/zowe/setup/dataset/prefix").unwrap();
        assert_eq!(v.as_str(), Some("IBMUSER.ZWE"));
        assert_eq!(d.lookup("/zowe/launchers/1").unwrap().as_str(), Some("discovery"));
    }

    #[test]
    fn test_dotted_lookup() {
        let d = doc();
        assert_eq!(d.lookup("zowe.launchers.0").unwrap().as_str(), Some("gateway"));
        assert_eq!(d.lookup("port").unwrap().as_i64(), Some(7554));
    }

    #[test]
    fn test_pointer_escapes() {
        let d = doc();
        assert_eq!(d.lookup("/zowe/a~1b").unwrap().as_i64(), Some(1));
        assert_eq!(d.lookup("/zowe/m~0n").unwrap().as_i64(), Some(2));
        assert!(matches!(d.lookup("/zowe/m~2n"), Err(LookupError::InvalidPath(_))));
    }

    #[test]
    fn test_empty_path_is_root() {
        let d = doc();
        assert_eq!(d.lookup("").unwrap(), &d);
    }

    #[test]
    fn test_missing_key_reports_parent_path() {
        let err = doc().lookup("zowe.setup.missing").unwrap_err();
        assert_eq!(
            err,
            LookupError::MissingKey {
                key: "missing".to_string(),
                at: "/zowe/setup".to_string(),
            }
        );
    }

    #[test]
    fn test_index_errors() {
        let d = doc();
        assert!(matches!(
            d.lookup("zowe.launchers.first"),
            Err(LookupError::IndexNotInteger { .. })
        ));
        assert!(matches!(
            d.lookup("zowe.launchers.01"),
            Err(LookupError::IndexNotInteger { .. })
        ));
        assert_eq!(
            d.lookup("zowe.launchers.9").unwrap_err(),
            LookupError::IndexOutOfBounds {
                index: 9,
                len: 2,
                at: "/zowe/launchers".to_string(),
            }
        );
    }

    #[test]
    fn test_scalar_traversal() {
        assert_eq!(
            doc().lookup("port.inner").unwrap_err(),
            LookupError::ScalarTraversal {
                at: "/port".to_string()
            }
        );
    }

    #[test]
    fn test_empty_dotted_segment_rejected() {
        assert!(matches!(
            DocumentPath::parse("zowe..setup"),
            Err(LookupError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_display_renders_pointer() {
        let path = DocumentPath::parse("zowe.a/b").unwrap();
        assert_eq!(path.to_string(), "/zowe/a~1b");
        assert_eq!(DocumentPath::default().to_string(), "/");
    }
}
