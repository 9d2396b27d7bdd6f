//! Document model
//!
//! [`DocumentNode`] is the single in-memory representation shared by parsed
//! configuration sources, merged output and schema documents. Mappings keep
//! insertion order so that merged and exported documents read the same way
//! the sources did.

mod convert;
pub mod pointer;

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

pub use convert::yaml_to_document;
pub use pointer::{DocumentPath, escape_token};

/// Ordered string-keyed mapping used by [`DocumentNode::Mapping`].
pub type Mapping = IndexMap<String, DocumentNode>;

static NULL: DocumentNode = DocumentNode::Null;

/// A parsed JSON/YAML value.
///
/// Equality is structural. Integers and floats compare numerically, so
/// `Integer(1) == Float(1.0)`. A YAML `.nan` equals another NaN, which keeps
/// a document equal to itself after an export and reload.
#[derive(Debug, Clone, Default)]
pub enum DocumentNode {
    /// `null` / `~`
    #[default]
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Number without fractional part that fits in `i64`
    Integer(i64),
    /// Any other number
    Float(f64),
    /// String scalar
    String(String),
    /// Ordered sequence
    Sequence(Vec<DocumentNode>),
    /// Ordered mapping with string keys
    Mapping(Mapping),
}

impl DocumentNode {
    /// Returns the JSON type name of this value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "array",
            Self::Mapping(_) => "object",
        }
    }

    /// Returns `true` for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for `Mapping`.
    #[must_use]
    pub const fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Returns `true` for `Sequence`.
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Returns `true` for `Integer` and `Float`.
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// Returns `true` for integers, including floats with no fractional part.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        match self {
            Self::Integer(_) => true,
            Self::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => false,
        }
    }

    /// Returns the boolean value, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an `Integer`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value as `f64`, if this is a number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements, if this is a `Sequence`.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping, if this is a `Mapping`.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the mapping mutably, if this is a `Mapping`.
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key in a mapping. Returns `None` for non-mappings.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Resolves a JSON pointer or dotted path against this value.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`](crate::error::LookupError) describing the
    /// first segment that could not be followed.
    pub fn lookup(&self, path: &str) -> Result<&Self, crate::error::LookupError> {
        DocumentPath::parse(path)?.resolve(self)
    }

    /// Converts to a `serde_json::Value`.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::Number((*i).into()),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

// ============================================================================
// Equality
// ============================================================================

impl PartialEq for DocumentNode {
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                *a as f64 == *b
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            // IndexMap equality is order-insensitive.
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<serde_json::Value> for DocumentNode {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_i64().map_or_else(
                || Self::Float(n.as_f64().unwrap_or(f64::NAN)),
                Self::Integer,
            ),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for DocumentNode {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DocumentNode {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for DocumentNode {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DocumentNode {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DocumentNode {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Self>> for DocumentNode {
    fn from(value: Vec<Self>) -> Self {
        Self::Sequence(value)
    }
}

impl From<Mapping> for DocumentNode {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

// ============================================================================
// Indexing
// ============================================================================

impl Index<&str> for DocumentNode {
    type Output = Self;

    /// Mapping lookup that yields `Null` for missing keys and non-mappings.
    fn index(&self, key: &str) -> &Self::Output {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for DocumentNode {
    type Output = Self;

    /// Sequence lookup that yields `Null` when out of range.
    fn index(&self, index: usize) -> &Self::Output {
        self.as_sequence()
            .and_then(|items| items.get(index))
            .unwrap_or(&NULL)
    }
}

// ============================================================================
// Serialization
// ============================================================================

impl Serialize for DocumentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(items) => serializer.collect_seq(items),
            Self::Mapping(map) => serializer.collect_map(map),
        }
    }
}

impl fmt::Display for DocumentNode {
    /// Compact JSON rendering.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_key_order() {
        let doc = DocumentNode::from(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&str> = doc
            .as_mapping()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_numbers_split_into_integer_and_float() {
        let doc = DocumentNode::from(json!({"port": 8080, "ratio": 0.5}));
        assert_eq!(doc["port"], DocumentNode::Integer(8080));
        assert_eq!(doc["ratio"], DocumentNode::Float(0.5));
    }

    #[test]
    fn test_integer_equals_float_numerically() {
        assert_eq!(DocumentNode::Integer(3), DocumentNode::Float(3.0));
        assert_ne!(DocumentNode::Integer(3), DocumentNode::Float(3.5));
        assert_ne!(DocumentNode::Integer(1), DocumentNode::Bool(true));
    }

    #[test]
    fn test_nan_equals_nan() {
        let nan = yaml_to_document(serde_yaml::from_str("ratio: .nan").unwrap()).unwrap();
        assert!(matches!(nan["ratio"], DocumentNode::Float(f) if f.is_nan()));
        assert_eq!(nan, nan.clone());
        assert_ne!(nan["ratio"], DocumentNode::Float(0.0));
        assert_ne!(nan["ratio"], DocumentNode::Integer(0));
    }

    #[test]
    fn test_mapping_equality_ignores_order() {
        let a = DocumentNode::from(json!({"a": 1, "b": 2}));
        let b = DocumentNode::from(json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_integer_accepts_whole_floats() {
        assert!(DocumentNode::Float(2.0).is_integer());
        assert!(!DocumentNode::Float(2.5).is_integer());
        assert!(!DocumentNode::Float(f64::INFINITY).is_integer());
        assert!(!DocumentNode::String("2".into()).is_integer());
    }

    #[test]
    fn test_index_missing_is_null() {
        let doc = DocumentNode::from(json!({"a": [1, 2]}));
        assert!(doc["missing"].is_null());
        assert_eq!(doc["a"][1], DocumentNode::Integer(2));
        assert!(doc["a"][5].is_null());
        assert!(doc["a"]["x"].is_null());
    }

    #[test]
    fn test_to_json_round_trip() {
        let value = json!({"name": "svc", "ports": [80, 443], "tls": {"enabled": true}, "x": null});
        let doc = DocumentNode::from(value.clone());
        assert_eq!(doc.to_json(), value);
    }

    #[test]
    fn test_non_finite_float_to_json_is_null() {
        assert_eq!(DocumentNode::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_display_is_compact_json() {
        let doc = DocumentNode::from(json!({"a": [1, "two"]}));
        assert_eq!(doc.to_string(), r#"{"a":[1,"two"]}"#);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(DocumentNode::Null.type_name(), "null");
        assert_eq!(DocumentNode::Integer(1).type_name(), "integer");
        assert_eq!(DocumentNode::Float(1.5).type_name(), "number");
        assert_eq!(DocumentNode::Mapping(Mapping::new()).type_name(), "object");
        assert_eq!(DocumentNode::Sequence(vec![]).type_name(), "array");
    }
}
