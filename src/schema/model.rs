//! Compiled schema representation.
//!
//! Every subschema of every composed document lives in one arena and is
//! addressed by [`SchemaId`]. References are resolved to ids before a
//! [`SchemaGraph`] is handed out.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;

use crate::document::DocumentNode;

/// Index of a compiled schema within its [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    /// Raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

// ============================================================================
// Types
// ============================================================================

/// A JSON Schema primitive type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    /// `null`
    Null,
    /// `boolean`
    Boolean,
    /// `object`
    Object,
    /// `array`
    Array,
    /// `number`
    Number,
    /// `string`
    String,
    /// `integer`
    Integer,
}

impl JsonType {
    /// All type names in schema keyword spelling.
    pub const NAMES: [&'static str; 7] = [
        "null", "boolean", "object", "array", "number", "string", "integer",
    ];

    /// Parses a type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "array" => Self::Array,
            "number" => Self::Number,
            "string" => Self::String,
            "integer" => Self::Integer,
            _ => return None,
        })
    }

    /// Keyword spelling of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::String => "string",
            Self::Integer => "integer",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Returns `true` if `value` is an instance of this type.
    ///
    /// `number` accepts integers; `integer` accepts floats with no fraction.
    #[must_use]
    pub fn matches(self, value: &DocumentNode) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Boolean => matches!(value, DocumentNode::Bool(_)),
            Self::Object => value.is_mapping(),
            Self::Array => value.is_sequence(),
            Self::Number => value.is_number(),
            Self::String => matches!(value, DocumentNode::String(_)),
            Self::Integer => value.is_integer(),
        }
    }
}

/// Set of allowed types from a `type` keyword.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeSet(u8);

impl TypeSet {
    /// Adds a type.
    pub const fn insert(&mut self, ty: JsonType) {
        self.0 |= ty.bit();
    }

    /// Returns `true` if `ty` is in the set.
    #[must_use]
    pub const fn contains(self, ty: JsonType) -> bool {
        self.0 & ty.bit() != 0
    }

    /// Returns `true` if no type was listed.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the member types in keyword order.
    pub fn iter(self) -> impl Iterator<Item = JsonType> {
        JsonType::NAMES
            .iter()
            .filter_map(|n| JsonType::from_name(n))
            .filter(move |t| self.contains(*t))
    }

    /// Returns `true` if `value` is an instance of any member type.
    #[must_use]
    pub fn matches(self, value: &DocumentNode) -> bool {
        self.iter().any(|t| t.matches(value))
    }
}

impl FromIterator<JsonType> for TypeSet {
    fn from_iter<I: IntoIterator<Item = JsonType>>(iter: I) -> Self {
        let mut set = Self::default();
        for ty in iter {
            set.insert(ty);
        }
        set
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(JsonType::name).collect();
        f.write_str(&names.join(" or "))
    }
}

impl fmt::Debug for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(JsonType::name)).finish()
    }
}

// ============================================================================
// Schema nodes
// ============================================================================

/// Positional or uniform `items`.
#[derive(Debug, Clone)]
pub enum Items {
    /// Every element validates against one schema.
    Single(SchemaId),
    /// Element `i` validates against schema `i`.
    Positional(Vec<SchemaId>),
}

/// A compiled `pattern` or `patternProperties` key.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Source text as written in the schema.
    pub source: String,
    /// Compiled expression.
    pub regex: Regex,
}

/// The keywords of an object schema.
///
/// Absent keywords are `None` or empty; annotation keywords (`title`,
/// `description`, `default`, `format`, ...) are not kept.
#[derive(Debug, Clone, Default)]
pub struct Keywords {
    pub types: Option<TypeSet>,
    pub enumeration: Option<Vec<DocumentNode>>,
    pub constant: Option<DocumentNode>,

    pub all_of: Vec<SchemaId>,
    pub any_of: Vec<SchemaId>,
    pub one_of: Vec<SchemaId>,
    pub not: Option<SchemaId>,
    pub if_then_else: Option<(SchemaId, Option<SchemaId>, Option<SchemaId>)>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,

    pub items: Option<Items>,
    pub additional_items: Option<SchemaId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub contains: Option<SchemaId>,
    pub min_contains: Option<u64>,
    pub max_contains: Option<u64>,

    pub properties: IndexMap<String, SchemaId>,
    pub required: Vec<String>,
    pub additional_properties: Option<SchemaId>,
    pub pattern_properties: Vec<(Pattern, SchemaId)>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub dependent_required: IndexMap<String, Vec<String>>,
    pub dependent_schemas: IndexMap<String, SchemaId>,
}

/// What a compiled schema does.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Boolean schema: `true` accepts everything, `false` nothing.
    Always(bool),
    /// A `$ref`; `target` is filled in during composition.
    Ref {
        /// Reference text as written.
        reference: String,
        /// Resolved target.
        target: Option<SchemaId>,
    },
    /// A keyword schema.
    Keywords(Box<Keywords>),
}

/// One compiled subschema.
#[derive(Debug, Clone)]
pub struct Schema {
    /// `document#/pointer` of this subschema.
    pub location: String,
    /// Behaviour.
    pub kind: SchemaKind,
}

// ============================================================================
// Graph
// ============================================================================

/// A composed, fully resolved set of schema documents.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    pub(crate) nodes: Vec<Schema>,
    pub(crate) root: SchemaId,
    pub(crate) documents: Vec<String>,
}

impl SchemaGraph {
    /// The root schema (root of the first document).
    #[must_use]
    pub const fn root(&self) -> SchemaId {
        self.root
    }

    /// Keys of the composed documents, in load order.
    #[must_use]
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Number of compiled subschemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph holds no schemas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the schema for `id`.
    ///
    /// # Panics
    ///
    /// Ids are only produced by the graph that owns them; an id from another
    /// graph may be out of range.
    #[must_use]
    pub fn get(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.0]
    }

    /// Follows `$ref` hops from `id` to the first non-reference schema.
    ///
    /// Composition rejects unresolved references and pure `$ref` cycles, so
    /// this terminates.
    #[must_use]
    pub fn resolve(&self, mut id: SchemaId) -> &Schema {
        loop {
            let schema = self.get(id);
            match schema.kind {
                SchemaKind::Ref {
                    target: Some(next), ..
                } => id = next,
                _ => return schema,
            }
        }
    }

    /// Returns the id of the schema compiled at `location`
    /// (`document#/pointer`), if any.
    #[must_use]
    pub fn find(&self, location: &str) -> Option<SchemaId> {
        self.nodes
            .iter()
            .position(|s| s.location == location)
            .map(SchemaId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names_round_trip() {
        for name in JsonType::NAMES {
            assert_eq!(JsonType::from_name(name).unwrap().name(), name);
        }
        assert!(JsonType::from_name("float").is_none());
    }

    #[test]
    fn test_integer_and_number_matching() {
        let whole = DocumentNode::Float(3.0);
        let frac = DocumentNode::Float(3.5);
        let int = DocumentNode::Integer(3);
        assert!(JsonType::Integer.matches(&whole));
        assert!(!JsonType::Integer.matches(&frac));
        assert!(JsonType::Number.matches(&int));
        assert!(!JsonType::String.matches(&int));
    }

    #[test]
    fn test_type_set() {
        let set: TypeSet = [JsonType::String, JsonType::Null].into_iter().collect();
        assert!(set.matches(&DocumentNode::Null));
        assert!(set.matches(&DocumentNode::from(json!("x"))));
        assert!(!set.matches(&DocumentNode::Integer(1)));
        assert_eq!(set.to_string(), "null or string");
        assert!(TypeSet::default().is_empty());
    }
}
