//! Schema composition.
//!
//! Composition runs in two phases over the whole document set:
//! 1. Compile every document into the arena, recording each subschema by
//!    `(document, JSON pointer)` and each anchor.
//! 2. Resolve every `$ref` against that index, compiling referenced
//!    locations that phase 1 did not reach, then reject pure `$ref` cycles.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use regex::Regex;

use super::model::{
    Items, JsonType, Keywords, Pattern, Schema, SchemaGraph, SchemaId, SchemaKind, TypeSet,
};
use crate::document::{DocumentNode, DocumentPath, Mapping, escape_token};
use crate::error::SchemaError;

/// A parsed schema document awaiting composition.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Key used in locations and error messages (the locator path as given).
    pub key: String,
    /// Path the document was read from.
    pub path: PathBuf,
    /// Parsed content.
    pub document: DocumentNode,
}

impl SchemaDocument {
    /// Creates a document keyed by `path`'s display form.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, document: DocumentNode) -> Self {
        let path = path.into();
        Self {
            key: path.display().to_string(),
            path,
            document,
        }
    }

    /// Root `$id` (or legacy `id`) of the document, without a trailing `#`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        let map = self.document.as_mapping()?;
        map.get("$id")
            .or_else(|| map.get("id"))
            .and_then(DocumentNode::as_str)
            .map(|id| id.trim_end_matches('#'))
            .filter(|id| !id.is_empty())
    }
}

/// Composes `documents` into one graph whose root is the first document.
///
/// # Errors
///
/// `NoSchemas` for an empty set, `InvalidSchema` for structural problems,
/// `UnresolvedReference` and `CircularReference` for `$ref` failures.
pub fn compose(documents: &[SchemaDocument]) -> Result<SchemaGraph, SchemaError> {
    if documents.is_empty() {
        return Err(SchemaError::NoSchemas);
    }
    let mut composer = Composer::new(documents);

    for (index, doc) in documents.iter().enumerate() {
        composer.compile(index, &doc.document, String::new())?;
        tracing::debug!(document = %doc.key, "compiled schema document");
    }
    composer.resolve_pending()?;
    composer.check_cycles()?;

    let root = composer
        .locations
        .get(&(0, String::new()))
        .copied()
        .unwrap_or(SchemaId(0));
    Ok(SchemaGraph {
        nodes: composer.nodes,
        root,
        documents: documents.iter().map(|d| d.key.clone()).collect(),
    })
}

// ============================================================================
// Composer
// ============================================================================

struct PendingRef {
    node: SchemaId,
    document: usize,
}

struct Composer<'a> {
    documents: &'a [SchemaDocument],
    nodes: Vec<Schema>,
    locations: HashMap<(usize, String), SchemaId>,
    anchors: HashMap<(usize, String), SchemaId>,
    pending: Vec<PendingRef>,
}

impl<'a> Composer<'a> {
    fn new(documents: &'a [SchemaDocument]) -> Self {
        Self {
            documents,
            nodes: Vec::new(),
            locations: HashMap::new(),
            anchors: HashMap::new(),
            pending: Vec::new(),
        }
    }

    fn location(&self, doc: usize, pointer: &str) -> String {
        format!("{}#{pointer}", self.documents[doc].key)
    }

    fn invalid(&self, doc: usize, pointer: &str, message: impl Into<String>) -> SchemaError {
        SchemaError::InvalidSchema {
            document: self.documents[doc].key.clone(),
            path: if pointer.is_empty() {
                "/".to_string()
            } else {
                pointer.to_string()
            },
            message: message.into(),
        }
    }

    // ------------------------------------------------------------------------
    // Phase 1
    // ------------------------------------------------------------------------

    fn compile(
        &mut self,
        doc: usize,
        value: &DocumentNode,
        pointer: String,
    ) -> Result<SchemaId, SchemaError> {
        if let Some(&id) = self.locations.get(&(doc, pointer.clone())) {
            return Ok(id);
        }
        let id = SchemaId(self.nodes.len());
        self.nodes.push(Schema {
            location: self.location(doc, &pointer),
            kind: SchemaKind::Always(true),
        });
        self.locations.insert((doc, pointer.clone()), id);

        let kind = match value {
            DocumentNode::Bool(b) => SchemaKind::Always(*b),
            DocumentNode::Mapping(map) => self.compile_object(doc, map, &pointer, id)?,
            other => {
                return Err(self.invalid(
                    doc,
                    &pointer,
                    format!(
                        "schema must be an object or a boolean, found {}",
                        other.type_name()
                    ),
                ));
            }
        };
        self.nodes[id.0].kind = kind;
        Ok(id)
    }

    fn compile_object(
        &mut self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        id: SchemaId,
    ) -> Result<SchemaKind, SchemaError> {
        self.register_anchors(doc, map, pointer, id)?;
        for key in ["$defs", "definitions"] {
            self.schema_map(doc, map, pointer, key)?;
        }

        if let Some(reference) = map.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| self.invalid(doc, pointer, "$ref must be a string"))?;
            self.pending.push(PendingRef { node: id, document: doc });
            return Ok(SchemaKind::Ref {
                reference: reference.to_string(),
                target: None,
            });
        }

        let mut kw = Keywords {
            types: self.types(doc, map, pointer)?,
            ..Keywords::default()
        };

        if let Some(values) = map.get("enum") {
            let values = values
                .as_sequence()
                .ok_or_else(|| self.invalid(doc, pointer, "enum must be an array"))?;
            kw.enumeration = Some(values.to_vec());
        }
        kw.constant = map.get("const").cloned();

        kw.all_of = self.schema_array(doc, map, pointer, "allOf")?;
        kw.any_of = self.schema_array(doc, map, pointer, "anyOf")?;
        kw.one_of = self.schema_array(doc, map, pointer, "oneOf")?;
        kw.not = self.child(doc, map, pointer, "not")?;
        let then_branch = self.child(doc, map, pointer, "then")?;
        let else_branch = self.child(doc, map, pointer, "else")?;
        if let Some(condition) = self.child(doc, map, pointer, "if")? {
            kw.if_then_else = Some((condition, then_branch, else_branch));
        }

        self.numeric_keywords(doc, map, pointer, &mut kw)?;

        kw.min_length = self.count(doc, map, pointer, "minLength")?;
        kw.max_length = self.count(doc, map, pointer, "maxLength")?;
        kw.pattern = map
            .get("pattern")
            .map(|p| {
                let source = p
                    .as_str()
                    .ok_or_else(|| self.invalid(doc, pointer, "pattern must be a string"))?;
                self.pattern(doc, pointer, source)
            })
            .transpose()?;

        kw.items = match map.get("items") {
            None => None,
            Some(DocumentNode::Sequence(items)) => {
                let mut ids = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    ids.push(self.compile(doc, item, format!("{pointer}/items/{i}"))?);
                }
                Some(Items::Positional(ids))
            }
            Some(item) => Some(Items::Single(self.compile(
                doc,
                item,
                format!("{pointer}/items"),
            )?)),
        };
        kw.additional_items = self.child(doc, map, pointer, "additionalItems")?;
        kw.min_items = self.count(doc, map, pointer, "minItems")?;
        kw.max_items = self.count(doc, map, pointer, "maxItems")?;
        kw.unique_items = match map.get("uniqueItems") {
            None => false,
            Some(DocumentNode::Bool(b)) => *b,
            Some(_) => return Err(self.invalid(doc, pointer, "uniqueItems must be a boolean")),
        };
        kw.contains = self.child(doc, map, pointer, "contains")?;
        kw.min_contains = self.count(doc, map, pointer, "minContains")?;
        kw.max_contains = self.count(doc, map, pointer, "maxContains")?;

        kw.properties = self.schema_map(doc, map, pointer, "properties")?;
        kw.required = self.string_array(doc, pointer, map.get("required"), "required")?;
        kw.additional_properties = self.child(doc, map, pointer, "additionalProperties")?;
        for (source, id) in self.schema_map(doc, map, pointer, "patternProperties")? {
            let compiled = self.pattern(doc, &format!("{pointer}/patternProperties"), &source)?;
            kw.pattern_properties.push((compiled, id));
        }
        kw.min_properties = self.count(doc, map, pointer, "minProperties")?;
        kw.max_properties = self.count(doc, map, pointer, "maxProperties")?;
        self.dependencies(doc, map, pointer, &mut kw)?;

        Ok(SchemaKind::Keywords(Box::new(kw)))
    }

    fn register_anchors(
        &mut self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        id: SchemaId,
    ) -> Result<(), SchemaError> {
        if let Some(anchor) = map.get("$anchor") {
            let name = anchor
                .as_str()
                .filter(|a| !a.is_empty())
                .ok_or_else(|| self.invalid(doc, pointer, "$anchor must be a non-empty string"))?;
            self.anchors.insert((doc, name.to_string()), id);
        }
        // Draft 6/7 spelling of a plain-name anchor.
        if let Some(name) = map
            .get("$id")
            .and_then(DocumentNode::as_str)
            .and_then(|s| s.strip_prefix('#'))
            .filter(|s| !s.is_empty() && !s.starts_with('/'))
        {
            self.anchors.insert((doc, name.to_string()), id);
        }
        Ok(())
    }

    fn types(
        &self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
    ) -> Result<Option<TypeSet>, SchemaError> {
        let Some(value) = map.get("type") else {
            return Ok(None);
        };
        let names: Vec<&DocumentNode> = match value {
            DocumentNode::String(_) => vec![value],
            DocumentNode::Sequence(items) if !items.is_empty() => items.iter().collect(),
            _ => {
                return Err(self.invalid(
                    doc,
                    pointer,
                    "type must be a type name or a non-empty array of type names",
                ));
            }
        };
        let mut set = TypeSet::default();
        for name in names {
            let name = name
                .as_str()
                .ok_or_else(|| self.invalid(doc, pointer, "type names must be strings"))?;
            let ty = JsonType::from_name(name).ok_or_else(|| {
                let hint = closest_type_name(name)
                    .map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"));
                self.invalid(doc, pointer, format!("unknown type '{name}'{hint}"))
            })?;
            set.insert(ty);
        }
        Ok(Some(set))
    }

    fn numeric_keywords(
        &self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        kw: &mut Keywords,
    ) -> Result<(), SchemaError> {
        kw.minimum = self.number(doc, map, pointer, "minimum")?;
        kw.maximum = self.number(doc, map, pointer, "maximum")?;
        kw.exclusive_minimum = self.exclusive(doc, map, pointer, "exclusiveMinimum", &mut kw.minimum)?;
        kw.exclusive_maximum = self.exclusive(doc, map, pointer, "exclusiveMaximum", &mut kw.maximum)?;
        kw.multiple_of = self.number(doc, map, pointer, "multipleOf")?;
        if kw.multiple_of.is_some_and(|m| m <= 0.0) {
            return Err(self.invalid(doc, pointer, "multipleOf must be greater than 0"));
        }
        Ok(())
    }

    /// Reads `exclusiveMinimum`/`exclusiveMaximum` in either form. The
    /// boolean form turns the paired inclusive bound into the exclusive one.
    fn exclusive(
        &self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        key: &str,
        inclusive: &mut Option<f64>,
    ) -> Result<Option<f64>, SchemaError> {
        match map.get(key) {
            None | Some(DocumentNode::Bool(false)) => Ok(None),
            Some(DocumentNode::Bool(true)) => inclusive.take().map(Some).ok_or_else(|| {
                self.invalid(doc, pointer, format!("{key}: true requires the paired bound"))
            }),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                self.invalid(doc, pointer, format!("{key} must be a number or a boolean"))
            }),
        }
    }

    fn dependencies(
        &mut self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        kw: &mut Keywords,
    ) -> Result<(), SchemaError> {
        if let Some(value) = map.get("dependentRequired") {
            let entries = value
                .as_mapping()
                .ok_or_else(|| self.invalid(doc, pointer, "dependentRequired must be an object"))?;
            for (name, required) in entries {
                let names = self.string_array(doc, pointer, Some(required), "dependentRequired")?;
                kw.dependent_required.insert(name.clone(), names);
            }
        }
        kw.dependent_schemas = self.schema_map(doc, map, pointer, "dependentSchemas")?;

        // Draft 4-7 `dependencies` mixes both forms.
        if let Some(value) = map.get("dependencies") {
            let entries = value
                .as_mapping()
                .ok_or_else(|| self.invalid(doc, pointer, "dependencies must be an object"))?;
            for (name, dependency) in entries {
                if dependency.is_sequence() {
                    let names =
                        self.string_array(doc, pointer, Some(dependency), "dependencies")?;
                    kw.dependent_required.insert(name.clone(), names);
                } else {
                    let child = format!("{pointer}/dependencies/{}", escape_token(name));
                    let id = self.compile(doc, dependency, child)?;
                    kw.dependent_schemas.insert(name.clone(), id);
                }
            }
        }
        Ok(())
    }

    fn child(
        &mut self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        key: &str,
    ) -> Result<Option<SchemaId>, SchemaError> {
        map.get(key)
            .map(|value| self.compile(doc, value, format!("{pointer}/{key}")))
            .transpose()
    }

    fn schema_array(
        &mut self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        key: &str,
    ) -> Result<Vec<SchemaId>, SchemaError> {
        let Some(value) = map.get(key) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_sequence()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| self.invalid(doc, pointer, format!("{key} must be a non-empty array")))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.compile(doc, item, format!("{pointer}/{key}/{i}")))
            .collect()
    }

    fn schema_map(
        &mut self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        key: &str,
    ) -> Result<IndexMap<String, SchemaId>, SchemaError> {
        let Some(value) = map.get(key) else {
            return Ok(IndexMap::new());
        };
        let entries = value
            .as_mapping()
            .ok_or_else(|| self.invalid(doc, pointer, format!("{key} must be an object")))?;
        let mut out = IndexMap::with_capacity(entries.len());
        for (name, schema) in entries {
            let child = format!("{pointer}/{key}/{}", escape_token(name));
            out.insert(name.clone(), self.compile(doc, schema, child)?);
        }
        Ok(out)
    }

    fn number(
        &self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        key: &str,
    ) -> Result<Option<f64>, SchemaError> {
        map.get(key)
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| self.invalid(doc, pointer, format!("{key} must be a number")))
            })
            .transpose()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn count(
        &self,
        doc: usize,
        map: &Mapping,
        pointer: &str,
        key: &str,
    ) -> Result<Option<u64>, SchemaError> {
        let Some(value) = map.get(key) else {
            return Ok(None);
        };
        let count = match value {
            DocumentNode::Integer(i) => u64::try_from(*i).ok(),
            DocumentNode::Float(f) if value.is_integer() && *f >= 0.0 => Some(*f as u64),
            _ => None,
        };
        count.map(Some).ok_or_else(|| {
            self.invalid(doc, pointer, format!("{key} must be a non-negative integer"))
        })
    }

    fn string_array(
        &self,
        doc: usize,
        pointer: &str,
        value: Option<&DocumentNode>,
        key: &str,
    ) -> Result<Vec<String>, SchemaError> {
        let Some(value) = value else {
            return Ok(Vec::new());
        };
        let error = || self.invalid(doc, pointer, format!("{key} must be an array of strings"));
        value
            .as_sequence()
            .ok_or_else(error)?
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(error))
            .collect()
    }

    fn pattern(&self, doc: usize, pointer: &str, source: &str) -> Result<Pattern, SchemaError> {
        let regex = Regex::new(source).map_err(|e| {
            self.invalid(doc, pointer, format!("invalid pattern '{source}': {e}"))
        })?;
        Ok(Pattern {
            source: source.to_string(),
            regex,
        })
    }

    // ------------------------------------------------------------------------
    // Phase 2
    // ------------------------------------------------------------------------

    fn resolve_pending(&mut self) -> Result<(), SchemaError> {
        // On-demand compilation can queue more references while we walk.
        let mut next = 0;
        while next < self.pending.len() {
            let PendingRef { node, document } = self.pending[next];
            next += 1;
            let SchemaKind::Ref { reference, .. } = &self.nodes[node.0].kind else {
                continue;
            };
            let reference = reference.clone();
            let target = self.resolve_reference(document, &reference).ok_or_else(|| {
                SchemaError::UnresolvedReference {
                    reference: reference.clone(),
                    location: self.nodes[node.0].location.clone(),
                }
            })??;
            tracing::trace!(
                reference = %reference,
                target = %self.nodes[target.0].location,
                "resolved schema reference"
            );
            if let SchemaKind::Ref { target: slot, .. } = &mut self.nodes[node.0].kind {
                *slot = Some(target);
            }
        }
        Ok(())
    }

    /// `None` means the reference names nothing in the set; `Some(Err)` means
    /// the referenced location exists but does not compile. The fragment is
    /// percent-decoded before anchor or pointer lookup.
    fn resolve_reference(
        &mut self,
        from: usize,
        reference: &str,
    ) -> Option<Result<SchemaId, SchemaError>> {
        let (base, encoded) = reference.split_once('#').unwrap_or((reference, ""));
        let fragment = percent_decode_str(encoded).decode_utf8().ok()?;
        let fragment: &str = &fragment;
        let doc = if base.is_empty() {
            from
        } else {
            self.find_document(from, base)?
        };

        if !fragment.is_empty() && !fragment.starts_with('/') {
            return self.anchors.get(&(doc, fragment.to_string())).copied().map(Ok);
        }
        if let Some(&id) = self.locations.get(&(doc, fragment.to_string())) {
            return Some(Ok(id));
        }
        let documents = self.documents;
        let path = DocumentPath::parse(fragment).ok()?;
        let target = path.resolve(&documents[doc].document).ok()?;
        Some(self.compile(doc, target, fragment.to_string()))
    }

    /// Matches a reference base against the set: by `$id` (absolute or
    /// relative to the referencing document's `$id`), then by the locator
    /// as given, then by file name.
    fn find_document(&self, from: usize, base: &str) -> Option<usize> {
        let by_id = |wanted: &str| self.documents.iter().position(|d| d.id() == Some(wanted));
        if let Some(found) = by_id(base) {
            return Some(found);
        }
        if let Some(joined) = self.documents[from].id().map(|id| join_id(id, base))
            && let Some(found) = by_id(&joined)
        {
            return Some(found);
        }
        let base_path = Path::new(base);
        if let Some(found) = self
            .documents
            .iter()
            .position(|d| d.key == base || d.path == base_path)
        {
            return Some(found);
        }
        let name = base_path.file_name()?;
        self.documents
            .iter()
            .position(|d| d.path.file_name() == Some(name))
    }

    fn check_cycles(&self) -> Result<(), SchemaError> {
        for start in 0..self.nodes.len() {
            let mut seen = HashSet::new();
            let mut current = SchemaId(start);
            while let SchemaKind::Ref {
                target: Some(next), ..
            } = self.nodes[current.0].kind
            {
                if !seen.insert(current) {
                    return Err(SchemaError::CircularReference {
                        location: self.nodes[start].location.clone(),
                    });
                }
                current = next;
            }
        }
        Ok(())
    }
}

/// Resolves `reference` against the `$id` of the referencing document.
fn join_id(base_id: &str, reference: &str) -> String {
    if reference.contains("://") {
        return reference.to_string();
    }
    if reference.starts_with('/') {
        let origin_end = base_id
            .find("://")
            .and_then(|scheme| base_id[scheme + 3..].find('/').map(|p| p + scheme + 3))
            .unwrap_or(base_id.len());
        return format!("{}{reference}", &base_id[..origin_end]);
    }
    match base_id.rfind('/') {
        Some(slash) => format!("{}{reference}", &base_id[..=slash]),
        None => reference.to_string(),
    }
}

fn closest_type_name(name: &str) -> Option<&'static str> {
    JsonType::NAMES
        .iter()
        .map(|candidate| (strsim::jaro_winkler(name, candidate), *candidate))
        .filter(|(score, _)| *score > 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate)
}
