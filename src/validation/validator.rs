use crate::document::{DocumentNode, escape_token};
use crate::error::ValidationError;
use crate::schema::{Items, Keywords, SchemaGraph, SchemaId, SchemaKind};

use super::exception::ValidationException;

/// Default maximum schema recursion depth at one instance location.
pub const DEFAULT_MAX_VALIDATION_DEPTH: usize = 256;

const MULTIPLE_OF_EPSILON: f64 = 1e-9;

// ============================================================================
// Report
// ============================================================================

/// Outcome of a validation walk that ran to completion.
///
/// The walk itself succeeded; [`exception_tree`](Self::exception_tree) says
/// whether the document conforms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    exception_tree: Option<ValidationException>,
}

impl ValidationReport {
    /// A report for a conforming document.
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            exception_tree: None,
        }
    }

    /// Builds a report from the top-level exceptions of a walk.
    ///
    /// A single exception becomes the root; several are grouped under a
    /// synthetic root.
    #[must_use]
    pub fn from_exceptions(mut exceptions: Vec<ValidationException>) -> Self {
        let exception_tree = match exceptions.len() {
            0 => None,
            1 => exceptions.pop(),
            n => Some(
                ValidationException::new("schema", "", format!("{n} validity exceptions"))
                    .with_children(exceptions),
            ),
        };
        Self { exception_tree }
    }

    /// The validation process completed. Always `true` for a report; a
    /// process failure is an `Err` instead of a report.
    #[must_use]
    pub const fn ok(&self) -> bool {
        true
    }

    /// Returns `true` if the document conforms.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.exception_tree.is_none()
    }

    /// Root of the exception tree, `None` for a conforming document.
    #[must_use]
    pub const fn exception_tree(&self) -> Option<&ValidationException> {
        self.exception_tree.as_ref()
    }

    /// Consumes the report, returning the tree.
    #[must_use]
    pub fn into_exception_tree(self) -> Option<ValidationException> {
        self.exception_tree
    }

    /// Number of leaf exceptions (0 when valid).
    #[must_use]
    pub fn exception_count(&self) -> usize {
        self.exception_tree
            .as_ref()
            .map_or(0, ValidationException::leaf_count)
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Validates documents against a composed [`SchemaGraph`].
#[derive(Debug, Clone, Copy)]
pub struct Validator<'g> {
    graph: &'g SchemaGraph,
    max_depth: usize,
}

impl<'g> Validator<'g> {
    /// Creates a validator with the default depth limit.
    #[must_use]
    pub const fn new(graph: &'g SchemaGraph) -> Self {
        Self {
            graph,
            max_depth: DEFAULT_MAX_VALIDATION_DEPTH,
        }
    }

    /// Overrides the recursion depth limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validates `document` against the graph's root schema.
    ///
    /// # Errors
    ///
    /// [`ValidationError::DepthExceeded`] when schema recursion passes the
    /// depth limit. Non-conformance is not an error; it is reported in the
    /// returned report.
    pub fn validate(&self, document: &DocumentNode) -> Result<ValidationReport, ValidationError> {
        let mut walk = Walk {
            graph: self.graph,
            max_depth: self.max_depth,
            path: Vec::new(),
        };
        let mut exceptions = Vec::new();
        walk.check(self.graph.root(), document, 0, &mut exceptions)?;
        Ok(ValidationReport::from_exceptions(exceptions))
    }
}

// ============================================================================
// Walk
// ============================================================================

struct Walk<'g> {
    graph: &'g SchemaGraph,
    max_depth: usize,
    path: Vec<String>,
}

type Found = Vec<ValidationException>;

impl Walk<'_> {
    fn pointer(&self) -> String {
        self.path
            .iter()
            .map(|token| format!("/{}", escape_token(token)))
            .collect()
    }

    /// Pointer as shown in messages; the root shows as `/`.
    fn at(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            self.pointer()
        }
    }

    fn exception(&self, keyword: &'static str, message: impl std::fmt::Display) -> ValidationException {
        let path = self.at();
        tracing::trace!(keyword, path = %path, "validity exception");
        ValidationException::new(keyword, self.pointer(), format!("{message} at {path}"))
    }

    fn check(
        &mut self,
        id: SchemaId,
        value: &DocumentNode,
        depth: usize,
        out: &mut Found,
    ) -> Result<(), ValidationError> {
        if depth > self.max_depth {
            tracing::debug!(
                limit = self.max_depth,
                path = %self.at(),
                "schema recursion limit reached"
            );
            return Err(ValidationError::DepthExceeded {
                limit: self.max_depth,
                path: self.at(),
            });
        }
        let graph = self.graph;
        match &graph.get(id).kind {
            SchemaKind::Always(true) => Ok(()),
            SchemaKind::Always(false) => {
                out.push(self.exception("false", "no value is allowed"));
                Ok(())
            }
            SchemaKind::Ref {
                target: Some(target),
                ..
            } => self.check(*target, value, depth + 1, out),
            SchemaKind::Ref {
                target: None,
                reference,
            } => {
                out.push(self.exception("$ref", format_args!("unresolved reference '{reference}'")));
                Ok(())
            }
            SchemaKind::Keywords(kw) => self.check_keywords(kw, value, depth, out),
        }
    }

    /// Descending into the instance restarts the depth count: only schema
    /// recursion that consumes nothing can run away.
    fn check_child(
        &mut self,
        token: impl Into<String>,
        id: SchemaId,
        value: &DocumentNode,
        out: &mut Found,
    ) -> Result<(), ValidationError> {
        self.path.push(token.into());
        let result = self.check(id, value, 0, out);
        self.path.pop();
        result
    }

    fn branch(&mut self, id: SchemaId, value: &DocumentNode, depth: usize) -> Result<Found, ValidationError> {
        let mut found = Vec::new();
        self.check(id, value, depth + 1, &mut found)?;
        Ok(found)
    }

    fn check_keywords(
        &mut self,
        kw: &Keywords,
        value: &DocumentNode,
        depth: usize,
        out: &mut Found,
    ) -> Result<(), ValidationError> {
        if let Some(types) = kw.types
            && !types.matches(value)
        {
            out.push(self.exception(
                "type",
                format_args!("expected {types}, found {}", value.type_name()),
            ));
            return Ok(());
        }

        if let Some(allowed) = &kw.enumeration
            && !allowed.contains(value)
        {
            let list: Vec<String> = allowed.iter().map(ToString::to_string).collect();
            out.push(self.exception(
                "enum",
                format_args!("value {value} is not one of [{}]", list.join(", ")),
            ));
        }
        if let Some(expected) = &kw.constant
            && expected != value
        {
            out.push(self.exception("const", format_args!("value {value} is not {expected}")));
        }

        match value {
            DocumentNode::Integer(_) | DocumentNode::Float(_) => self.check_number(kw, value, out),
            DocumentNode::String(s) => self.check_string(kw, s, out),
            DocumentNode::Sequence(items) => self.check_array(kw, items, out)?,
            DocumentNode::Mapping(_) => self.check_object(kw, value, depth, out)?,
            DocumentNode::Null | DocumentNode::Bool(_) => {}
        }

        self.check_composition(kw, value, depth, out)
    }

    // ------------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------------

    fn check_number(&self, kw: &Keywords, value: &DocumentNode, out: &mut Found) {
        let Some(n) = value.as_f64() else {
            return;
        };
        if let Some(min) = kw.minimum
            && n < min
        {
            out.push(self.exception("minimum", format_args!("value {value} is less than minimum {min}")));
        }
        if let Some(max) = kw.maximum
            && n > max
        {
            out.push(self.exception("maximum", format_args!("value {value} is greater than maximum {max}")));
        }
        if let Some(min) = kw.exclusive_minimum
            && n <= min
        {
            out.push(self.exception(
                "exclusiveMinimum",
                format_args!("value {value} is not greater than {min}"),
            ));
        }
        if let Some(max) = kw.exclusive_maximum
            && n >= max
        {
            out.push(self.exception(
                "exclusiveMaximum",
                format_args!("value {value} is not less than {max}"),
            ));
        }
        if let Some(divisor) = kw.multiple_of
            && !is_multiple_of(value, divisor)
        {
            out.push(self.exception(
                "multipleOf",
                format_args!("value {value} is not a multiple of {divisor}"),
            ));
        }
    }

    fn check_string(&self, kw: &Keywords, s: &str, out: &mut Found) {
        let len = s.chars().count() as u64;
        if let Some(min) = kw.min_length
            && len < min
        {
            out.push(self.exception(
                "minLength",
                format_args!("string of length {len} is shorter than {min}"),
            ));
        }
        if let Some(max) = kw.max_length
            && len > max
        {
            out.push(self.exception(
                "maxLength",
                format_args!("string of length {len} is longer than {max}"),
            ));
        }
        if let Some(pattern) = &kw.pattern
            && !pattern.regex.is_match(s)
        {
            out.push(self.exception(
                "pattern",
                format_args!("string '{s}' does not match pattern '{}'", pattern.source),
            ));
        }
    }

    // ------------------------------------------------------------------------
    // Arrays
    // ------------------------------------------------------------------------

    fn check_array(
        &mut self,
        kw: &Keywords,
        items: &[DocumentNode],
        out: &mut Found,
    ) -> Result<(), ValidationError> {
        let len = items.len() as u64;
        if let Some(min) = kw.min_items
            && len < min
        {
            out.push(self.exception("minItems", format_args!("array of {len} items has fewer than {min}")));
        }
        if let Some(max) = kw.max_items
            && len > max
        {
            out.push(self.exception("maxItems", format_args!("array of {len} items has more than {max}")));
        }
        if kw.unique_items
            && let Some((first, second)) = first_duplicate(items)
        {
            out.push(self.exception(
                "uniqueItems",
                format_args!("items {first} and {second} are equal"),
            ));
        }

        match &kw.items {
            Some(Items::Single(schema)) => {
                for (i, item) in items.iter().enumerate() {
                    self.check_child(i.to_string(), *schema, item, out)?;
                }
            }
            Some(Items::Positional(schemas)) => {
                for (i, item) in items.iter().enumerate() {
                    let schema = schemas.get(i).copied().or(kw.additional_items);
                    if let Some(schema) = schema {
                        self.check_child(i.to_string(), schema, item, out)?;
                    }
                }
            }
            None => {}
        }

        if let Some(contains) = kw.contains {
            let mut matching = 0_u64;
            for item in items {
                if self.branch(contains, item, 0)?.is_empty() {
                    matching += 1;
                }
            }
            let min = kw.min_contains.unwrap_or(1);
            if matching < min {
                out.push(self.exception(
                    "contains",
                    format_args!("array has {matching} items matching 'contains', at least {min} required"),
                ));
            }
            if let Some(max) = kw.max_contains
                && matching > max
            {
                out.push(self.exception(
                    "maxContains",
                    format_args!("array has {matching} items matching 'contains', at most {max} allowed"),
                ));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    fn check_object(
        &mut self,
        kw: &Keywords,
        value: &DocumentNode,
        depth: usize,
        out: &mut Found,
    ) -> Result<(), ValidationError> {
        let Some(map) = value.as_mapping() else {
            return Ok(());
        };

        for (key, member) in map {
            let mut declared = false;
            if let Some(&schema) = kw.properties.get(key) {
                declared = true;
                self.check_child(key.as_str(), schema, member, out)?;
            }
            for (pattern, schema) in &kw.pattern_properties {
                if pattern.regex.is_match(key) {
                    declared = true;
                    self.check_child(key.as_str(), *schema, member, out)?;
                }
            }
            if declared {
                continue;
            }
            if let Some(extra) = kw.additional_properties {
                if matches!(self.graph.resolve(extra).kind, SchemaKind::Always(false)) {
                    out.push(self.exception(
                        "additionalProperties",
                        format_args!("additional property '{key}' is not allowed"),
                    ));
                } else {
                    self.check_child(key.as_str(), extra, member, out)?;
                }
            }
        }

        for name in &kw.required {
            if !map.contains_key(name) {
                out.push(self.exception(
                    "required",
                    format_args!("missing required property '{name}'"),
                ));
            }
        }

        let count = map.len() as u64;
        if let Some(min) = kw.min_properties
            && count < min
        {
            out.push(self.exception(
                "minProperties",
                format_args!("object with {count} properties has fewer than {min}"),
            ));
        }
        if let Some(max) = kw.max_properties
            && count > max
        {
            out.push(self.exception(
                "maxProperties",
                format_args!("object with {count} properties has more than {max}"),
            ));
        }

        for (trigger, needed) in &kw.dependent_required {
            if !map.contains_key(trigger) {
                continue;
            }
            for name in needed.iter().filter(|n| !map.contains_key(n.as_str())) {
                out.push(self.exception(
                    "dependentRequired",
                    format_args!("property '{trigger}' requires property '{name}'"),
                ));
            }
        }
        for (trigger, schema) in &kw.dependent_schemas {
            if map.contains_key(trigger) {
                self.check(*schema, value, depth + 1, out)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------------

    fn check_composition(
        &mut self,
        kw: &Keywords,
        value: &DocumentNode,
        depth: usize,
        out: &mut Found,
    ) -> Result<(), ValidationError> {
        if !kw.all_of.is_empty() {
            let mut failed = Vec::new();
            for (i, schema) in kw.all_of.iter().enumerate() {
                let found = self.branch(*schema, value, depth)?;
                if !found.is_empty() {
                    failed.push(self.branch_exception("allOf", i, found));
                }
            }
            if !failed.is_empty() {
                let message = format!("{} of {} allOf branches failed", failed.len(), kw.all_of.len());
                out.push(self.exception("allOf", message).with_children(failed));
            }
        }

        if !kw.any_of.is_empty() {
            let mut failed = Vec::new();
            for (i, schema) in kw.any_of.iter().enumerate() {
                let found = self.branch(*schema, value, depth)?;
                if found.is_empty() {
                    failed.clear();
                    break;
                }
                failed.push(self.branch_exception("anyOf", i, found));
            }
            if !failed.is_empty() {
                let message = format!("value matches none of the {} anyOf branches", kw.any_of.len());
                out.push(self.exception("anyOf", message).with_children(failed));
            }
        }

        if !kw.one_of.is_empty() {
            let mut failed = Vec::new();
            let mut matched = Vec::new();
            for (i, schema) in kw.one_of.iter().enumerate() {
                let found = self.branch(*schema, value, depth)?;
                if found.is_empty() {
                    matched.push(i);
                } else {
                    failed.push(self.branch_exception("oneOf", i, found));
                }
            }
            match matched.len() {
                0 => {
                    let message = format!("value matches none of the {} oneOf branches", kw.one_of.len());
                    out.push(self.exception("oneOf", message).with_children(failed));
                }
                1 => {}
                _ => {
                    let list: Vec<String> = matched.iter().map(ToString::to_string).collect();
                    out.push(self.exception(
                        "oneOf",
                        format_args!("value matches oneOf branches {} but must match exactly one", list.join(", ")),
                    ));
                }
            }
        }

        if let Some(schema) = kw.not
            && self.branch(schema, value, depth)?.is_empty()
        {
            out.push(self.exception("not", "value must not match the 'not' schema"));
        }

        if let Some((condition, then_branch, else_branch)) = kw.if_then_else {
            let chosen = if self.branch(condition, value, depth)?.is_empty() {
                then_branch
            } else {
                else_branch
            };
            if let Some(schema) = chosen {
                self.check(schema, value, depth + 1, out)?;
            }
        }
        Ok(())
    }

    fn branch_exception(&self, keyword: &'static str, index: usize, found: Found) -> ValidationException {
        self.exception(keyword, format_args!("{keyword} branch {index} failed"))
            .with_children(found)
    }
}

/// `uniqueItems`: indexes of the first equal pair.
fn first_duplicate(items: &[DocumentNode]) -> Option<(usize, usize)> {
    items.iter().enumerate().find_map(|(i, a)| {
        items[i + 1..]
            .iter()
            .position(|b| a == b)
            .map(|offset| (i, i + 1 + offset))
    })
}

#[allow(clippy::cast_possible_truncation)]
fn is_multiple_of(value: &DocumentNode, divisor: f64) -> bool {
    if let DocumentNode::Integer(i) = value
        && divisor.fract() == 0.0
        && divisor.abs() < 9.0e18
    {
        return i % (divisor as i64) == 0;
    }
    let Some(n) = value.as_f64() else {
        return true;
    };
    let quotient = n / divisor;
    if !quotient.is_finite() {
        return false;
    }
    let fraction = (quotient - quotient.round()).abs();
    fraction <= MULTIPLE_OF_EPSILON * quotient.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Mapping;
    use crate::schema::{SchemaDocument, compose};
    use serde_json::json;

    fn graph(schema: serde_json::Value) -> SchemaGraph {
        compose(&[SchemaDocument::new("test.json", DocumentNode::from(schema))]).unwrap()
    }

    fn report(schema: serde_json::Value, instance: serde_json::Value) -> ValidationReport {
        Validator::new(&graph(schema))
            .validate(&DocumentNode::from(instance))
            .unwrap()
    }

    fn leaf_keywords(report: &ValidationReport) -> Vec<&'static str> {
        report
            .exception_tree()
            .map(|t| t.leaves().map(ValidationException::keyword).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_conforming_document_has_no_tree() {
        let r = report(
            json!({"type": "object", "required": ["listenerPort"],
                   "properties": {"listenerPort": {"type": "integer"}}}),
            json!({"listenerPort": 8080}),
        );
        assert!(r.ok());
        assert!(r.is_valid());
        assert_eq!(r.exception_count(), 0);
    }

    #[test]
    fn test_single_missing_required_is_root() {
        let r = report(
            json!({"type": "object", "required": ["listenerPort", "host"]}),
            json!({"host": "localhost"}),
        );
        let tree = r.exception_tree().unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.keyword(), "required");
        assert!(tree.message().contains("'listenerPort'"));
        assert_eq!(tree.instance_path(), "");
    }

    #[test]
    fn test_multiple_exceptions_grouped_under_synthetic_root() {
        let r = report(
            json!({"properties": {"a": {"type": "string"}, "b": {"minimum": 10}}}),
            json!({"a": 1, "b": 3}),
        );
        let tree = r.exception_tree().unwrap();
        assert_eq!(tree.message(), "2 validity exceptions");
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[0].instance_path(), "/a");
        assert_eq!(tree.children()[1].instance_path(), "/b");
    }

    #[test]
    fn test_type_mismatch_suppresses_other_keywords() {
        let r = report(
            json!({"type": "string", "minLength": 5, "enum": ["x"]}),
            json!(12),
        );
        assert_eq!(leaf_keywords(&r), vec!["type"]);
        assert_eq!(r.exception_tree().unwrap().message(), "expected string, found integer at /");
    }

    #[test]
    fn test_integer_accepts_whole_floats() {
        assert!(report(json!({"type": "integer"}), json!(4.0)).is_valid());
        assert!(!report(json!({"type": "integer"}), json!(4.5)).is_valid());
        assert!(report(json!({"type": "number"}), json!(4)).is_valid());
    }

    #[test]
    fn test_numeric_keywords() {
        let schema = json!({"minimum": 1, "maximum": 10, "multipleOf": 2});
        assert!(report(schema.clone(), json!(4)).is_valid());
        assert_eq!(leaf_keywords(&report(schema.clone(), json!(0))), vec!["minimum"]);
        assert_eq!(
            leaf_keywords(&report(schema, json!(11))),
            vec!["maximum", "multipleOf"]
        );
        let exclusive = json!({"exclusiveMinimum": 0, "exclusiveMaximum": 1});
        assert_eq!(leaf_keywords(&report(exclusive.clone(), json!(0))), vec!["exclusiveMinimum"]);
        assert!(report(exclusive, json!(0.5)).is_valid());
        assert!(report(json!({"multipleOf": 0.1}), json!(0.3)).is_valid());
        let draft4 = json!({"maximum": 5, "exclusiveMaximum": true});
        assert_eq!(leaf_keywords(&report(draft4, json!(5))), vec!["exclusiveMaximum"]);
    }

    #[test]
    fn test_string_keywords() {
        let schema = json!({"minLength": 2, "maxLength": 3, "pattern": "^[a-z]+$"});
        assert!(report(schema.clone(), json!("ab")).is_valid());
        assert!(report(json!({"maxLength": 3}), json!("äöü")).is_valid());
        assert_eq!(leaf_keywords(&report(schema.clone(), json!("a"))), vec!["minLength"]);
        assert_eq!(
            leaf_keywords(&report(schema, json!("ABCD"))),
            vec!["maxLength", "pattern"]
        );
        assert!(report(json!({"pattern": "b"}), json!("abc")).is_valid());
    }

    #[test]
    fn test_enum_and_const() {
        assert!(report(json!({"enum": [1, "a", null]}), json!(1.0)).is_valid());
        assert_eq!(leaf_keywords(&report(json!({"enum": [1, 2]}), json!(3))), vec!["enum"]);
        assert_eq!(
            leaf_keywords(&report(json!({"const": {"a": 1}}), json!({"a": 2}))),
            vec!["const"]
        );
    }

    #[test]
    fn test_array_keywords() {
        let schema = json!({
            "items": {"type": "integer"}, "minItems": 1, "maxItems": 3, "uniqueItems": true
        });
        assert!(report(schema.clone(), json!([1, 2])).is_valid());
        let r = report(schema.clone(), json!([1, "x", 1, 4]));
        assert_eq!(leaf_keywords(&r), vec!["maxItems", "uniqueItems", "type"]);
        let type_error = r.exception_tree().unwrap().children()[2].clone();
        assert_eq!(type_error.instance_path(), "/1");
        assert_eq!(leaf_keywords(&report(schema, json!([]))), vec!["minItems"]);
    }

    #[test]
    fn test_positional_items() {
        let schema = json!({
            "items": [{"type": "string"}, {"type": "integer"}],
            "additionalItems": false
        });
        assert!(report(schema.clone(), json!(["a", 1])).is_valid());
        let r = report(schema, json!(["a", 1, true]));
        let tree = r.exception_tree().unwrap();
        assert_eq!(tree.keyword(), "false");
        assert_eq!(tree.instance_path(), "/2");
    }

    #[test]
    fn test_contains() {
        let schema = json!({"contains": {"const": "x"}, "maxContains": 1});
        assert!(report(schema.clone(), json!(["a", "x"])).is_valid());
        assert_eq!(leaf_keywords(&report(schema.clone(), json!(["a"]))), vec!["contains"]);
        assert_eq!(leaf_keywords(&report(schema, json!(["x", "x"]))), vec!["maxContains"]);
        assert!(report(json!({"contains": {"const": 1}, "minContains": 0}), json!([])).is_valid());
    }

    #[test]
    fn test_object_keywords() {
        let schema = json!({
            "properties": {"name": {"type": "string"}},
            "patternProperties": {"^x-": {"type": "integer"}},
            "additionalProperties": false,
            "minProperties": 1,
            "dependentRequired": {"tls": ["cert"]}
        });
        assert!(report(schema.clone(), json!({"name": "a", "x-n": 1})).is_valid());
        let r = report(schema.clone(), json!({"name": "a", "x-n": "s", "other": 1, "tls": true}));
        assert_eq!(
            leaf_keywords(&r),
            vec!["type", "additionalProperties", "additionalProperties", "dependentRequired"]
        );
        assert_eq!(leaf_keywords(&report(schema, json!({}))), vec!["minProperties"]);
    }

    #[test]
    fn test_additional_properties_schema() {
        let schema = json!({"additionalProperties": {"type": "boolean"}, "maxProperties": 2});
        assert!(report(schema.clone(), json!({"a": true})).is_valid());
        let r = report(schema, json!({"a": 1, "b": true, "c": false}));
        assert_eq!(leaf_keywords(&r), vec!["type", "maxProperties"]);
    }

    #[test]
    fn test_any_of_nests_branch_failures() {
        let schema = json!({"anyOf": [{"type": "string"}, {"type": "integer", "minimum": 10}]});
        assert!(report(schema.clone(), json!("s")).is_valid());
        assert!(report(schema.clone(), json!(12)).is_valid());
        let r = report(schema, json!(3));
        let tree = r.exception_tree().unwrap();
        assert_eq!(tree.keyword(), "anyOf");
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[0].children()[0].keyword(), "type");
        assert_eq!(tree.children()[1].children()[0].keyword(), "minimum");
    }

    #[test]
    fn test_one_of() {
        let schema = json!({"oneOf": [{"type": "integer"}, {"minimum": 0}]});
        assert!(report(schema.clone(), json!(-1)).is_valid());
        let many = report(schema.clone(), json!(5));
        let tree = many.exception_tree().unwrap();
        assert!(tree.is_leaf());
        assert!(tree.message().contains("branches 0, 1"));
        let none = report(schema, json!(-0.5));
        assert_eq!(none.exception_tree().unwrap().children().len(), 2);
    }

    #[test]
    fn test_all_of_and_not() {
        let schema = json!({"allOf": [{"minimum": 0}, {"maximum": 5}], "not": {"const": 3}});
        assert!(report(schema.clone(), json!(4)).is_valid());
        let r = report(schema.clone(), json!(9));
        let tree = r.exception_tree().unwrap();
        assert_eq!(tree.keyword(), "allOf");
        assert_eq!(tree.children().len(), 1);
        assert_eq!(leaf_keywords(&report(schema, json!(3))), vec!["not"]);
    }

    #[test]
    fn test_if_then_else() {
        let schema = json!({
            "if": {"properties": {"tls": {"const": true}}, "required": ["tls"]},
            "then": {"required": ["cert"]},
            "else": {"required": ["port"]}
        });
        assert!(report(schema.clone(), json!({"tls": true, "cert": "c"})).is_valid());
        assert!(report(schema.clone(), json!({"port": 1})).is_valid());
        let r = report(schema, json!({"tls": true}));
        assert!(r.exception_tree().unwrap().message().contains("'cert'"));
    }

    #[test]
    fn test_refs_followed_transparently() {
        let schema = json!({
            "properties": {"port": {"$ref": "#/$defs/port"}},
            "$defs": {"port": {"type": "integer", "maximum": 65535}}
        });
        let r = report(schema, json!({"port": 70000}));
        let tree = r.exception_tree().unwrap();
        assert_eq!(tree.keyword(), "maximum");
        assert_eq!(tree.instance_path(), "/port");
    }

    #[test]
    fn test_boolean_schemas() {
        assert!(report(json!(true), json!({"anything": [1]})).is_valid());
        assert_eq!(leaf_keywords(&report(json!(false), json!(null))), vec!["false"]);
    }

    #[test]
    fn test_recursive_schema_over_nested_data() {
        let schema = json!({
            "type": "object",
            "properties": {"children": {"type": "array", "items": {"$ref": "#"}}}
        });
        let r = report(schema, json!({"children": [{"children": []}, {"children": 1}]}));
        assert_eq!(r.exception_tree().unwrap().instance_path(), "/children/1/children");
    }

    #[test]
    fn test_depth_limit() {
        let g = graph(json!({
            "$ref": "#/$defs/loop",
            "$defs": {"loop": {"allOf": [{"$ref": "#/$defs/loop"}]}}
        }));
        let err = Validator::new(&g)
            .with_max_depth(32)
            .validate(&DocumentNode::Null)
            .unwrap_err();
        assert!(matches!(err, ValidationError::DepthExceeded { limit: 32, .. }));
    }

    #[test]
    fn test_deep_document_under_shallow_schema() {
        let g = graph(json!({
            "$ref": "#/$defs/node",
            "$defs": {"node": {
                "type": "object",
                "properties": {"tags": {"contains": {"$ref": "#/$defs/node"}}},
                "additionalProperties": {"$ref": "#/$defs/node"}
            }}
        }));
        let mut nested = DocumentNode::Mapping(Mapping::new());
        for level in 0..64 {
            let mut map = Mapping::new();
            let key = if level % 2 == 0 { "child" } else { "tags" };
            let child = if key == "tags" {
                DocumentNode::Sequence(vec![nested])
            } else {
                nested
            };
            map.insert(key.to_string(), child);
            nested = DocumentNode::Mapping(map);
        }
        let r = Validator::new(&g).with_max_depth(8).validate(&nested).unwrap();
        assert!(r.is_valid());
    }

    #[test]
    fn test_escaped_instance_paths() {
        let r = report(
            json!({"properties": {"a/b": {"properties": {"m~n": {"type": "string"}}}}}),
            json!({"a/b": {"m~n": 1}}),
        );
        assert_eq!(r.exception_tree().unwrap().instance_path(), "/a~1b/m~0n");
    }

    #[test]
    fn test_multiple_of_helper() {
        assert!(is_multiple_of(&DocumentNode::Integer(10), 5.0));
        assert!(!is_multiple_of(&DocumentNode::Integer(10), 3.0));
        assert!(is_multiple_of(&DocumentNode::Float(1.2), 0.4));
        assert!(!is_multiple_of(&DocumentNode::Float(1.25), 0.5));
    }

    #[test]
    fn test_first_duplicate_uses_numeric_equality() {
        let items = vec![DocumentNode::Integer(1), DocumentNode::Float(2.0), DocumentNode::Float(1.0)];
        assert_eq!(first_duplicate(&items), Some((0, 2)));
    }
}
