//! Document overlay
//!
//! Sources are merged left to right: each later document overlays the
//! accumulated result. Mappings merge key by key; everything else is
//! replaced by the later value, except sequences under
//! [`ArrayMerge::Concatenate`].

use crate::document::DocumentNode;

/// How two sequences at the same path combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayMerge {
    /// The later sequence replaces the earlier one.
    #[default]
    Replace,
    /// The later sequence is appended to the earlier one.
    Concatenate,
}

/// Merge behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOptions {
    /// Sequence handling.
    pub arrays: ArrayMerge,
}

impl MergeOptions {
    /// Options with sequence concatenation.
    #[must_use]
    pub const fn concatenate() -> Self {
        Self {
            arrays: ArrayMerge::Concatenate,
        }
    }
}

/// Overlays `overlay` onto `base` in place.
///
/// Keys present only in `overlay` are appended in overlay order; keys in
/// both are merged recursively when both sides are mappings.
pub fn deep_merge(base: &mut DocumentNode, overlay: DocumentNode, options: MergeOptions) {
    match (base, overlay) {
        (DocumentNode::Mapping(base_map), DocumentNode::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    deep_merge(base_value, overlay_value, options);
                } else {
                    base_map.insert(key, overlay_value);
                }
            }
        }
        (DocumentNode::Sequence(base_items), DocumentNode::Sequence(overlay_items))
            if options.arrays == ArrayMerge::Concatenate =>
        {
            base_items.extend(overlay_items);
        }
        (base, overlay) => *base = overlay,
    }
}

/// Merges `documents` left to right. An empty input yields `None`.
#[must_use]
pub fn merge_all<I>(documents: I, options: MergeOptions) -> Option<DocumentNode>
where
    I: IntoIterator<Item = DocumentNode>,
{
    let mut iter = documents.into_iter();
    let mut merged = iter.next()?;
    for overlay in iter {
        deep_merge(&mut merged, overlay, options);
    }
    Some(merged)
}

/// Merges two documents into a new one.
#[must_use]
pub fn merge(base: &DocumentNode, overlay: &DocumentNode, options: MergeOptions) -> DocumentNode {
    let mut merged = base.clone();
    deep_merge(&mut merged, overlay.clone(), options);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> DocumentNode {
        DocumentNode::from(value)
    }

    #[test]
    fn test_later_scalar_wins() {
        let merged = merge(&doc(json!({"x": 1})), &doc(json!({"x": 2})), MergeOptions::default());
        assert_eq!(merged["x"], DocumentNode::Integer(2));
    }

    #[test]
    fn test_nested_mappings_merge() {
        let base = doc(json!({"zowe": {"setup": {"prefix": "A"}, "port": 1}}));
        let overlay = doc(json!({"zowe": {"setup": {"suffix": "B"}}}));
        let merged = merge(&base, &overlay, MergeOptions::default());
        assert_eq!(
            merged,
            doc(json!({"zowe": {"setup": {"prefix": "A", "suffix": "B"}, "port": 1}}))
        );
    }

    #[test]
    fn test_new_keys_appended_in_overlay_order() {
        let base = doc(json!({"b": 1, "a": 2}));
        let overlay = doc(json!({"d": 3, "a": 4, "c": 5}));
        let merged = merge(&base, &overlay, MergeOptions::default());
        let keys: Vec<&String> = merged.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a", "d", "c"]);
        assert_eq!(merged["a"], DocumentNode::Integer(4));
    }

    #[test]
    fn test_sequences_replaced_by_default() {
        let merged = merge(
            &doc(json!({"a": [1, 2]})),
            &doc(json!({"a": [3]})),
            MergeOptions::default(),
        );
        assert_eq!(merged["a"], doc(json!([3])));
    }

    #[test]
    fn test_sequences_concatenated_when_requested() {
        let merged = merge(
            &doc(json!({"a": [1, 2]})),
            &doc(json!({"a": [3]})),
            MergeOptions::concatenate(),
        );
        assert_eq!(merged["a"], doc(json!([1, 2, 3])));
    }

    #[test]
    fn test_type_mismatch_later_wins() {
        let merged = merge(
            &doc(json!({"a": {"nested": true}, "b": [1]})),
            &doc(json!({"a": "flat", "b": {"k": 1}})),
            MergeOptions::concatenate(),
        );
        assert_eq!(merged, doc(json!({"a": "flat", "b": {"k": 1}})));
    }

    #[test]
    fn test_null_overlay_replaces() {
        let merged = merge(&doc(json!({"a": 1})), &doc(json!({"a": null})), MergeOptions::default());
        assert!(merged["a"].is_null());
    }

    #[test]
    fn test_merge_all_empty_and_single() {
        assert!(merge_all(Vec::new(), MergeOptions::default()).is_none());
        let only = doc(json!({"a": [1, {"b": 2}]}));
        assert_eq!(
            merge_all(vec![only.clone()], MergeOptions::default()),
            Some(only)
        );
    }
}
