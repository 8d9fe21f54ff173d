//! Slot indexing and count policy.
//!
//! Stored values are normalized to a dense sequence before anything is
//! rendered. Slot indices are always `0..count`, whatever keys the stored
//! value used.

use serde_json::Value;

use crate::markup::Node;
use crate::naming::indexed_attribute;

/// How many slots a delegation variant renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPadding {
    /// Values plus the configured blank slots, never fewer than one.
    WithBlank,
    /// Exactly the current values (hidden and static variants).
    ValuesOnly,
}

/// Dense, reindexed view of a stored attribute value.
///
/// Arrays keep their order; objects contribute their values in enumeration
/// order with keys dropped; anything else (absent, scalar) is empty.
pub fn normalize_value(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

/// `max(1, len(values) + blank_count)`.
///
/// The blank count is unsigned, so the only zero total is the empty value
/// with no blank slots, which still yields one editable slot.
pub fn compute_slot_count<T>(values: &[T], blank_count: usize) -> usize {
    match values.len().saturating_add(blank_count) {
        0 => 1,
        total => total,
    }
}

pub fn padded_slot_count<T>(values: &[T], blank_count: usize, padding: SlotPadding) -> usize {
    match padding {
        SlotPadding::WithBlank => compute_slot_count(values, blank_count),
        SlotPadding::ValuesOnly => values.len(),
    }
}

/// Invoke `builder` with `attribute[i]` for every `i` in `0..count`, in
/// index order. The first error aborts the whole group and is returned
/// unchanged.
pub fn build_slots<E>(
    attribute: &str,
    count: usize,
    mut builder: impl FnMut(&str) -> Result<Node, E>,
) -> Result<Vec<Node>, E> {
    let mut slots = Vec::with_capacity(count);
    for index in 0..count {
        slots.push(builder(&indexed_attribute(attribute, index))?);
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_empty_value_gets_one_slot() {
        let values: Vec<Value> = Vec::new();
        assert_eq!(compute_slot_count(&values, 0), 1);
    }

    #[test]
    fn test_blank_slots_are_added() {
        let values = normalize_value(Some(&json!(["x", "y", "z"])));
        assert_eq!(compute_slot_count(&values, 1), 4);
    }

    #[test]
    fn test_values_only_padding_can_be_zero() {
        let values: Vec<Value> = Vec::new();
        assert_eq!(padded_slot_count(&values, 3, SlotPadding::ValuesOnly), 0);
        assert_eq!(padded_slot_count(&values, 3, SlotPadding::WithBlank), 3);
    }

    #[test]
    fn test_normalize_non_array_is_empty() {
        assert!(normalize_value(None).is_empty());
        assert!(normalize_value(Some(&json!("tag"))).is_empty());
        assert!(normalize_value(Some(&json!(null))).is_empty());
        assert!(normalize_value(Some(&json!(42))).is_empty());
    }

    #[test]
    fn test_normalize_sparse_keys_are_reindexed() {
        let value = json!({ "3": "c", "10": "a", "7": "b" });
        assert_eq!(
            normalize_value(Some(&value)),
            vec![json!("c"), json!("a"), json!("b")]
        );
    }

    #[test]
    fn test_build_slots_passes_indexed_names_in_order() {
        let mut seen = Vec::new();
        let slots = build_slots::<()>("tags", 3, |attr| {
            seen.push(attr.to_string());
            Ok(Node::Text(attr.to_string()))
        })
        .unwrap();
        assert_eq!(seen, vec!["tags[0]", "tags[1]", "tags[2]"]);
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_build_slots_stops_at_first_error() {
        let mut calls = 0;
        let result = build_slots("tags", 5, |attr| {
            calls += 1;
            if attr == "tags[2]" {
                Err(format!("boom at {attr}"))
            } else {
                Ok(Node::Text(attr.to_string()))
            }
        });
        assert_eq!(result, Err("boom at tags[2]".to_string()));
        assert_eq!(calls, 3);
    }

    proptest! {
        #[test]
        fn slot_count_is_max_of_one_and_total(len in 0usize..64, blank in 0usize..64) {
            let values = vec![(); len];
            prop_assert_eq!(compute_slot_count(&values, blank), std::cmp::max(1, len + blank));
        }
    }
}
