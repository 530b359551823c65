//! Pairwise structural diff
//!
//! Fields are classified by the kinds of their two values. Equality is the
//! recursive structural equality of [`Value`], so map key order never
//! produces a difference.

use crate::config::ComparatorConfig;
use docket_domain::{Fields, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Significance of missing-value transitions and unclassified changes
const DEFAULT_SIGNIFICANCE: f64 = 0.5;

/// How a field changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Absent before, present after
    Added,
    /// Present before, absent after
    Removed,
    /// Both numbers
    NumericChange,
    /// Both text
    TextChange,
    /// Both lists
    ArrayChange,
    /// Both maps
    ObjectChange,
    /// Any other differing pair, including mixed kinds
    Modified,
}

impl ChangeKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::NumericChange => "numeric_change",
            ChangeKind::TextChange => "text_change",
            ChangeKind::ArrayChange => "array_change",
            ChangeKind::ObjectChange => "object_change",
            ChangeKind::Modified => "modified",
        }
    }

    /// The kind seen when comparing in the opposite direction
    pub fn reversed(&self) -> Self {
        match self {
            ChangeKind::Added => ChangeKind::Removed,
            ChangeKind::Removed => ChangeKind::Added,
            other => *other,
        }
    }
}

/// Kind-specific detail of a change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeDetail {
    /// Nothing beyond the old and new values
    None,

    /// Numeric delta
    Numeric {
        /// `new - old`
        delta: f64,
        /// `delta / |old| * 100`; `None` when `old` is zero
        percent_change: Option<f64>,
    },

    /// Text length delta, in characters
    Text {
        /// `len(new) - len(old)`
        length_delta: i64,
    },

    /// Element-level list changes
    Array {
        /// Elements only in the new list
        added: Vec<Value>,
        /// Elements only in the old list
        removed: Vec<Value>,
        /// Same elements, different order
        reordered: bool,
    },

    /// Nested field changes; empty when nested detail is not computed
    Object {
        /// Differences inside the map, with dotted paths
        changes: Vec<Difference>,
    },
}

/// One differing field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    /// Field path; dotted for nested fields
    pub field: String,
    /// Classification
    pub kind: ChangeKind,
    /// Value before, if present
    pub old: Option<Value>,
    /// Value after, if present
    pub new: Option<Value>,
    /// How material the change is (0.0-1.0)
    pub significance: f64,
    /// Kind-specific detail
    pub detail: ChangeDetail,
}

/// Tallies over the top-level fields compared
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffStatistics {
    /// Top-level fields compared (union minus ignored)
    pub total_fields: usize,
    /// Added fields
    pub added: usize,
    /// Removed fields
    pub removed: usize,
    /// Fields present on both sides with differing values
    pub modified: usize,
    /// Differing fields over fields compared, as a ratio (0.0-1.0)
    pub change_percentage: f64,
}

/// Result of comparing two field maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// No differences found
    pub identical: bool,
    /// Differing top-level fields, ordered by name
    pub differences: Vec<Difference>,
    /// Tallies
    pub statistics: DiffStatistics,
}

impl Comparison {
    /// The difference reported for a top-level field
    pub fn difference(&self, field: &str) -> Option<&Difference> {
        self.differences.iter().find(|d| d.field == field)
    }
}

/// Compare two field maps under a configuration
pub(crate) fn compare_fields(config: &ComparatorConfig, a: &Fields, b: &Fields) -> Comparison {
    let names: BTreeSet<&String> = a
        .keys()
        .chain(b.keys())
        .filter(|name| !config.is_ignored(name))
        .collect();

    let differences = diff_maps(config, a, b, names.iter().copied(), None, 0);

    let mut statistics = DiffStatistics {
        total_fields: names.len(),
        ..DiffStatistics::default()
    };
    for difference in &differences {
        match difference.kind {
            ChangeKind::Added => statistics.added += 1,
            ChangeKind::Removed => statistics.removed += 1,
            _ => statistics.modified += 1,
        }
    }
    if statistics.total_fields > 0 {
        statistics.change_percentage = differences.len() as f64 / statistics.total_fields as f64;
    }

    Comparison {
        identical: differences.is_empty(),
        differences,
        statistics,
    }
}

fn diff_maps<'a>(
    config: &ComparatorConfig,
    a: &Fields,
    b: &Fields,
    names: impl Iterator<Item = &'a String>,
    prefix: Option<&str>,
    depth: usize,
) -> Vec<Difference> {
    names
        .filter_map(|name| {
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, name),
                None => name.clone(),
            };
            if config.is_ignored(&path) {
                return None;
            }
            diff_values(config, path, a.get(name), b.get(name), depth)
        })
        .collect()
}

fn diff_values(
    config: &ComparatorConfig,
    field: String,
    old: Option<&Value>,
    new: Option<&Value>,
    depth: usize,
) -> Option<Difference> {
    let (kind, significance, detail) = match (old, new) {
        (None, None) => return None,
        (Some(x), Some(y)) if x == y => return None,
        (None, Some(_)) => (ChangeKind::Added, DEFAULT_SIGNIFICANCE, ChangeDetail::None),
        (Some(_), None) => (ChangeKind::Removed, DEFAULT_SIGNIFICANCE, ChangeDetail::None),
        (Some(Value::Number(x)), Some(Value::Number(y))) => numeric_change(*x, *y),
        (Some(Value::Text(x)), Some(Value::Text(y))) => text_change(x, y),
        (Some(Value::List(x)), Some(Value::List(y))) => array_change(x, y),
        (Some(Value::Map(x)), Some(Value::Map(y))) => object_change(config, &field, x, y, depth)?,
        (Some(_), Some(_)) => (ChangeKind::Modified, DEFAULT_SIGNIFICANCE, ChangeDetail::None),
    };

    Some(Difference {
        field,
        kind,
        old: old.cloned(),
        new: new.cloned(),
        significance,
        detail,
    })
}

fn numeric_change(old: f64, new: f64) -> (ChangeKind, f64, ChangeDetail) {
    let delta = new - old;
    let (significance, percent_change) = if old == 0.0 {
        (1.0, None)
    } else {
        ((delta.abs() / old.abs()).min(1.0), Some(delta / old.abs() * 100.0))
    };
    (
        ChangeKind::NumericChange,
        significance,
        ChangeDetail::Numeric {
            delta,
            percent_change,
        },
    )
}

fn text_change(old: &str, new: &str) -> (ChangeKind, f64, ChangeDetail) {
    let old_len = old.chars().count();
    let new_len = new.chars().count();
    let common_prefix = old
        .chars()
        .zip(new.chars())
        .take_while(|(x, y)| x == y)
        .count();
    let max_len = old_len.max(new_len);
    let significance = if max_len == 0 {
        0.0
    } else {
        1.0 - common_prefix as f64 / max_len as f64
    };
    (
        ChangeKind::TextChange,
        significance,
        ChangeDetail::Text {
            length_delta: new_len as i64 - old_len as i64,
        },
    )
}

fn array_change(old: &[Value], new: &[Value]) -> (ChangeKind, f64, ChangeDetail) {
    let removed = unmatched(old, new);
    let added = unmatched(new, old);
    let reordered = added.is_empty() && removed.is_empty();
    (
        ChangeKind::ArrayChange,
        DEFAULT_SIGNIFICANCE,
        ChangeDetail::Array {
            added,
            removed,
            reordered,
        },
    )
}

/// Elements of `items` without a structurally equal partner in `others`,
/// matching each partner at most once
fn unmatched(items: &[Value], others: &[Value]) -> Vec<Value> {
    let mut used = vec![false; others.len()];
    let mut result = Vec::new();
    for item in items {
        let partner = others
            .iter()
            .enumerate()
            .position(|(i, other)| !used[i] && other == item);
        match partner {
            Some(i) => used[i] = true,
            None => result.push(item.clone()),
        }
    }
    result
}

/// Classify two differing maps
///
/// Returns `None` when every nested difference sits on an ignored path.
fn object_change(
    config: &ComparatorConfig,
    path: &str,
    old: &Fields,
    new: &Fields,
    depth: usize,
) -> Option<(ChangeKind, f64, ChangeDetail)> {
    if !config.deep_compare || depth + 1 > config.max_depth {
        let detail = ChangeDetail::Object {
            changes: Vec::new(),
        };
        return Some((ChangeKind::ObjectChange, DEFAULT_SIGNIFICANCE, detail));
    }

    let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let changes = diff_maps(config, old, new, names.into_iter(), Some(path), depth + 1);
    if changes.is_empty() {
        return None;
    }

    let significance = changes
        .iter()
        .map(|c| c.significance)
        .fold(0.0, f64::max);
    Some((
        ChangeKind::ObjectChange,
        significance,
        ChangeDetail::Object { changes },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::value::fields_from_json;
    use proptest::prelude::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        fields_from_json(value).unwrap()
    }

    fn compare(a: serde_json::Value, b: serde_json::Value) -> Comparison {
        compare_fields(&ComparatorConfig::default(), &fields(a), &fields(b))
    }

    #[test]
    fn test_identical() {
        let result = compare(json!({ "a": 1, "b": [1, 2] }), json!({ "b": [1, 2], "a": 1 }));
        assert!(result.identical);
        assert!(result.differences.is_empty());
        assert_eq!(result.statistics.total_fields, 2);
        assert_eq!(result.statistics.change_percentage, 0.0);
    }

    #[test]
    fn test_added_and_removed() {
        let result = compare(json!({ "a": 1 }), json!({ "b": 2 }));
        assert_eq!(result.difference("a").unwrap().kind, ChangeKind::Removed);
        assert_eq!(result.difference("b").unwrap().kind, ChangeKind::Added);
        assert_eq!(result.difference("b").unwrap().significance, 0.5);
        assert_eq!(result.statistics.added, 1);
        assert_eq!(result.statistics.removed, 1);
        assert_eq!(result.statistics.change_percentage, 1.0);
    }

    #[test]
    fn test_numeric_change() {
        let result = compare(json!({ "amount": 100 }), json!({ "amount": 150 }));
        let diff = result.difference("amount").unwrap();
        assert_eq!(diff.kind, ChangeKind::NumericChange);
        assert_eq!(
            diff.detail,
            ChangeDetail::Numeric {
                delta: 50.0,
                percent_change: Some(50.0)
            }
        );
        assert_eq!(diff.significance, 0.5);
    }

    #[test]
    fn test_numeric_change_from_zero() {
        let result = compare(json!({ "n": 0 }), json!({ "n": 3 }));
        let diff = result.difference("n").unwrap();
        assert_eq!(diff.significance, 1.0);
        assert!(matches!(
            diff.detail,
            ChangeDetail::Numeric {
                percent_change: None,
                ..
            }
        ));
    }

    #[test]
    fn test_large_numeric_change_is_clamped() {
        let result = compare(json!({ "n": 10 }), json!({ "n": 1000 }));
        assert_eq!(result.difference("n").unwrap().significance, 1.0);
    }

    #[test]
    fn test_text_change() {
        let result = compare(json!({ "name": "ACME Ltd" }), json!({ "name": "ACME Limited" }));
        let diff = result.difference("name").unwrap();
        assert_eq!(diff.kind, ChangeKind::TextChange);
        assert_eq!(diff.detail, ChangeDetail::Text { length_delta: 4 });
        // common prefix "ACME L" (6) over max length 12
        assert!((diff.significance - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_array_change() {
        let result = compare(json!({ "tags": ["a", "b", "c"] }), json!({ "tags": ["b", "c", "d"] }));
        let diff = result.difference("tags").unwrap();
        assert_eq!(diff.kind, ChangeKind::ArrayChange);
        assert_eq!(
            diff.detail,
            ChangeDetail::Array {
                added: vec![Value::from("d")],
                removed: vec![Value::from("a")],
                reordered: false,
            }
        );
    }

    #[test]
    fn test_array_reorder() {
        let result = compare(json!({ "x": [1, 2, 3] }), json!({ "x": [3, 2, 1] }));
        assert!(matches!(
            result.difference("x").unwrap().detail,
            ChangeDetail::Array { reordered: true, .. }
        ));
    }

    #[test]
    fn test_array_elements_compare_structurally() {
        let result = compare(
            json!({ "x": [{ "a": 1, "b": 2 }, 5] }),
            json!({ "x": [{ "b": 2, "a": 1 }, 6] }),
        );
        let ChangeDetail::Array { added, removed, .. } = &result.difference("x").unwrap().detail
        else {
            panic!("expected array detail");
        };
        assert_eq!(added, &vec![Value::from(6)]);
        assert_eq!(removed, &vec![Value::from(5)]);
    }

    #[test]
    fn test_nested_object_change() {
        let result = compare(
            json!({ "party": { "name": "ACME", "city": "Oslo", "vat": 1 } }),
            json!({ "party": { "name": "ACME", "city": "Bergen" } }),
        );
        let diff = result.difference("party").unwrap();
        assert_eq!(diff.kind, ChangeKind::ObjectChange);
        let ChangeDetail::Object { changes } = &diff.detail else {
            panic!("expected object detail");
        };
        let nested: Vec<(&str, ChangeKind)> =
            changes.iter().map(|c| (c.field.as_str(), c.kind)).collect();
        assert_eq!(
            nested,
            vec![("party.city", ChangeKind::TextChange), ("party.vat", ChangeKind::Removed)]
        );
        assert_eq!(result.statistics.modified, 1);
    }

    #[test]
    fn test_shallow_object_change_has_no_detail() {
        let result = compare_fields(
            &ComparatorConfig::shallow(),
            &fields(json!({ "p": { "a": 1 } })),
            &fields(json!({ "p": { "a": 2 } })),
        );
        let diff = result.difference("p").unwrap();
        assert_eq!(diff.kind, ChangeKind::ObjectChange);
        assert_eq!(diff.detail, ChangeDetail::Object { changes: vec![] });
    }

    #[test]
    fn test_max_depth_stops_recursion() {
        let config = ComparatorConfig {
            max_depth: 1,
            ..ComparatorConfig::default()
        };
        let result = compare_fields(
            &config,
            &fields(json!({ "a": { "b": { "c": 1 } } })),
            &fields(json!({ "a": { "b": { "c": 2 } } })),
        );
        let ChangeDetail::Object { changes } = &result.difference("a").unwrap().detail else {
            panic!("expected object detail");
        };
        assert_eq!(changes[0].field, "a.b");
        assert_eq!(changes[0].detail, ChangeDetail::Object { changes: vec![] });
    }

    #[test]
    fn test_mixed_kinds_are_modified() {
        let result = compare(json!({ "v": "12", "n": null }), json!({ "v": 12, "n": 1 }));
        assert_eq!(result.difference("v").unwrap().kind, ChangeKind::Modified);
        assert_eq!(result.difference("n").unwrap().kind, ChangeKind::Modified);
        assert_eq!(result.difference("n").unwrap().significance, 0.5);
    }

    #[test]
    fn test_ignored_fields() {
        let config = ComparatorConfig::default().ignore("extractedAt").ignore("party.runId");
        let result = compare_fields(
            &config,
            &fields(json!({ "extractedAt": 1, "party": { "runId": 1, "name": "A" } })),
            &fields(json!({ "extractedAt": 2, "party": { "runId": 2, "name": "A" } })),
        );
        assert_eq!(result.statistics.total_fields, 1);
        assert!(result.identical);
    }

    #[test]
    fn test_object_significance_is_largest_nested() {
        let result = compare(
            json!({ "p": { "n": 0, "s": "abc" } }),
            json!({ "p": { "n": 5, "s": "abd" } }),
        );
        assert_eq!(result.difference("p").unwrap().significance, 1.0);
    }

    fn arb_value() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            (-1000i64..1000).prop_map(serde_json::Value::from),
            "[a-c]{0,4}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
                prop::collection::btree_map("[a-c]", inner, 0..3)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_fields() -> impl Strategy<Value = Fields> {
        prop::collection::btree_map("[a-e]", arb_value(), 0..5)
            .prop_map(|m| fields(serde_json::Value::Object(m.into_iter().collect())))
    }

    proptest! {
        #[test]
        fn prop_self_comparison_is_identical(a in arb_fields()) {
            let result = compare_fields(&ComparatorConfig::default(), &a, &a);
            prop_assert!(result.identical);
            prop_assert!(result.differences.is_empty());
        }

        #[test]
        fn prop_comparison_is_symmetric(a in arb_fields(), b in arb_fields()) {
            let config = ComparatorConfig::default();
            let forward = compare_fields(&config, &a, &b);
            let backward = compare_fields(&config, &b, &a);

            prop_assert_eq!(forward.differences.len(), backward.differences.len());
            prop_assert_eq!(forward.statistics.added, backward.statistics.removed);
            prop_assert_eq!(forward.statistics.removed, backward.statistics.added);
            for (f, r) in forward.differences.iter().zip(&backward.differences) {
                prop_assert_eq!(&f.field, &r.field);
                prop_assert_eq!(f.kind, r.kind.reversed());
                prop_assert_eq!(&f.old, &r.new);
                prop_assert_eq!(&f.new, &r.old);
            }
        }
    }
}
