//! Overlap detection: explicit-key duplicates and near-identical documents

use crate::config::ComparatorConfig;
use crate::document::Document;
use docket_domain::value::lookup;
use docket_domain::{EntryId, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Options for [`find_overlaps`](crate::Comparator::find_overlaps)
#[derive(Debug, Clone, Default)]
pub struct OverlapOptions {
    /// Field paths forming the duplicate key; no key grouping when empty
    pub key_fields: Vec<String>,

    /// Similarity threshold; the comparator's configured threshold when absent
    pub similarity_threshold: Option<f64>,
}

impl OverlapOptions {
    /// Group by these key fields
    pub fn key_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_fields: fields.into_iter().map(Into::into).collect(),
            similarity_threshold: None,
        }
    }

    /// Override the similarity threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }
}

/// Documents sharing the same key-field values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Key values, in key-field order
    pub key: Vec<Value>,
    /// Members, in input order
    pub document_ids: Vec<EntryId>,
}

/// Two documents whose fields mostly agree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPair {
    /// Earlier document in input order
    pub first: EntryId,
    /// Later document in input order
    pub second: EntryId,
    /// Matching fields over the union of field names
    pub similarity: f64,
}

/// Result of overlap detection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapReport {
    /// Key groups with more than one member
    pub duplicate_groups: Vec<DuplicateGroup>,
    /// Pairs at or above the similarity threshold
    pub similar_pairs: Vec<SimilarPair>,
}

impl OverlapReport {
    /// Whether nothing overlaps
    pub fn is_empty(&self) -> bool {
        self.duplicate_groups.is_empty() && self.similar_pairs.is_empty()
    }
}

pub(crate) fn find_overlaps(
    config: &ComparatorConfig,
    documents: &[Document],
    options: &OverlapOptions,
) -> OverlapReport {
    let threshold = options
        .similarity_threshold
        .unwrap_or(config.similarity_threshold);

    OverlapReport {
        duplicate_groups: duplicate_groups(documents, &options.key_fields),
        similar_pairs: similar_pairs(config, documents, threshold),
    }
}

/// Group documents by key tuple
///
/// Documents missing any key field are left out.
fn duplicate_groups(documents: &[Document], key_fields: &[String]) -> Vec<DuplicateGroup> {
    if key_fields.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for doc in documents {
        let key: Option<Vec<Value>> = key_fields
            .iter()
            .map(|field| lookup(&doc.data, field).cloned())
            .collect();
        let Some(key) = key else {
            continue;
        };

        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.document_ids.push(doc.id.clone()),
            None => groups.push(DuplicateGroup {
                key,
                document_ids: vec![doc.id.clone()],
            }),
        }
    }

    groups.retain(|group| group.document_ids.len() > 1);
    groups
}

fn similar_pairs(
    config: &ComparatorConfig,
    documents: &[Document],
    threshold: f64,
) -> Vec<SimilarPair> {
    let mut pairs = Vec::new();
    for (i, first) in documents.iter().enumerate() {
        for second in &documents[i + 1..] {
            let Some(similarity) = similarity(config, first, second) else {
                continue;
            };
            if similarity >= threshold {
                pairs.push(SimilarPair {
                    first: first.id.clone(),
                    second: second.id.clone(),
                    similarity,
                });
            }
        }
    }
    tracing::debug!(
        "Similarity scan over {} documents found {} pairs",
        documents.len(),
        pairs.len()
    );
    pairs
}

/// Matching top-level fields over the union of field names
///
/// `None` when neither document has a comparable field.
fn similarity(config: &ComparatorConfig, a: &Document, b: &Document) -> Option<f64> {
    let names: BTreeSet<&String> = a
        .data
        .keys()
        .chain(b.data.keys())
        .filter(|name| !config.is_ignored(name))
        .collect();
    if names.is_empty() {
        return None;
    }

    let matching = names
        .iter()
        .filter(|name| match (a.data.get(**name), b.data.get(**name)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        })
        .count();
    Some(matching as f64 / names.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use docket_domain::value::fields_from_json;
    use docket_domain::EffectiveInterval;
    use serde_json::json;

    fn doc(id: &str, data: serde_json::Value) -> Document {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Document::new(id, fields_from_json(data).unwrap(), EffectiveInterval::open(from))
    }

    fn ids(group: &[EntryId]) -> Vec<&str> {
        group.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn test_duplicate_groups_by_key() {
        let documents = vec![
            doc("a", json!({ "invoice": "INV-1", "vendor": { "vat": "NO1" } })),
            doc("b", json!({ "invoice": "INV-2", "vendor": { "vat": "NO1" } })),
            doc("c", json!({ "invoice": "INV-1", "vendor": { "vat": "NO1" } })),
            doc("d", json!({ "invoice": "INV-1" })),
        ];
        let report = find_overlaps(
            &ComparatorConfig::default(),
            &documents,
            &OverlapOptions::key_fields(["invoice", "vendor.vat"]),
        );

        assert_eq!(report.duplicate_groups.len(), 1);
        let group = &report.duplicate_groups[0];
        assert_eq!(ids(&group.document_ids), vec!["a", "c"]);
        assert_eq!(group.key, vec![Value::from("INV-1"), Value::from("NO1")]);
    }

    #[test]
    fn test_similar_pairs_use_threshold() {
        let documents = vec![
            doc("a", json!({ "f1": 1, "f2": 2, "f3": 3, "f4": 4 })),
            doc("b", json!({ "f1": 1, "f2": 2, "f3": 3, "f4": 5 })),
            doc("c", json!({ "f1": 9, "f2": 9 })),
        ];

        let report = find_overlaps(&ComparatorConfig::default(), &documents, &OverlapOptions::default());
        assert!(report.is_empty());

        let report = find_overlaps(
            &ComparatorConfig::default(),
            &documents,
            &OverlapOptions::default().threshold(0.75),
        );
        assert_eq!(report.similar_pairs.len(), 1);
        let pair = &report.similar_pairs[0];
        assert_eq!((pair.first.as_str(), pair.second.as_str()), ("a", "b"));
        assert_eq!(pair.similarity, 0.75);
    }

    #[test]
    fn test_identical_documents_are_similar() {
        let documents = vec![
            doc("a", json!({ "x": [1, 2], "y": { "z": true } })),
            doc("b", json!({ "y": { "z": true }, "x": [1, 2] })),
        ];
        let report = find_overlaps(&ComparatorConfig::default(), &documents, &OverlapOptions::default());
        assert_eq!(report.similar_pairs[0].similarity, 1.0);
    }

    #[test]
    fn test_ignored_fields_do_not_count() {
        let documents = vec![
            doc("a", json!({ "x": 1, "extractedAt": 1 })),
            doc("b", json!({ "x": 1, "extractedAt": 2 })),
        ];
        let config = ComparatorConfig::default().ignore("extractedAt");
        let report = find_overlaps(&config, &documents, &OverlapOptions::default());
        assert_eq!(report.similar_pairs.len(), 1);
    }

    #[test]
    fn test_empty_documents_are_not_paired() {
        let documents = vec![doc("a", json!({})), doc("b", json!({}))];
        let report = find_overlaps(&ComparatorConfig::default(), &documents, &OverlapOptions::default());
        assert!(report.is_empty());
    }
}
