//! Conflict detection across documents
//!
//! Differing values are only a conflict when the documents holding them are
//! in force at the same time. Sequential versions with different values are
//! ordinary evolution and are never flagged.

use crate::config::ComparatorConfig;
use crate::document::Document;
use docket_domain::{EntryId, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Conflicting documents at which severity saturates
const SEVERITY_SATURATION: f64 = 10.0;

/// Options for [`find_conflicts`](crate::Comparator::find_conflicts)
#[derive(Debug, Clone, Default)]
pub struct ConflictOptions {
    /// Fields to check; every non-ignored top-level field when absent
    pub fields: Option<Vec<String>>,
}

impl ConflictOptions {
    /// Check only these fields
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
        }
    }
}

/// One value of a conflicting field and who holds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictingValue {
    /// The value
    pub value: Value,
    /// Documents holding it, in input order
    pub document_ids: Vec<EntryId>,
}

/// A field on which simultaneously valid documents disagree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Field name
    pub field: String,
    /// Distinct values among the conflicting documents
    pub values: Vec<ConflictingValue>,
    /// Documents involved in at least one disagreement, in input order
    pub document_ids: Vec<EntryId>,
    /// `min(1, documents / 10)`: a saturating heuristic, not a probability
    pub severity: f64,
}

pub(crate) fn find_conflicts(
    config: &ComparatorConfig,
    documents: &[Document],
    options: &ConflictOptions,
) -> Vec<Conflict> {
    let fields: Vec<String> = match &options.fields {
        Some(fields) => fields.clone(),
        None => documents
            .iter()
            .flat_map(|doc| doc.data.keys())
            .filter(|name| !config.is_ignored(name))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    };

    fields
        .into_iter()
        .filter_map(|field| field_conflict(documents, field))
        .collect()
}

fn field_conflict(documents: &[Document], field: String) -> Option<Conflict> {
    let holders: Vec<(&Document, &Value)> = documents
        .iter()
        .filter_map(|doc| doc.data.get(&field).map(|value| (doc, value)))
        .collect();

    let mut involved = vec![false; holders.len()];
    for (i, (doc_a, value_a)) in holders.iter().enumerate() {
        for (j, (doc_b, value_b)) in holders.iter().enumerate().skip(i + 1) {
            if value_a != value_b && doc_a.interval.overlaps(&doc_b.interval) {
                involved[i] = true;
                involved[j] = true;
            }
        }
    }

    let conflicting: Vec<(&Document, &Value)> = holders
        .into_iter()
        .zip(involved)
        .filter_map(|(holder, involved)| involved.then_some(holder))
        .collect();
    if conflicting.is_empty() {
        return None;
    }

    let mut values: Vec<ConflictingValue> = Vec::new();
    for (doc, value) in &conflicting {
        match values.iter_mut().find(|v| &v.value == *value) {
            Some(existing) => existing.document_ids.push(doc.id.clone()),
            None => values.push(ConflictingValue {
                value: (*value).clone(),
                document_ids: vec![doc.id.clone()],
            }),
        }
    }

    let severity = (conflicting.len() as f64 / SEVERITY_SATURATION).min(1.0);
    tracing::debug!(
        "Conflict on {}: {} documents, {} values",
        field,
        conflicting.len(),
        values.len()
    );

    Some(Conflict {
        field,
        values,
        document_ids: conflicting.iter().map(|(doc, _)| doc.id.clone()).collect(),
        severity,
    })
}
