//! Entry metadata - classification and provenance of a record

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Metadata attached to every entry and history record
///
/// `category` and `tags` feed the register's secondary indexes. Fields the
/// register does not know about are kept in `extra` and serialized flat
/// alongside the known ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Single classification tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Free tags
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// Origin of the record (e.g. "upload:contract-17.pdf")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Schema the record was extracted against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    /// Version of that schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,

    /// Extraction confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Extension fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the schema identifier and version
    pub fn with_schema(mut self, id: impl Into<String>, version: impl Into<String>) -> Self {
        self.schema_id = Some(id.into());
        self.schema_version = Some(version.into());
        self
    }

    /// Set the extraction confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Set an extension field
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Merge newer metadata over this one
    ///
    /// Scalar fields present in `newer` win. Tags are replaced only when
    /// `newer` carries at least one tag. Extension fields merge key-wise.
    pub fn merge(&mut self, newer: Metadata) {
        if newer.category.is_some() {
            self.category = newer.category;
        }
        if !newer.tags.is_empty() {
            self.tags = newer.tags;
        }
        if newer.source.is_some() {
            self.source = newer.source;
        }
        if newer.schema_id.is_some() {
            self.schema_id = newer.schema_id;
        }
        if newer.schema_version.is_some() {
            self.schema_version = newer.schema_version;
        }
        if newer.confidence.is_some() {
            self.confidence = newer.confidence;
        }
        self.extra.extend(newer.extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base = Metadata::new()
            .with_category("contract")
            .with_tag("legal")
            .with_source("upload:a.pdf");
        base.merge(Metadata::new().with_confidence(0.9));

        assert_eq!(base.category.as_deref(), Some("contract"));
        assert!(base.tags.contains("legal"));
        assert_eq!(base.source.as_deref(), Some("upload:a.pdf"));
        assert_eq!(base.confidence, Some(0.9));
    }

    #[test]
    fn test_merge_replaces_tags_when_given() {
        let mut base = Metadata::new().with_tag("draft").with_tag("legal");
        base.merge(Metadata::new().with_tag("final"));

        assert_eq!(base.tags.len(), 1);
        assert!(base.tags.contains("final"));
    }

    #[test]
    fn test_merge_extra_is_keywise() {
        let mut base = Metadata::new().with_extra("reviewer", "kim").with_extra("pages", 3);
        base.merge(Metadata::new().with_extra("pages", 4));

        assert_eq!(base.extra.get("reviewer"), Some(&Value::from("kim")));
        assert_eq!(base.extra.get("pages"), Some(&Value::from(4)));
    }

    #[test]
    fn test_serde_flattens_extra() {
        let metadata = Metadata::new()
            .with_category("invoice")
            .with_schema("invoice", "2")
            .with_extra("reviewer", "kim");
        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["category"], "invoice");
        assert_eq!(json["schemaId"], "invoice");
        assert_eq!(json["reviewer"], "kim");

        let parsed: Metadata = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, metadata);
    }
}
