//! The comparator

use crate::config::ComparatorConfig;
use crate::conflicts::{self, Conflict, ConflictOptions};
use crate::diff::{self, Comparison};
use crate::document::Document;
use crate::overlaps::{self, OverlapOptions, OverlapReport};
use crate::timeline::{self, TimelineStep, VersionTimeline};
use docket_domain::{Entry, Fields};

/// Stateless diff, conflict and overlap engine
///
/// Works on data fetched from a register; never mutates it. None of the
/// operations fail: an empty result is a valid outcome.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: ComparatorConfig,
}

impl Comparator {
    /// Create a comparator with the given configuration
    pub fn new(config: ComparatorConfig) -> Self {
        Self { config }
    }

    /// Create a comparator, rejecting an invalid configuration
    pub fn try_new(config: ComparatorConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// The active configuration
    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Diff two field maps
    ///
    /// `compare(a, b)` and `compare(b, a)` report the same fields with
    /// added and removed swapped.
    pub fn compare(&self, a: &Fields, b: &Fields) -> Comparison {
        diff::compare_fields(&self.config, a, b)
    }

    /// Diff the data of two documents
    pub fn compare_documents(&self, a: &Document, b: &Document) -> Comparison {
        self.compare(&a.data, &b.data)
    }

    /// Diff every consecutive pair of an entry's versions
    pub fn compare_versions(&self, entry: &Entry) -> VersionTimeline {
        let versions = entry.all_versions();
        let steps: Vec<TimelineStep> = versions
            .windows(2)
            .map(|pair| TimelineStep {
                from_version: pair[0].version,
                to_version: pair[1].version,
                from_effective: pair[0].effective_from,
                to_effective: pair[1].effective_from,
                comparison: self.compare(&pair[0].data, &pair[1].data),
            })
            .collect();

        tracing::debug!(
            "Timeline for {}: {} versions, {} steps",
            entry.id,
            versions.len(),
            steps.len()
        );

        VersionTimeline {
            id: entry.id.clone(),
            versions: versions.iter().map(|v| v.version).collect(),
            most_changed: timeline::rank_changes(&steps),
            steps,
        }
    }

    /// Fields on which documents in force at the same time disagree
    pub fn find_conflicts(&self, documents: &[Document], options: &ConflictOptions) -> Vec<Conflict> {
        conflicts::find_conflicts(&self.config, documents, options)
    }

    /// Key-field duplicates and near-identical document pairs
    pub fn find_overlaps(&self, documents: &[Document], options: &OverlapOptions) -> OverlapReport {
        overlaps::find_overlaps(&self.config, documents, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ChangeDetail, ChangeKind};
    use chrono::{TimeZone, Utc};
    use docket_domain::value::fields_from_json;
    use docket_domain::{EffectiveInterval, EntryId, Record};
    use serde_json::json;

    fn record(data: serde_json::Value) -> Record {
        Record::new(fields_from_json(data).unwrap())
    }

    #[test]
    fn test_compare_versions_scenario() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let jun = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut entry = Entry::new(
            EntryId::from("doc"),
            record(json!({ "amount": 100 })),
            EffectiveInterval::open(jan),
            jan,
        );
        entry.supersede(record(json!({ "amount": 150 })), EffectiveInterval::open(jun), jun, jun);

        let timeline = Comparator::default().compare_versions(&entry);
        assert_eq!(timeline.versions, vec![1, 2]);
        assert_eq!(timeline.steps.len(), 1);

        let step = &timeline.steps[0];
        assert_eq!((step.from_version, step.to_version), (1, 2));
        assert_eq!(step.to_effective, jun);
        let diff = step.comparison.difference("amount").unwrap();
        assert_eq!(diff.kind, ChangeKind::NumericChange);
        assert!(matches!(diff.detail, ChangeDetail::Numeric { delta, .. } if delta == 50.0));
    }

    #[test]
    fn test_most_changed_ranking() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut entry = Entry::new(
            EntryId::from("doc"),
            record(json!({ "a": 1, "b": 1, "c": 1 })),
            EffectiveInterval::open(at),
            at,
        );
        for data in [
            json!({ "a": 2, "b": 2, "c": 1 }),
            json!({ "a": 3, "b": 2, "c": 2 }),
            json!({ "a": 4, "b": 3, "c": 2 }),
        ] {
            entry.supersede(record(data), EffectiveInterval::open(at), at, at);
        }

        let timeline = Comparator::default().compare_versions(&entry);
        let ranking: Vec<(&str, usize)> = timeline
            .most_changed
            .iter()
            .map(|c| (c.field.as_str(), c.count))
            .collect();
        assert_eq!(ranking, vec![("a", 3), ("b", 2), ("c", 1)]);
    }

    #[test]
    fn test_single_version_has_no_steps() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entry = Entry::new(
            EntryId::from("doc"),
            record(json!({ "a": 1 })),
            EffectiveInterval::open(at),
            at,
        );
        let timeline = Comparator::default().compare_versions(&entry);
        assert_eq!(timeline.versions, vec![1]);
        assert!(timeline.steps.is_empty());
        assert!(timeline.most_changed.is_empty());
    }

    #[test]
    fn test_try_new_validates() {
        let config = ComparatorConfig {
            similarity_threshold: -0.1,
            ..ComparatorConfig::default()
        };
        assert!(Comparator::try_new(config).is_err());
        assert!(Comparator::try_new(ComparatorConfig::strict()).is_ok());
    }
}
