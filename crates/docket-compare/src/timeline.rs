//! Version timelines: consecutive-version diffs of one entry

use crate::diff::Comparison;
use chrono::{DateTime, Utc};
use docket_domain::EntryId;
use serde::{Deserialize, Serialize};

/// The change from one version to the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    /// Earlier version
    pub from_version: u32,
    /// Later version
    pub to_version: u32,
    /// Start of the earlier version's validity
    pub from_effective: DateTime<Utc>,
    /// Start of the later version's validity
    pub to_effective: DateTime<Utc>,
    /// Diff of the two versions' data
    pub comparison: Comparison,
}

/// How often a top-level field changed across a timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChangeCount {
    /// Field name
    pub field: String,
    /// Number of steps in which it changed
    pub count: usize,
}

/// Every version of an entry and the diffs between consecutive versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionTimeline {
    /// Entry id
    pub id: EntryId,
    /// Version numbers, ascending
    pub versions: Vec<u32>,
    /// One step per consecutive pair of versions
    pub steps: Vec<TimelineStep>,
    /// Fields by change count, most changed first, ties by name
    pub most_changed: Vec<FieldChangeCount>,
}

/// Rank fields by how many steps changed them
pub(crate) fn rank_changes(steps: &[TimelineStep]) -> Vec<FieldChangeCount> {
    let mut counts: Vec<FieldChangeCount> = Vec::new();
    for difference in steps.iter().flat_map(|step| &step.comparison.differences) {
        match counts.iter_mut().find(|c| c.field == difference.field) {
            Some(count) => count.count += 1,
            None => counts.push(FieldChangeCount {
                field: difference.field.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.field.cmp(&b.field)));
    counts
}
