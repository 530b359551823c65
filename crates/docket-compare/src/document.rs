//! Documents: the comparator's view of a record

use docket_domain::{EffectiveInterval, Entry, EntryId, Fields, VersionView};
use serde::{Deserialize, Serialize};

/// Identified data with a validity interval
///
/// Built from a register entry (head version), from any version view, or
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier reported in conflicts and overlaps
    pub id: EntryId,
    /// Field values
    pub data: Fields,
    /// When the data is authoritative
    pub interval: EffectiveInterval,
}

impl Document {
    /// Create a document
    pub fn new(id: impl Into<EntryId>, data: Fields, interval: EffectiveInterval) -> Self {
        Self {
            id: id.into(),
            data,
            interval,
        }
    }
}

impl From<&Entry> for Document {
    fn from(entry: &Entry) -> Self {
        Self::new(entry.id.clone(), entry.data.clone(), entry.interval())
    }
}

impl From<Entry> for Document {
    fn from(entry: Entry) -> Self {
        let interval = entry.interval();
        Self::new(entry.id, entry.data, interval)
    }
}

impl From<&VersionView> for Document {
    fn from(view: &VersionView) -> Self {
        Self::new(view.id.clone(), view.data.clone(), view.interval())
    }
}

impl From<VersionView> for Document {
    fn from(view: VersionView) -> Self {
        let interval = view.interval();
        Self::new(view.id, view.data, interval)
    }
}
