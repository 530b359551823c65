//! Secondary indexes over entry metadata
//!
//! Owned by the register, rebuilt from storage on open and maintained on
//! every mutation. Never handed out mutably.

use docket_domain::{Entry, EntryId, Metadata};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Category and tag → entry id sets
#[derive(Debug, Default)]
pub(crate) struct Indexes {
    by_category: HashMap<String, HashSet<EntryId>>,
    by_tag: HashMap<String, HashSet<EntryId>>,
}

impl Indexes {
    /// Build indexes from a full set of entries
    pub(crate) fn rebuild(entries: &[Entry]) -> Self {
        let mut indexes = Self::default();
        for entry in entries {
            indexes.insert(&entry.id, &entry.metadata);
        }
        indexes
    }

    /// Index an entry's metadata
    pub(crate) fn insert(&mut self, id: &EntryId, metadata: &Metadata) {
        if let Some(category) = &metadata.category {
            self.by_category
                .entry(category.clone())
                .or_default()
                .insert(id.clone());
        }
        for tag in &metadata.tags {
            self.by_tag.entry(tag.clone()).or_default().insert(id.clone());
        }
    }

    /// Remove an entry's previously indexed metadata
    pub(crate) fn remove(&mut self, id: &EntryId, metadata: &Metadata) {
        if let Some(category) = &metadata.category {
            remove_from(&mut self.by_category, category, id);
        }
        for tag in &metadata.tags {
            remove_from(&mut self.by_tag, tag, id);
        }
    }

    /// Replace an entry's indexed metadata
    pub(crate) fn reindex(&mut self, id: &EntryId, old: &Metadata, new: &Metadata) {
        self.remove(id, old);
        self.insert(id, new);
    }

    /// Ids satisfying a category and all-tags filter
    ///
    /// Returns `None` when neither filter is set, meaning "no narrowing".
    pub(crate) fn candidates(
        &self,
        category: Option<&str>,
        tags: &[String],
    ) -> Option<HashSet<EntryId>> {
        let mut sets: Vec<Option<&HashSet<EntryId>>> = Vec::new();
        if let Some(category) = category {
            sets.push(self.by_category.get(category));
        }
        for tag in tags {
            sets.push(self.by_tag.get(tag));
        }

        let mut sets = sets.into_iter();
        let first = sets.next()?;
        let mut result = first.cloned().unwrap_or_default();
        for set in sets {
            match set {
                Some(set) => result.retain(|id| set.contains(id)),
                None => result.clear(),
            }
        }
        Some(result)
    }

    /// Entry counts per category
    pub(crate) fn category_counts(&self) -> BTreeMap<String, usize> {
        self.by_category
            .iter()
            .map(|(category, ids)| (category.clone(), ids.len()))
            .collect()
    }
}

fn remove_from(index: &mut HashMap<String, HashSet<EntryId>>, key: &str, id: &EntryId) {
    if let Some(ids) = index.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}
