//! In-memory storage adapter

use crate::StoreError;
use async_trait::async_trait;
use docket_domain::{Entry, StorageAdapter};
use parking_lot::RwLock;
use std::collections::HashMap;

/// `HashMap`-backed adapter
///
/// Nothing survives the process. Entries are cloned in and out, so callers
/// never share state with the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStore {
    type Error = StoreError;

    async fn write(&self, key: &str, entry: &Entry) -> Result<(), Self::Error> {
        self.entries.write().insert(key.to_string(), entry.clone());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Entry>, Self::Error> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<Entry>, Self::Error> {
        let guard = self.entries.read();
        let mut keys: Vec<&String> = guard.keys().collect();
        keys.sort();
        Ok(keys.into_iter().filter_map(|k| guard.get(k).cloned()).collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, Self::Error> {
        Ok(self.entries.write().remove(key).is_some())
    }
}
