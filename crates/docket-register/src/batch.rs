//! Batch helpers
//!
//! Each helper drives at most `max_concurrency` register calls at once and
//! returns one result per input, in input order. A failed item does not stop
//! the others.

use crate::options::{AddOptions, GetOptions, UpdateOptions};
use crate::register::{RegisterResult, VersionedRegister};
use docket_domain::{Entry, EntryId, Record, StorageAdapter, VersionView};
use futures::stream::{self, StreamExt};
use tracing::debug;

impl<S: StorageAdapter> VersionedRegister<S> {
    /// Add many records
    pub async fn add_batch(
        &self,
        items: Vec<(Record, AddOptions)>,
    ) -> Vec<RegisterResult<Entry, S>> {
        debug!("Adding batch of {} records", items.len());
        stream::iter(items)
            .map(|(record, options)| self.add(record, options))
            .buffered(self.config().max_concurrency)
            .collect()
            .await
    }

    /// Update many entries
    ///
    /// Updates of the same id are serialized by the per-id lock and applied
    /// in the order they were acquired.
    pub async fn update_batch(
        &self,
        items: Vec<(EntryId, Record, UpdateOptions)>,
    ) -> Vec<RegisterResult<Entry, S>> {
        debug!("Updating batch of {} records", items.len());
        stream::iter(items)
            .map(|(id, record, options)| async move { self.update(&id, record, options).await })
            .buffered(self.config().max_concurrency)
            .collect()
            .await
    }

    /// Fetch many entries with the same options
    pub async fn get_batch(
        &self,
        ids: Vec<EntryId>,
        options: GetOptions,
    ) -> Vec<RegisterResult<Option<VersionView>, S>> {
        debug!("Fetching batch of {} entries", ids.len());
        stream::iter(ids)
            .map(|id| {
                let options = options.clone();
                async move { self.get(&id, options).await }
            })
            .buffered(self.config().max_concurrency)
            .collect()
            .await
    }
}
