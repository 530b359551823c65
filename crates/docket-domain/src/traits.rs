//! Trait definitions for external interactions
//!
//! These traits define the boundary between the register and storage.
//! Implementations live in `docket-store`.

use crate::Entry;
use async_trait::async_trait;

/// Key → entry storage
///
/// Implemented by the infrastructure layer (docket-store). Adapters must
/// round-trip entries losslessly: the register compares what it reads back
/// against the shape it wrote.
///
/// Calls on an adapter are the only suspension points of register
/// operations. Timeouts, if any, belong here.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Error type for adapter operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write (insert or replace) the entry stored under `key`
    async fn write(&self, key: &str, entry: &Entry) -> Result<(), Self::Error>;

    /// Read the entry stored under `key`
    async fn read(&self, key: &str) -> Result<Option<Entry>, Self::Error>;

    /// Read every stored entry
    async fn list(&self) -> Result<Vec<Entry>, Self::Error>;

    /// Delete the entry stored under `key`, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, Self::Error>;
}
