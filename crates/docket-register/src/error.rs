//! Error types for register operations

use docket_domain::{EntryId, QueryError};
use thiserror::Error;

/// Errors that can occur during register operations
///
/// `E` is the storage adapter's error type. Adapter failures are carried
/// unmodified in [`RegisterError::Storage`].
#[derive(Error, Debug)]
pub enum RegisterError<E>
where
    E: std::error::Error + 'static,
{
    /// No entry with this id
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Entry exists but has no such version
    #[error("Version {version} not found for entry {id}")]
    VersionNotFound {
        /// Entry identifier
        id: EntryId,
        /// Requested version
        version: u32,
    },

    /// Caller-supplied id is already taken
    #[error("Entry already exists: {0}")]
    DuplicateEntry(EntryId),

    /// Search query could not be built
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Import payload could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage adapter failure
    #[error("Storage error: {0}")]
    Storage(#[source] E),
}

impl<E> RegisterError<E>
where
    E: std::error::Error + 'static,
{
    /// Whether this error reports a missing entry or version
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegisterError::EntryNotFound(_) | RegisterError::VersionNotFound { .. }
        )
    }
}

/// A per-item failure during bulk import
///
/// Collected into the import report rather than aborting the batch.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Import item {index} failed: {message}")]
pub struct ImportItemError {
    /// Position of the item in the payload
    pub index: usize,

    /// Entry id, when the item got far enough to have one
    pub id: Option<EntryId>,

    /// What went wrong
    pub message: String,
}
