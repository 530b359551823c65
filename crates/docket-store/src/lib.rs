//! Docket Storage Layer
//!
//! Implements the [`StorageAdapter`] trait for three backends:
//!
//! - [`MemoryStore`]: a `HashMap` behind a lock, for tests and ephemeral registers
//! - [`FileStore`]: one JSON document per entry in a directory
//! - [`SqliteStore`]: JSON documents in a single SQLite table
//!
//! All three round-trip entries losslessly, history included.
//!
//! # Examples
//!
//! ```no_run
//! use docket_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready to back a register
//! ```
//!
//! [`StorageAdapter`]: docket_domain::StorageAdapter

#![warn(missing_docs)]

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key is not usable by this backend
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
