//! Docket Register
//!
//! The versioned, effective-dated record register. Records are stored through
//! a [`StorageAdapter`](docket_domain::StorageAdapter); every update demotes
//! the previous head version to an append-only history, so any version, or
//! the version in force at any instant, can be read back.
//!
//! ## Components
//!
//! - [`VersionedRegister`]: add, update, get, archive, list, search,
//!   export and import, plus batch helpers
//! - [`TemporalResolver`]: as-of lookup over an entry's versions
//! - [`AuditLog`]: append-only record of mutations, optionally bounded
//!
//! ## Concurrency
//!
//! Mutations of one id are serialized by a per-id async lock held across
//! the read-modify-write. Indexes and the audit log sit behind synchronous
//! locks that are never held across an adapter call.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
mod batch;
pub mod config;
pub mod error;
mod index;
mod locks;
pub mod options;
pub mod register;
pub mod temporal;
pub mod transfer;

pub use audit::{AuditLog, AuditQuery};
pub use config::RegisterConfig;
pub use error::{ImportItemError, RegisterError};
pub use options::{
    AddOptions, ArchiveOptions, EntrySummary, ExportOptions, GetOptions, ImportOptions,
    ListOptions, Page, RegisterStats, SearchHit, SearchOptions, SortDirection, SortField,
    UpdateOptions,
};
pub use register::{RegisterResult, VersionedRegister};
pub use temporal::TemporalResolver;
pub use transfer::{ExportPayload, ImportReport};
