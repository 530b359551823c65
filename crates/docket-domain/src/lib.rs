//! Docket Domain Layer
//!
//! This crate contains the data model shared by the register, the storage
//! adapters and the comparator. It defines the typed value model, versioned
//! entries, effective intervals and the trait boundary to storage.
//!
//! ## Key Concepts
//!
//! - **Entry**: The versioned record unit - structured `data` plus metadata
//! - **Head version**: The current, highest-numbered version of an entry
//! - **HistoryRecord**: An immutable snapshot of a superseded version
//! - **Effective interval**: The half-open range `[from, to)` during which a
//!   version is authoritative
//! - **Query**: Closed predicate set evaluated against entry data
//!
//! ## Architecture
//!
//! - Pure data and behaviour on that data only
//! - Storage implementations live in `docket-store`
//! - Register state (indexes, audit log, locks) lives in `docket-register`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod entry;
pub mod interval;
pub mod metadata;
pub mod query;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use audit::{AuditAction, AuditLogEntry};
pub use entry::{Entry, EntryId, EntryStatus, HistoryRecord, Record, VersionView};
pub use interval::EffectiveInterval;
pub use metadata::Metadata;
pub use query::{Predicate, Query, QueryError, QueryMatch};
pub use traits::StorageAdapter;
pub use value::{Fields, Value};
