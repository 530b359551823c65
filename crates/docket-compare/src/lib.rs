//! Docket Compare
//!
//! Structural comparison of records held in a register:
//!
//! - **Pairwise diff**: per-field classification (added, removed, numeric,
//!   text, array, object, modified) with a significance score
//! - **Version timeline**: diffs between consecutive versions of one entry
//!   and a ranking of the most frequently changed fields
//! - **Conflicts**: fields on which documents valid at the same time disagree
//! - **Overlaps**: key-field duplicates and near-identical document pairs
//!
//! The comparator is stateless and never mutates the register.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod comparator;
pub mod config;
pub mod conflicts;
pub mod diff;
pub mod document;
pub mod overlaps;
pub mod timeline;

pub use comparator::Comparator;
pub use config::ComparatorConfig;
pub use conflicts::{Conflict, ConflictOptions, ConflictingValue};
pub use diff::{ChangeDetail, ChangeKind, Comparison, DiffStatistics, Difference};
pub use document::Document;
pub use overlaps::{DuplicateGroup, OverlapOptions, OverlapReport, SimilarPair};
pub use timeline::{FieldChangeCount, TimelineStep, VersionTimeline};
