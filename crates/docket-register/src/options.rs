//! Operation options and read-side views

use chrono::{DateTime, Utc};
use docket_domain::value::lookup;
use docket_domain::{Entry, EntryId, EntryStatus, Fields, Metadata, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Options for [`add`](crate::VersionedRegister::add)
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Caller-chosen id; generated when absent
    pub id: Option<EntryId>,

    /// Start of validity; defaults to now
    pub effective_from: Option<DateTime<Utc>>,

    /// End of validity; open-ended when absent
    pub effective_to: Option<DateTime<Utc>>,
}

impl AddOptions {
    /// Use a caller-chosen id
    pub fn with_id(id: impl Into<EntryId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Set the start of validity
    pub fn effective_from(mut self, at: DateTime<Utc>) -> Self {
        self.effective_from = Some(at);
        self
    }

    /// Set the end of validity
    pub fn effective_to(mut self, at: DateTime<Utc>) -> Self {
        self.effective_to = Some(at);
        self
    }
}

/// Options for [`update`](crate::VersionedRegister::update)
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Start of the new head's validity; defaults to now
    pub effective_from: Option<DateTime<Utc>>,

    /// End of the new head's validity; open-ended when absent
    pub effective_to: Option<DateTime<Utc>>,

    /// Where the superseded version's validity ends; defaults to now
    pub supersede_at: Option<DateTime<Utc>>,
}

impl UpdateOptions {
    /// New head valid from `at`, closing the previous head at the same instant
    pub fn effective_from(at: DateTime<Utc>) -> Self {
        Self {
            effective_from: Some(at),
            supersede_at: Some(at),
            ..Self::default()
        }
    }

    /// Set the end of the new head's validity
    pub fn effective_to(mut self, at: DateTime<Utc>) -> Self {
        self.effective_to = Some(at);
        self
    }

    /// Close the superseded version at `at`
    pub fn supersede_at(mut self, at: DateTime<Utc>) -> Self {
        self.supersede_at = Some(at);
        self
    }
}

/// Options for [`get`](crate::VersionedRegister::get)
///
/// `version` takes precedence over `as_of` when both are set.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Fetch this exact version
    pub version: Option<u32>,

    /// Fetch the version in force at this time
    pub as_of: Option<DateTime<Utc>>,
}

impl GetOptions {
    /// The head version
    pub fn current() -> Self {
        Self::default()
    }

    /// An exact version
    pub fn version(version: u32) -> Self {
        Self {
            version: Some(version),
            as_of: None,
        }
    }

    /// The version in force at `at`
    pub fn as_of(at: DateTime<Utc>) -> Self {
        Self {
            version: None,
            as_of: Some(at),
        }
    }
}

/// Options for [`archive`](crate::VersionedRegister::archive)
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Recorded in the audit log
    pub reason: Option<String>,

    /// Close the head's validity here
    pub effective_to: Option<DateTime<Utc>>,
}

impl ArchiveOptions {
    /// Archive with a reason
    pub fn reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            effective_to: None,
        }
    }

    /// Close the head's validity at `at`
    pub fn effective_to(mut self, at: DateTime<Utc>) -> Self {
        self.effective_to = Some(at);
        self
    }
}

/// Sort key for listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortField {
    /// Creation time
    #[default]
    CreatedAt,
    /// Last mutation time
    UpdatedAt,
    /// Start of head validity
    EffectiveFrom,
    /// Head version number
    Version,
    /// Entry id
    Id,
    /// A data field, by dotted path
    Field(String),
}

impl SortField {
    /// Compare two entries on this key
    ///
    /// Field values of different kinds order by kind first. Entries lacking
    /// a data field (or holding an unorderable value) sort after entries
    /// that have one, whatever the direction.
    fn compare(&self, a: &Entry, b: &Entry, direction: SortDirection) -> Ordering {
        let ordering = match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::EffectiveFrom => a.effective_from.cmp(&b.effective_from),
            SortField::Version => a.version.cmp(&b.version),
            SortField::Id => a.id.cmp(&b.id),
            SortField::Field(path) => {
                let x = lookup(&a.data, path).and_then(sort_key);
                let y = lookup(&b.data, path).and_then(sort_key);
                return match (x, y) {
                    (Some((rank_x, x)), Some((rank_y, y))) => direction.apply(
                        rank_x
                            .cmp(&rank_y)
                            .then_with(|| x.compare(y).unwrap_or(Ordering::Equal)),
                    ),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
            }
        };
        direction.apply(ordering)
    }
}

/// Rank of an orderable field value
///
/// Values of different kinds order by kind (bool, number, text, date).
/// Null, lists, maps and NaN have no rank.
fn sort_key(value: &Value) -> Option<(u8, &Value)> {
    let rank = match value {
        Value::Bool(_) => 0,
        Value::Number(n) if !n.is_nan() => 1,
        Value::Text(_) => 2,
        Value::Date(_) => 3,
        _ => return None,
    };
    Some((rank, value))
}

/// Sort direction for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest first
    #[default]
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Options for [`list`](crate::VersionedRegister::list)
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Status filter; `None` lists every status
    /// Default: active only
    pub status: Option<EntryStatus>,

    /// Only entries in this category
    pub category: Option<String>,

    /// Only entries carrying all of these tags
    pub tags: Vec<String>,

    /// Only entries whose head interval contains this time
    pub effective_at: Option<DateTime<Utc>>,

    /// Sort key
    pub sort_by: SortField,

    /// Sort direction
    pub direction: SortDirection,

    /// Items to skip
    pub offset: usize,

    /// Page size; the register's default page limit when absent
    pub limit: Option<usize>,

    /// Include `data` in summaries
    pub include_data: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            status: Some(EntryStatus::Active),
            category: None,
            tags: Vec::new(),
            effective_at: None,
            sort_by: SortField::default(),
            direction: SortDirection::default(),
            offset: 0,
            limit: None,
            include_data: false,
        }
    }
}

impl ListOptions {
    /// List every status
    pub fn all_statuses() -> Self {
        Self {
            status: None,
            ..Self::default()
        }
    }

    /// Restrict to a category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Require a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Restrict to entries in force at `at`
    pub fn effective_at(mut self, at: DateTime<Utc>) -> Self {
        self.effective_at = Some(at);
        self
    }

    /// Sort by a key and direction
    pub fn sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_by = field;
        self.direction = direction;
        self
    }

    /// Set offset and limit
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Include data in summaries
    pub fn with_data(mut self) -> Self {
        self.include_data = true;
        self
    }

    /// Filters that are not resolved through the indexes
    pub(crate) fn matches(&self, entry: &Entry) -> bool {
        self.status.is_none_or(|status| entry.status == status)
            && self
                .effective_at
                .is_none_or(|at| entry.interval().contains(at))
    }

    /// Order entries by the configured key, ties broken by id ascending
    pub(crate) fn sort_entries(&self, entries: &mut [Entry]) {
        entries.sort_by(|a, b| {
            self.sort_by
                .compare(a, b, self.direction)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

/// Options for [`search`](crate::VersionedRegister::search)
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Status filter; every status when absent
    pub status: Option<EntryStatus>,

    /// Return at most this many hits
    pub limit: Option<usize>,

    /// Drop hits scoring below this
    pub min_score: Option<f64>,
}

/// Options for [`export`](crate::VersionedRegister::export)
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Include the retained audit log
    pub include_audit_log: bool,
}

/// Options for [`import`](crate::VersionedRegister::import)
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Skip items whose id already exists instead of reporting an error
    pub skip_existing: bool,

    /// Restore audit records carried by the payload
    pub include_audit_log: bool,
}

/// Head-version summary returned by listings and search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    /// Entry id
    pub id: EntryId,
    /// Head version
    pub version: u32,
    /// Status
    pub status: EntryStatus,
    /// Head metadata
    pub metadata: Metadata,
    /// Start of head validity
    pub effective_from: DateTime<Utc>,
    /// End of head validity
    pub effective_to: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// Head data, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Fields>,
}

impl EntrySummary {
    pub(crate) fn from_entry(entry: &Entry, include_data: bool) -> Self {
        Self {
            id: entry.id.clone(),
            version: entry.version,
            status: entry.status,
            metadata: entry.metadata.clone(),
            effective_from: entry.effective_from,
            effective_to: entry.effective_to,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            data: include_data.then(|| entry.data.clone()),
        }
    }

    /// Look up a data field by dotted path, when data was included
    pub fn field(&self, path: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| lookup(data, path))
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Items matching before pagination
    pub total: usize,
    /// Items skipped
    pub offset: usize,
    /// Page size used
    pub limit: usize,
}

impl<T> Page<T> {
    /// Whether more items follow this page
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }
}

/// A ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Matching entry, data included
    pub entry: EntrySummary,
    /// Sum of matching predicate weights
    pub score: f64,
    /// Fields that matched
    pub matched_fields: Vec<String>,
}

/// Entry counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterStats {
    /// All entries
    pub total: usize,
    /// Active entries
    pub active: usize,
    /// Archived entries
    pub archived: usize,
    /// Entries per category
    pub by_category: BTreeMap<String, usize>,
    /// Retained audit records
    pub audit_records: usize,
}
