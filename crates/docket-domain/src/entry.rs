//! Entry module - the versioned unit of storage

use crate::interval::EffectiveInterval;
use crate::metadata::Metadata;
use crate::value::Fields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, immutable identifier of an entry
///
/// Callers may supply their own identifiers. When they don't, the register
/// generates a UUIDv7 string, which sorts chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new UUIDv7-based identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_domain::EntryId;
    ///
    /// let id = EntryId::generate();
    /// assert_eq!(id.as_str().len(), 36);
    /// ```
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// In use
    #[default]
    Active,

    /// Retired; still retrievable
    Archived,
}

impl EntryStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Active => "active",
            EntryStatus::Archived => "archived",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(EntryStatus::Active),
            "archived" => Some(EntryStatus::Archived),
            _ => None,
        }
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid status: {}", s))
    }
}

/// A record as handed over by upstream extraction: data plus metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Structured fields
    pub data: Fields,

    /// Classification and provenance
    #[serde(default)]
    pub metadata: Metadata,
}

impl Record {
    /// Create a record with empty metadata
    pub fn new(data: Fields) -> Self {
        Self {
            data,
            metadata: Metadata::default(),
        }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Immutable snapshot of a superseded version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Version number this snapshot captured
    pub version: u32,

    /// Data as of that version
    pub data: Fields,

    /// Metadata as of that version
    #[serde(default)]
    pub metadata: Metadata,

    /// Start of validity
    pub effective_from: DateTime<Utc>,

    /// End of validity, closed when superseded
    pub effective_to: Option<DateTime<Utc>>,

    /// When the version was superseded
    pub archived_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Validity interval of the snapshot
    pub fn interval(&self) -> EffectiveInterval {
        EffectiveInterval::new(self.effective_from, self.effective_to)
    }
}

/// A versioned entry
///
/// `version` is always `history.len() + 1`; `history` holds versions
/// `1..version` in ascending order and is only ever appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Identifier
    pub id: EntryId,

    /// Head version number, starting at 1
    pub version: u32,

    /// Head data
    pub data: Fields,

    /// Head metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Lifecycle status
    #[serde(default)]
    pub status: EntryStatus,

    /// Start of head validity
    pub effective_from: DateTime<Utc>,

    /// End of head validity (`None` = open-ended)
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,

    /// Set by the register on creation
    pub created_at: DateTime<Utc>,

    /// Set by the register on every mutation
    pub updated_at: DateTime<Utc>,

    /// Set when the entry is archived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,

    /// Superseded versions, oldest first
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

impl Entry {
    /// Create version 1 of an entry
    pub fn new(
        id: EntryId,
        record: Record,
        interval: EffectiveInterval,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            version: 1,
            data: record.data,
            metadata: record.metadata,
            status: EntryStatus::Active,
            effective_from: interval.from,
            effective_to: interval.to,
            created_at: now,
            updated_at: now,
            archived_at: None,
            history: Vec::new(),
        }
    }

    /// Validity interval of the head version
    pub fn interval(&self) -> EffectiveInterval {
        EffectiveInterval::new(self.effective_from, self.effective_to)
    }

    /// Whether the entry is active
    pub fn is_active(&self) -> bool {
        self.status == EntryStatus::Active
    }

    /// Replace the head with a new version
    ///
    /// The previous head is appended to `history` with its interval closed
    /// at `superseded_at`. Data is replaced and metadata merged. Returns the
    /// previous version number.
    pub fn supersede(
        &mut self,
        record: Record,
        interval: EffectiveInterval,
        superseded_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> u32 {
        let previous = self.version;
        let old_data = std::mem::replace(&mut self.data, record.data);
        let old_metadata = self.metadata.clone();

        self.history.push(HistoryRecord {
            version: previous,
            data: old_data,
            metadata: old_metadata,
            effective_from: self.effective_from,
            effective_to: Some(superseded_at),
            archived_at: now,
        });

        self.metadata.merge(record.metadata);
        self.version = previous + 1;
        self.effective_from = interval.from;
        self.effective_to = interval.to;
        self.updated_at = now;
        previous
    }

    /// Mark the entry archived
    ///
    /// The version is unchanged. When `effective_to` is given the head
    /// interval is closed there.
    pub fn archive(&mut self, now: DateTime<Utc>, effective_to: Option<DateTime<Utc>>) {
        self.status = EntryStatus::Archived;
        self.archived_at = Some(now);
        self.updated_at = now;
        if effective_to.is_some() {
            self.effective_to = effective_to;
        }
    }

    /// Find a superseded version by number
    pub fn history_record(&self, version: u32) -> Option<&HistoryRecord> {
        self.history.iter().find(|h| h.version == version)
    }

    /// View of the head version
    pub fn current_view(&self) -> VersionView {
        VersionView {
            id: self.id.clone(),
            version: self.version,
            data: self.data.clone(),
            metadata: self.metadata.clone(),
            status: self.status,
            effective_from: self.effective_from,
            effective_to: self.effective_to,
            created_at: self.created_at,
            updated_at: self.updated_at,
            archived_at: self.archived_at,
            is_historic: false,
        }
    }

    /// View of a superseded version
    pub fn historic_view(&self, record: &HistoryRecord) -> VersionView {
        VersionView {
            id: self.id.clone(),
            version: record.version,
            data: record.data.clone(),
            metadata: record.metadata.clone(),
            status: self.status,
            effective_from: record.effective_from,
            effective_to: record.effective_to,
            created_at: self.created_at,
            updated_at: record.archived_at,
            archived_at: Some(record.archived_at),
            is_historic: true,
        }
    }

    /// View of any version, head or historic
    pub fn view_of(&self, version: u32) -> Option<VersionView> {
        if version == self.version {
            return Some(self.current_view());
        }
        self.history_record(version).map(|h| self.historic_view(h))
    }

    /// Views of every version in ascending version order
    pub fn all_versions(&self) -> Vec<VersionView> {
        let mut views: Vec<VersionView> =
            self.history.iter().map(|h| self.historic_view(h)).collect();
        views.push(self.current_view());
        views.sort_by_key(|v| v.version);
        views
    }
}

/// One version of an entry, re-shaped for reads
///
/// `is_historic` distinguishes superseded versions from the head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionView {
    /// Entry identifier
    pub id: EntryId,
    /// Version number
    pub version: u32,
    /// Data of that version
    pub data: Fields,
    /// Metadata of that version
    pub metadata: Metadata,
    /// Status of the entry
    pub status: EntryStatus,
    /// Start of validity
    pub effective_from: DateTime<Utc>,
    /// End of validity
    pub effective_to: Option<DateTime<Utc>>,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When this version last changed
    pub updated_at: DateTime<Utc>,
    /// When this version was superseded or the entry archived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    /// Whether this is a superseded version
    pub is_historic: bool,
}

impl VersionView {
    /// Validity interval of the version
    pub fn interval(&self) -> EffectiveInterval {
        EffectiveInterval::new(self.effective_from, self.effective_to)
    }
}
