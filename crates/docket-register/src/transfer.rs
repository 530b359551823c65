//! Export payloads and import decoding

use crate::error::ImportItemError;
use chrono::{DateTime, Utc};
use docket_domain::{AuditLogEntry, Entry, EntryId, EntryStatus, Fields, HistoryRecord, Metadata};
use serde::{Deserialize, Serialize};

/// Full-fidelity snapshot of a register
///
/// Entries carry their complete history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    /// Register name from config
    pub register_name: String,

    /// Schema identifier from config
    #[serde(default)]
    pub schema_id: Option<String>,

    /// When the snapshot was taken
    pub exported_at: DateTime<Utc>,

    /// Number of entries in `entries`
    pub total_entries: usize,

    /// Every stored entry, ordered by id
    pub entries: Vec<Entry>,

    /// Retained audit records, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<Vec<AuditLogEntry>>,
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Items written
    pub imported: usize,

    /// Items skipped because their id already existed
    pub skipped: usize,

    /// Items that could not be imported
    pub errors: Vec<ImportItemError>,

    /// Audit records that could not be decoded; `index` is the record's
    /// position in the payload's audit log
    pub audit_errors: Vec<ImportItemError>,
}

impl ImportReport {
    /// Whether every item was imported or skipped and every requested audit
    /// record restored
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.audit_errors.is_empty()
    }

    pub(crate) fn fail(&mut self, index: usize, id: Option<EntryId>, message: impl Into<String>) {
        let error = ImportItemError {
            index,
            id,
            message: message.into(),
        };
        tracing::warn!("{}", error);
        self.errors.push(error);
    }
}

/// Accepted import shapes: a wrapped payload or a bare entry array
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Wrapped {
        entries: Vec<serde_json::Value>,
        #[serde(default, rename = "auditLog")]
        audit_log: Option<Vec<serde_json::Value>>,
    },
    Bare(Vec<serde_json::Value>),
}

/// Split an import payload into raw items and raw audit records
pub(crate) fn split_payload(
    payload: serde_json::Value,
) -> Result<(Vec<serde_json::Value>, Vec<serde_json::Value>), String> {
    match serde_json::from_value(payload) {
        Ok(Payload::Wrapped { entries, audit_log }) => Ok((entries, audit_log.unwrap_or_default())),
        Ok(Payload::Bare(entries)) => Ok((entries, Vec::new())),
        Err(_) => Err(
            "expected an object with an `entries` array or a bare array of entries".to_string(),
        ),
    }
}

/// Decode raw audit records, reporting the ones that do not parse
pub(crate) fn decode_audit(
    raw: Vec<serde_json::Value>,
    report: &mut ImportReport,
) -> Vec<AuditLogEntry> {
    let mut records = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                let error = ImportItemError {
                    index,
                    id: None,
                    message: format!("audit record: {}", e),
                };
                tracing::warn!("{}", error);
                report.audit_errors.push(error);
            }
        }
    }
    records
}

/// An entry-shaped import item
///
/// Only `data` is required. Everything else a full export carries is
/// restored verbatim when present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImportItem {
    #[serde(default)]
    pub(crate) id: Option<EntryId>,
    #[serde(default)]
    version: Option<u32>,
    data: Fields,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    status: Option<EntryStatus>,
    #[serde(default)]
    effective_from: Option<DateTime<Utc>>,
    #[serde(default)]
    effective_to: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    history: Vec<HistoryRecord>,
}

impl ImportItem {
    /// Build the entry to store, checking version bookkeeping
    pub(crate) fn into_entry(self, id: EntryId, now: DateTime<Utc>) -> Result<Entry, String> {
        for (position, record) in self.history.iter().enumerate() {
            let expected = position as u32 + 1;
            if record.version != expected {
                return Err(format!(
                    "history record {} has version {}, expected {}",
                    position, record.version, expected
                ));
            }
        }

        let head = self.history.len() as u32 + 1;
        let version = self.version.unwrap_or(head);
        if version != head {
            return Err(format!(
                "version {} does not follow {} history records",
                version,
                self.history.len()
            ));
        }

        if let (Some(from), Some(to)) = (self.effective_from, self.effective_to) {
            if to < from {
                return Err(format!("effectiveTo {} precedes effectiveFrom {}", to, from));
            }
        }

        let created_at = self.created_at.unwrap_or(now);
        let updated_at = self.updated_at.unwrap_or(created_at);
        let status = self.status.unwrap_or_default();
        let archived_at = match status {
            EntryStatus::Archived => Some(self.archived_at.unwrap_or(updated_at)),
            EntryStatus::Active => self.archived_at,
        };

        Ok(Entry {
            id,
            version,
            data: self.data,
            metadata: self.metadata,
            status,
            effective_from: self.effective_from.unwrap_or(created_at),
            effective_to: self.effective_to,
            created_at,
            updated_at,
            archived_at,
            history: self.history,
        })
    }
}
