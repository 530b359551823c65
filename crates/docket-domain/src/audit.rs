//! Audit records of register mutations

use crate::entry::EntryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of mutation recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    /// Entry created (including restores by import)
    Add,
    /// New version written
    Update,
    /// Entry archived
    Archive,
}

impl AuditAction {
    /// Get the action name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Add => "ADD",
            AuditAction::Update => "UPDATE",
            AuditAction::Archive => "ARCHIVE",
        }
    }
}

/// A single write-once audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// When the mutation happened
    pub timestamp: DateTime<Utc>,

    /// What happened
    pub action: AuditAction,

    /// Which entry it happened to
    pub document_id: EntryId,

    /// Action-specific details (versions, reasons)
    #[serde(default)]
    pub details: serde_json::Value,
}

impl AuditLogEntry {
    /// Create a new audit record
    pub fn new(
        timestamp: DateTime<Utc>,
        action: AuditAction,
        document_id: EntryId,
        details: serde_json::Value,
    ) -> Self {
        Self {
            timestamp,
            action,
            document_id,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_serializes_uppercase() {
        let entry = AuditLogEntry::new(
            Utc::now(),
            AuditAction::Update,
            EntryId::from("doc-1"),
            json!({"previousVersion": 1, "newVersion": 2}),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "UPDATE");
        assert_eq!(json["documentId"], "doc-1");
        assert_eq!(AuditAction::Archive.as_str(), "ARCHIVE");
    }
}
