//! Append-only audit log of register mutations

use chrono::{DateTime, Utc};
use docket_domain::{AuditAction, AuditLogEntry, EntryId};
use std::collections::VecDeque;

/// Filter for audit log queries
///
/// All set criteria must match. The time range is half-open:
/// `since <= timestamp < until`.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Only records for this entry
    pub document_id: Option<EntryId>,

    /// Only records of this action
    pub action: Option<AuditAction>,

    /// Only records at or after this time
    pub since: Option<DateTime<Utc>>,

    /// Only records before this time
    pub until: Option<DateTime<Utc>>,

    /// Return at most this many records (oldest first)
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Match every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one entry
    pub fn for_document(id: impl Into<EntryId>) -> Self {
        Self {
            document_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Restrict to one action
    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Restrict to `[since, until)`
    pub fn between(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    fn matches(&self, record: &AuditLogEntry) -> bool {
        self.document_id.as_ref().is_none_or(|id| &record.document_id == id)
            && self.action.is_none_or(|action| record.action == action)
            && self.since.is_none_or(|since| record.timestamp >= since)
            && self.until.is_none_or(|until| record.timestamp < until)
    }
}

/// Insertion-ordered record of register mutations
///
/// With a capacity set, the oldest records are dropped once the log is full.
/// That trimming is lossy; `dropped()` reports how many records are gone.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: VecDeque<AuditLogEntry>,
    capacity: Option<usize>,
    dropped: usize,
}

impl AuditLog {
    /// Create a log, bounded when `capacity` is set
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Append a record
    pub fn record(&mut self, record: AuditLogEntry) {
        self.records.push_back(record);
        self.trim();
    }

    /// Append many records in order
    pub fn extend<I: IntoIterator<Item = AuditLogEntry>>(&mut self, records: I) {
        self.records.extend(records);
        self.trim();
    }

    fn trim(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        let excess = self.records.len().saturating_sub(capacity);
        if excess > 0 {
            self.records.drain(..excess);
            self.dropped += excess;
            tracing::warn!("Audit log trimmed {} records (capacity {})", excess, capacity);
        }
    }

    /// Records matching the query, oldest first
    pub fn query(&self, query: &AuditQuery) -> Vec<AuditLogEntry> {
        let matching = self.records.iter().filter(|r| query.matches(r)).cloned();
        match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    /// Every retained record, oldest first
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.records.iter().cloned().collect()
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records discarded by trimming
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn record(day: u32, action: AuditAction, id: &str) -> AuditLogEntry {
        AuditLogEntry::new(at(day), action, EntryId::from(id), json!({}))
    }

    fn sample_log() -> AuditLog {
        let mut log = AuditLog::new(None);
        log.record(record(1, AuditAction::Add, "a"));
        log.record(record(2, AuditAction::Add, "b"));
        log.record(record(3, AuditAction::Update, "a"));
        log.record(record(4, AuditAction::Archive, "a"));
        log
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_trimming_warns() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut log = AuditLog::new(Some(1));
            log.record(record(1, AuditAction::Add, "a"));
            log.record(record(2, AuditAction::Add, "b"));
        });

        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Audit log trimmed 1 records"));
    }

    #[test]
    fn test_query_by_document() {
        let log = sample_log();
        let records = log.query(&AuditQuery::for_document("a"));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.document_id.as_str() == "a"));
    }

    #[test]
    fn test_query_by_action() {
        let log = sample_log();
        let records = log.query(&AuditQuery::all().with_action(AuditAction::Add));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_query_time_range_is_half_open() {
        let log = sample_log();
        let records = log.query(&AuditQuery::all().between(at(2), at(4)));
        let days: Vec<_> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(days, vec![at(2), at(3)]);
    }

    #[test]
    fn test_query_limit_keeps_oldest() {
        let log = sample_log();
        let query = AuditQuery {
            limit: Some(2),
            ..AuditQuery::default()
        };
        let records = log.query(&query);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, at(1));
    }

    #[test]
    fn test_bounded_log_drops_oldest() {
        let mut log = AuditLog::new(Some(2));
        log.record(record(1, AuditAction::Add, "a"));
        log.record(record(2, AuditAction::Add, "b"));
        log.record(record(3, AuditAction::Add, "c"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 1);
        assert_eq!(log.entries()[0].document_id.as_str(), "b");
    }

    #[test]
    fn test_extend_respects_capacity() {
        let mut log = AuditLog::new(Some(3));
        log.extend((1..=5).map(|d| record(d, AuditAction::Add, "x")));
        assert_eq!(log.len(), 3);
        assert_eq!(log.dropped(), 2);
        assert_eq!(log.entries()[0].timestamp, at(3));
    }
}
