//! As-of resolution over an entry's versions

use chrono::{DateTime, Utc};
use docket_domain::{Entry, VersionView};

/// Finds the version of an entry in force at a point in time
///
/// The scan is linear in the version count; per-entry version counts are
/// small, so no interval index is kept.
pub struct TemporalResolver;

impl TemporalResolver {
    /// Resolve `entry` as of `as_of`
    ///
    /// 1. The head, if its interval contains `as_of`
    /// 2. Otherwise the most recently appended history record containing it
    /// 3. Otherwise `None`: the entry did not exist (or was not in force) then
    pub fn resolve(entry: &Entry, as_of: DateTime<Utc>) -> Option<VersionView> {
        if entry.interval().contains(as_of) {
            return Some(entry.current_view());
        }
        entry
            .history
            .iter()
            .rev()
            .find(|record| record.interval().contains(as_of))
            .map(|record| entry.historic_view(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use docket_domain::value::fields_from_json;
    use docket_domain::{EffectiveInterval, EntryId, Record, Value};
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn record(amount: i64) -> Record {
        Record::new(fields_from_json(json!({ "amount": amount })).unwrap())
    }

    fn amount(view: &VersionView) -> &Value {
        view.data.get("amount").unwrap()
    }

    fn entry_with_two_versions() -> Entry {
        let mut entry = Entry::new(
            EntryId::from("doc"),
            record(100),
            EffectiveInterval::open(day(2024, 1, 1)),
            day(2024, 1, 1),
        );
        entry.supersede(
            record(150),
            EffectiveInterval::open(day(2024, 6, 1)),
            day(2024, 6, 1),
            day(2024, 6, 1),
        );
        entry
    }

    #[test]
    fn test_resolves_head() {
        let entry = entry_with_two_versions();
        let view = TemporalResolver::resolve(&entry, day(2024, 7, 1)).unwrap();
        assert_eq!(amount(&view), &Value::from(150));
        assert!(!view.is_historic);
    }

    #[test]
    fn test_resolves_history() {
        let entry = entry_with_two_versions();
        let view = TemporalResolver::resolve(&entry, day(2024, 3, 1)).unwrap();
        assert_eq!(amount(&view), &Value::from(100));
        assert!(view.is_historic);
        assert_eq!(view.version, 1);
    }

    #[test]
    fn test_boundary_belongs_to_later_version() {
        let entry = entry_with_two_versions();
        let view = TemporalResolver::resolve(&entry, day(2024, 6, 1)).unwrap();
        assert_eq!(view.version, 2);
    }

    #[test]
    fn test_before_creation_is_none() {
        let entry = entry_with_two_versions();
        assert!(TemporalResolver::resolve(&entry, day(2023, 12, 31)).is_none());
    }

    #[test]
    fn test_after_closed_head_is_none() {
        let mut entry = entry_with_two_versions();
        entry.archive(day(2024, 9, 1), Some(day(2024, 9, 1)));
        assert!(TemporalResolver::resolve(&entry, day(2024, 10, 1)).is_none());
        assert!(TemporalResolver::resolve(&entry, day(2024, 8, 1)).is_some());
    }

    #[test]
    fn test_overlapping_history_prefers_latest_appended() {
        // Retroactive correction: version 2 re-covers version 1's range
        let mut entry = Entry::new(
            EntryId::from("doc"),
            record(1),
            EffectiveInterval::open(day(2024, 1, 1)),
            day(2024, 1, 1),
        );
        entry.supersede(
            record(2),
            EffectiveInterval::open(day(2024, 1, 1)),
            day(2024, 12, 31),
            day(2024, 2, 1),
        );
        entry.supersede(
            record(3),
            EffectiveInterval::open(day(2025, 1, 1)),
            day(2024, 12, 31),
            day(2024, 3, 1),
        );

        let view = TemporalResolver::resolve(&entry, day(2024, 5, 1)).unwrap();
        assert_eq!(view.version, 2);
    }
}
