//! Integration tests for docket-compare
//!
//! Compare records as they come out of a register.

use chrono::{DateTime, TimeZone, Utc};
use docket_compare::{
    ChangeDetail, ChangeKind, Comparator, ComparatorConfig, ConflictOptions, Document,
    OverlapOptions,
};
use docket_domain::value::fields_from_json;
use docket_domain::{EntryId, Record};
use docket_register::{AddOptions, GetOptions, RegisterConfig, UpdateOptions, VersionedRegister};
use docket_store::MemoryStore;
use serde_json::json;

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn record(data: serde_json::Value) -> Record {
    Record::new(fields_from_json(data).unwrap())
}

async fn register() -> VersionedRegister<MemoryStore> {
    VersionedRegister::open(MemoryStore::new(), RegisterConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_timeline_of_register_entry() {
    let register = register().await;
    let entry = register
        .add(
            record(json!({ "amount": 100, "vendor": "ACME" })),
            AddOptions::default().effective_from(day(2024, 1, 1)),
        )
        .await
        .unwrap();
    register
        .update(
            &entry.id,
            record(json!({ "amount": 150, "vendor": "ACME" })),
            UpdateOptions::effective_from(day(2024, 6, 1)),
        )
        .await
        .unwrap();

    let entry = register.entry(&entry.id).await.unwrap();
    let timeline = Comparator::default().compare_versions(&entry);

    assert_eq!(timeline.steps.len(), 1);
    let comparison = &timeline.steps[0].comparison;
    assert_eq!(comparison.differences.len(), 1);
    let diff = &comparison.differences[0];
    assert_eq!(diff.field, "amount");
    assert_eq!(diff.kind, ChangeKind::NumericChange);
    assert!(matches!(diff.detail, ChangeDetail::Numeric { delta, .. } if delta == 50.0));
    assert_eq!(timeline.most_changed[0].field, "amount");
}

#[tokio::test]
async fn test_versions_of_one_entry_do_not_conflict() {
    let register = register().await;
    let entry = register
        .add(
            record(json!({ "rate": 1 })),
            AddOptions::default().effective_from(day(2024, 1, 1)),
        )
        .await
        .unwrap();
    register
        .update(
            &entry.id,
            record(json!({ "rate": 2 })),
            UpdateOptions::effective_from(day(2024, 6, 1)),
        )
        .await
        .unwrap();

    let entry = register.entry(&entry.id).await.unwrap();
    let documents: Vec<Document> = entry.all_versions().into_iter().map(Document::from).collect();
    let conflicts = Comparator::default().find_conflicts(&documents, &ConflictOptions::default());
    assert!(conflicts.is_empty());
}

#[tokio::test]
async fn test_conflicting_sources_in_register() {
    let register = register().await;
    for (id, amount) in [("scan", 100), ("email", 120)] {
        register
            .add(
                record(json!({ "invoice": "INV-9", "amount": amount })),
                AddOptions::with_id(id).effective_from(day(2024, 3, 1)),
            )
            .await
            .unwrap();
    }

    let mut documents = Vec::new();
    for id in ["scan", "email"] {
        let view = register
            .get(&EntryId::from(id), GetOptions::as_of(day(2024, 4, 1)))
            .await
            .unwrap()
            .unwrap();
        documents.push(Document::from(view));
    }

    let comparator = Comparator::new(ComparatorConfig::default());
    let conflicts = comparator.find_conflicts(&documents, &ConflictOptions::default());
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].field, "amount");
    assert_eq!(conflicts[0].document_ids.len(), 2);

    let overlaps = comparator.find_overlaps(&documents, &OverlapOptions::key_fields(["invoice"]));
    assert_eq!(overlaps.duplicate_groups.len(), 1);
    assert!(overlaps.similar_pairs.is_empty());

    let comparison = comparator.compare_documents(&documents[0], &documents[1]);
    assert!(!comparison.identical);
    assert_eq!(comparison.statistics.modified, 1);
    assert_eq!(comparison.statistics.change_percentage, 0.5);
}
