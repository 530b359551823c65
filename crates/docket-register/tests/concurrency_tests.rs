//! Concurrency and version-sequence tests for docket-register

use docket_domain::value::fields_from_json;
use docket_domain::{EntryId, Record};
use docket_register::{AddOptions, RegisterConfig, UpdateOptions, VersionedRegister};
use docket_store::MemoryStore;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn record(n: u64) -> Record {
    Record::new(fields_from_json(json!({ "n": n })).unwrap())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("docket_register=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_lose_nothing() {
    init_tracing();
    let register = Arc::new(
        VersionedRegister::open(MemoryStore::new(), RegisterConfig::default())
            .await
            .unwrap(),
    );
    let id = register
        .add(record(0), AddOptions::with_id("shared"))
        .await
        .unwrap()
        .id;

    let updates = 50;
    let handles: Vec<_> = (1..=updates)
        .map(|n| {
            let register = Arc::clone(&register);
            let id = id.clone();
            tokio::spawn(async move {
                register
                    .update(&id, record(n), UpdateOptions::default())
                    .await
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let entry = register.entry(&id).await.unwrap();
    assert_eq!(entry.version, updates as u32 + 1);
    assert_eq!(entry.history.len(), updates as usize);
    let versions: Vec<u32> = entry.history.iter().map(|h| h.version).collect();
    assert_eq!(versions, (1..=updates as u32).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_with_same_id() {
    let register = Arc::new(
        VersionedRegister::open(MemoryStore::new(), RegisterConfig::default())
            .await
            .unwrap(),
    );

    let handles: Vec<_> = (0..10)
        .map(|n| {
            let register = Arc::clone(&register);
            tokio::spawn(async move { register.add(record(n), AddOptions::with_id("race")).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(register.store().len(), 1);
}

#[tokio::test]
async fn test_update_batch_on_one_id() {
    let register = VersionedRegister::open(MemoryStore::new(), RegisterConfig::default())
        .await
        .unwrap();
    let id = register.add(record(0), AddOptions::default()).await.unwrap().id;

    let items = (1..=20)
        .map(|n| (id.clone(), record(n), UpdateOptions::default()))
        .collect();
    let results = register.update_batch(items).await;
    assert!(results.iter().all(Result::is_ok));

    let entry = register.entry(&id).await.unwrap();
    assert_eq!(entry.version, 21);
}

proptest! {
    #[test]
    fn prop_versions_increase_by_one(updates in 0usize..15) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let register = VersionedRegister::open(MemoryStore::new(), RegisterConfig::default())
                .await
                .unwrap();
            let id: EntryId = register.add(record(0), AddOptions::default()).await.unwrap().id;

            let mut last = 1;
            for n in 0..updates {
                let entry = register
                    .update(&id, record(n as u64 + 1), UpdateOptions::default())
                    .await
                    .unwrap();
                prop_assert_eq!(entry.version, last + 1);
                prop_assert_eq!(entry.history.len(), entry.version as usize - 1);
                last = entry.version;
            }
            prop_assert_eq!(last as usize, updates + 1);
            Ok(())
        })?;
    }
}
