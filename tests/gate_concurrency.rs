//! Concurrent submissions through a shared gate.

use cowrite::gate::{ChangeGate, GateConfig, SystemClock};
use cowrite::store::DocumentStore;
use cowrite::{ActorId, DocumentId, InMemoryStore, Operation};
use std::sync::Arc;

const WRITERS: u64 = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_all_land() {
    let config = GateConfig {
        // Every lost race means another writer committed.
        max_commit_retries: WRITERS as u32,
        ..Default::default()
    };
    let gate = Arc::new(ChangeGate::with_config(InMemoryStore::new(), SystemClock, config));
    let id = DocumentId::new();
    gate.create_document(id, "base", &ActorId::new("owner")).await.unwrap();

    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            let letter = char::from(b'a' + writer as u8).to_string();
            let actor = ActorId::new(format!("writer-{writer}"));
            gate.apply_changes(id, 1, vec![Operation::insert(letter), Operation::retain(4)], &actor)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let doc = gate.get_document(id).await.unwrap();
    assert_eq!(doc.version, 1 + WRITERS);
    assert!(doc.content.ends_with("base"));
    assert_eq!(doc.content.chars().count(), 4 + WRITERS as usize);
    for writer in 0..WRITERS {
        let letter = char::from(b'a' + writer as u8);
        assert!(doc.content.contains(letter), "missing {letter} in {}", doc.content);
    }

    let records = gate.store().records_since(id, 0).await.unwrap();
    let versions: Vec<(u64, u64)> = records.iter().map(|r| (r.from_version, r.to_version)).collect();
    let expected: Vec<(u64, u64)> = (0..=WRITERS).map(|v| (v, v + 1)).collect();
    assert_eq!(versions, expected);

    // Replaying the log from empty reproduces the stored content.
    let replayed = records
        .iter()
        .try_fold(String::new(), |content, record| record.operations.apply(&content))
        .unwrap();
    assert_eq!(replayed, doc.content);
}

#[tokio::test]
async fn test_rebase_across_several_versions() {
    let gate = ChangeGate::new(InMemoryStore::new(), SystemClock);
    let id = DocumentId::new();
    let alice = ActorId::new("alice");
    gate.create_document(id, "The fox", &alice).await.unwrap();

    gate.apply_changes(id, 1, vec![Operation::retain(4), Operation::insert("quick "), Operation::retain(3)], &alice)
        .await
        .unwrap();
    gate.apply_changes(id, 2, vec![Operation::retain(13), Operation::insert(" jumps")], &alice)
        .await
        .unwrap();

    // Built against version 1: "The fox" -> "The red fox".
    let bob = ActorId::new("bob");
    let applied = gate
        .apply_changes(id, 1, vec![Operation::retain(4), Operation::insert("red "), Operation::retain(3)], &bob)
        .await
        .unwrap();
    assert_eq!(applied.new_version, 4);
    assert_eq!(applied.content, "The red quick fox jumps");

    let page = gate.get_history(id, None, Some(1)).await.unwrap();
    assert_eq!(page.records[0].actor, bob);
}
