//! Integration tests for sharing one in-memory store between handles and tasks.

use snapshot_store::{EntityId, InMemorySnapshotStore, SnapshotStore, SnapshotStoreExt};

#[tokio::test]
async fn clones_share_records() {
    let store = InMemorySnapshotStore::new();
    let other = store.clone();

    let id = store.next_id("Order").await.unwrap();
    store
        .put("Order", id, serde_json::json!({"number": "1"}))
        .await
        .unwrap();

    assert!(other.exists("Order", id).await.unwrap());
    assert_eq!(other.next_id("Order").await.unwrap(), EntityId::new(2));
}

#[tokio::test]
async fn concurrent_allocation_never_repeats_ids() {
    let store = InMemorySnapshotStore::new();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.next_id("Order").await.unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().get());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(ids.first(), Some(&1));
    assert_eq!(ids.last(), Some(&16));
}

#[tokio::test]
async fn last_write_wins() {
    let store = InMemorySnapshotStore::new();
    let id = EntityId::new(1);

    store
        .put("Order", id, serde_json::json!({"status": "pending"}))
        .await
        .unwrap();
    store
        .put("Order", id, serde_json::json!({"status": "completed"}))
        .await
        .unwrap();

    let snapshot = store.get("Order", id).await.unwrap().unwrap();
    assert_eq!(snapshot.revision, 2);
    assert_eq!(snapshot.state["status"], "completed");

    store.clear().await;
    assert_eq!(store.record_count().await, 0);
}
