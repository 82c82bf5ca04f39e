//! Integration tests for the in-memory document store.

use futures::StreamExt;
use livetodo_core::environment::Clock;
use livetodo_core::snapshot::{OrderKey, Snapshot, SnapshotOrder, SortDirection};
use livetodo_core::store::{DocumentStore, SnapshotStream, StoreError};
use livetodo_core::todo::{TodoDraft, TodoId, TodoPatch};
use livetodo_memory::MemoryStore;
use livetodo_testing::{FixedClock, SequentialIds, SteppingClock, test_clock};
use std::sync::Arc;
use std::time::Duration;

fn deterministic_store() -> MemoryStore {
    MemoryStore::with_environment(
        Arc::new(SteppingClock::seconds_from_test_epoch()),
        Arc::new(SequentialIds::new("todo")),
    )
}

async fn next_snapshot(stream: &mut SnapshotStream) -> Snapshot {
    tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
}

/// Skip forward to the first snapshot matching the predicate.
///
/// The watch channel coalesces revisions, so a subscriber may observe an
/// intermediate (or duplicate) snapshot before the one it waits for.
async fn snapshot_matching(
    stream: &mut SnapshotStream,
    pred: impl Fn(&Snapshot) -> bool,
) -> Snapshot {
    loop {
        let snapshot = next_snapshot(stream).await;
        if pred(&snapshot) {
            return snapshot;
        }
    }
}

#[tokio::test]
async fn first_snapshot_arrives_promptly_even_when_empty() {
    let store = deterministic_store();
    let mut stream = store.watch(SnapshotOrder::default()).await.unwrap();

    let snapshot = next_snapshot(&mut stream).await;
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn create_appears_in_next_snapshot() {
    let store = deterministic_store();
    let mut stream = store.watch(SnapshotOrder::default()).await.unwrap();
    next_snapshot(&mut stream).await;

    let id = store.create(TodoDraft::new("Buy milk")).await.unwrap();

    let snapshot = snapshot_matching(&mut stream, |s| s.len() == 1).await;
    let doc = &snapshot.docs()[0];
    assert_eq!(doc.id, id);
    assert_eq!(doc.title, "Buy milk");
    assert!(!doc.completed);
}

#[tokio::test]
async fn snapshots_are_ordered_newest_first() {
    let store = deterministic_store();

    store.create(TodoDraft::new("first")).await.unwrap();
    store.create(TodoDraft::new("second")).await.unwrap();
    store.create(TodoDraft::new("third")).await.unwrap();

    let mut stream = store.watch(SnapshotOrder::created_at_desc()).await.unwrap();
    let snapshot = next_snapshot(&mut stream).await;

    let titles: Vec<_> = snapshot.docs().iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["third", "second", "first"]);
}

#[tokio::test]
async fn ascending_order_is_honored() {
    let store = deterministic_store();

    store.create(TodoDraft::new("first")).await.unwrap();
    store.create(TodoDraft::new("second")).await.unwrap();

    let order = SnapshotOrder::new(OrderKey::CreatedAt, SortDirection::Ascending);
    let mut stream = store.watch(order).await.unwrap();
    let snapshot = next_snapshot(&mut stream).await;

    let titles: Vec<_> = snapshot.docs().iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["first", "second"]);
}

#[tokio::test]
async fn equal_timestamps_fall_back_to_insertion_order() {
    // A fixed clock gives every document the same created_at.
    let store = MemoryStore::with_environment(
        Arc::new(FixedClock::new(test_clock().now())),
        Arc::new(SequentialIds::new("todo")),
    );

    store.create(TodoDraft::new("first")).await.unwrap();
    store.create(TodoDraft::new("second")).await.unwrap();
    store.create(TodoDraft::new("third")).await.unwrap();

    let mut stream = store.watch(SnapshotOrder::created_at_desc()).await.unwrap();
    let snapshot = next_snapshot(&mut stream).await;

    let titles: Vec<_> = snapshot.docs().iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["first", "second", "third"]);
}

#[tokio::test]
async fn patch_touches_only_named_fields() {
    let store = deterministic_store();
    let id = store.create(TodoDraft::new("Buy milk")).await.unwrap();

    store.patch(&id, TodoPatch::completed(true)).await.unwrap();

    let mut stream = store.watch(SnapshotOrder::default()).await.unwrap();
    let snapshot = next_snapshot(&mut stream).await;
    let doc = &snapshot.docs()[0];
    assert!(doc.completed);
    assert_eq!(doc.title, "Buy milk");

    store.patch(&id, TodoPatch::title("Buy oat milk")).await.unwrap();

    let snapshot = snapshot_matching(&mut stream, |s| s.docs()[0].title == "Buy oat milk").await;
    // The earlier completion flag survives a title-only patch.
    assert!(snapshot.docs()[0].completed);
}

#[tokio::test]
async fn patch_of_unknown_id_is_not_found() {
    let store = deterministic_store();

    let result = store
        .patch(&TodoId::new("missing"), TodoPatch::completed(true))
        .await;

    assert!(matches!(result, Err(StoreError::NotFound(id)) if id.as_str() == "missing"));
}

#[tokio::test]
async fn remove_drops_only_the_addressed_document() {
    let store = deterministic_store();
    store.create(TodoDraft::new("first")).await.unwrap();
    let second = store.create(TodoDraft::new("second")).await.unwrap();
    store.create(TodoDraft::new("third")).await.unwrap();

    store.remove(&second).await.unwrap();

    let mut stream = store.watch(SnapshotOrder::default()).await.unwrap();
    let snapshot = next_snapshot(&mut stream).await;
    let titles: Vec<_> = snapshot.docs().iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["third", "first"]);
}

#[tokio::test]
async fn remove_of_unknown_id_is_silent() {
    let store = deterministic_store();
    store.create(TodoDraft::new("kept")).await.unwrap();

    store.remove(&TodoId::new("missing")).await.unwrap();

    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn every_subscriber_sees_every_change() {
    let store = deterministic_store();
    let mut first = store.watch(SnapshotOrder::default()).await.unwrap();
    let mut second = store.watch(SnapshotOrder::default()).await.unwrap();

    next_snapshot(&mut first).await;
    next_snapshot(&mut second).await;

    store.create(TodoDraft::new("shared")).await.unwrap();

    let a = snapshot_matching(&mut first, |s| s.len() == 1).await;
    let b = snapshot_matching(&mut second, |s| s.len() == 1).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn stream_ends_when_every_store_handle_is_dropped() {
    let store = deterministic_store();
    let mut stream = store.watch(SnapshotOrder::default()).await.unwrap();
    next_snapshot(&mut stream).await;

    drop(store);

    let end = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap();
    assert!(end.is_none());
}
