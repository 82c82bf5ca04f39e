//! Integration tests for `TodoFeed` against the in-memory store.
//!
//! These tests exercise the full mirror loop: mutation → store write →
//! snapshot → state replacement, plus the failure and teardown paths.

use livetodo_core::store::DocumentStore;
use livetodo_core::todo::{TodoDraft, TodoId};
use livetodo_memory::MemoryStore;
use livetodo_runtime::{ListState, MutationKind, TodoFeed};
use livetodo_testing::{SequentialIds, SteppingClock, UnreliableStore, wait_for};
use std::sync::Arc;
use std::time::Duration;

/// Store with deterministic ids (`todo-1`, `todo-2`, ...) and strictly
/// increasing creation timestamps.
fn deterministic_store() -> MemoryStore {
    MemoryStore::with_environment(
        Arc::new(SteppingClock::seconds_from_test_epoch()),
        Arc::new(SequentialIds::new("todo")),
    )
}

async fn ready(rx: &mut tokio::sync::watch::Receiver<ListState>) -> ListState {
    wait_for(rx, |s: &ListState| !s.loading).await
}

#[tokio::test]
async fn empty_collection_finishes_loading_empty() {
    let feed = TodoFeed::connect(Arc::new(deterministic_store()));
    let mut rx = feed.watch_state();

    assert!(feed.state().loading);

    let state = ready(&mut rx).await;
    assert!(state.items.is_empty());
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn add_toggle_delete_round_trip() {
    let feed = TodoFeed::connect(Arc::new(deterministic_store()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    // Add: exactly one new item, incomplete, with the returned id.
    let id = feed.add("Buy milk").await.unwrap();
    let state = wait_for(&mut rx, |s: &ListState| s.count() == 1).await;
    let item = state.get(&id).unwrap();
    assert_eq!(item.title, "Buy milk");
    assert!(!item.completed);

    // Toggle: flips exactly that item.
    feed.toggle(&id).await.unwrap();
    let state = wait_for(&mut rx, |s: &ListState| {
        s.get(&id).is_some_and(|t| t.completed)
    })
    .await;
    assert_eq!(state.completed_count(), 1);

    // Delete: the collection is empty again.
    feed.delete(&id).await.unwrap();
    let state = wait_for(&mut rx, |s: &ListState| s.count() == 0).await;
    assert!(state.items.is_empty());
}

#[tokio::test]
async fn items_are_ordered_newest_first() {
    let feed = TodoFeed::connect(Arc::new(deterministic_store()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    feed.add("first").await.unwrap();
    feed.add("second").await.unwrap();
    feed.add("third").await.unwrap();

    let state = wait_for(&mut rx, |s: &ListState| s.count() == 3).await;
    let titles: Vec<_> = state.items.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["third", "second", "first"]);

    for window in state.items.windows(2) {
        assert!(window[0].created_at >= window[1].created_at);
    }
}

#[tokio::test]
async fn delete_preserves_relative_order_of_the_rest() {
    let feed = TodoFeed::connect(Arc::new(deterministic_store()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    feed.add("first").await.unwrap();
    let middle = feed.add("second").await.unwrap();
    feed.add("third").await.unwrap();
    wait_for(&mut rx, |s: &ListState| s.count() == 3).await;

    feed.delete(&middle).await.unwrap();

    let state = wait_for(&mut rx, |s: &ListState| s.count() == 2).await;
    let titles: Vec<_> = state.items.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["third", "first"]);
}

#[tokio::test]
async fn toggle_leaves_other_items_untouched() {
    let feed = TodoFeed::connect(Arc::new(deterministic_store()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    let first = feed.add("first").await.unwrap();
    let second = feed.add("second").await.unwrap();
    wait_for(&mut rx, |s: &ListState| s.count() == 2).await;

    feed.toggle(&second).await.unwrap();

    let state = wait_for(&mut rx, |s: &ListState| {
        s.get(&second).is_some_and(|t| t.completed)
    })
    .await;
    let untouched = state.get(&first).unwrap();
    assert!(!untouched.completed);
    assert_eq!(untouched.title, "first");
}

#[tokio::test]
async fn rename_replaces_the_title() {
    let feed = TodoFeed::connect(Arc::new(deterministic_store()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    let id = feed.add("Buy milk").await.unwrap();
    wait_for(&mut rx, |s: &ListState| s.count() == 1).await;

    feed.rename(&id, "Buy oat milk").await.unwrap();

    let state = wait_for(&mut rx, |s: &ListState| {
        s.get(&id).is_some_and(|t| t.title == "Buy oat milk")
    })
    .await;
    assert!(!state.get(&id).unwrap().completed);
}

#[tokio::test]
async fn toggle_of_unknown_id_is_a_silent_noop() {
    let feed = TodoFeed::connect(Arc::new(deterministic_store()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    let result = feed.toggle(&TodoId::new("missing")).await;

    assert!(result.is_ok());
    let state = feed.state();
    assert_eq!(state.error, None);
    assert_eq!(state.count(), 0);
}

#[tokio::test]
async fn failed_subscription_reports_fixed_message() {
    let store = UnreliableStore::wrapping(Arc::new(deterministic_store()));
    store.fail_subscriptions(true);

    let feed = TodoFeed::connect(Arc::new(store));
    let mut rx = feed.watch_state();

    let state = ready(&mut rx).await;
    assert_eq!(state.error.as_deref(), Some("Failed to load todos"));
    assert!(state.items.is_empty());
}

#[tokio::test]
async fn stream_error_before_first_snapshot_reports_fixed_message() {
    let store = UnreliableStore::wrapping(Arc::new(deterministic_store()));
    store.fail_streams(true);

    let feed = TodoFeed::connect(Arc::new(store));
    let mut rx = feed.watch_state();

    let state = ready(&mut rx).await;
    assert_eq!(state.error.as_deref(), Some("Failed to load todos"));
    assert!(state.items.is_empty());
}

#[tokio::test]
async fn failed_add_records_message_and_rethrows() {
    let store = UnreliableStore::wrapping(Arc::new(deterministic_store()));
    let feed = TodoFeed::connect(Arc::new(store.clone()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    store.fail_writes(true);

    let error = feed.add("doomed").await.unwrap_err();
    assert_eq!(error.operation, MutationKind::Add);

    let state = wait_for(&mut rx, |s: &ListState| s.error.is_some()).await;
    assert_eq!(state.error.as_deref(), Some("Failed to add todo"));
    assert!(state.items.is_empty());
}

#[tokio::test]
async fn shared_error_field_is_last_write_wins() {
    let store = UnreliableStore::wrapping(Arc::new(deterministic_store()));
    let feed = TodoFeed::connect(Arc::new(store.clone()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    let id = feed.add("Buy milk").await.unwrap();
    wait_for(&mut rx, |s: &ListState| s.count() == 1).await;

    store.fail_writes(true);

    let toggle_error = feed.toggle(&id).await.unwrap_err();
    assert_eq!(toggle_error.operation, MutationKind::Toggle);
    wait_for(&mut rx, |s: &ListState| {
        s.error.as_deref() == Some("Failed to update todo")
    })
    .await;

    // The shared field only keeps the most recent message; the later add
    // failure overwrites the toggle failure. Per-operation detail lives in
    // the returned MutationError, not here.
    let add_error = feed.add("doomed").await.unwrap_err();
    assert_eq!(add_error.operation, MutationKind::Add);
    wait_for(&mut rx, |s: &ListState| {
        s.error.as_deref() == Some("Failed to add todo")
    })
    .await;
}

#[tokio::test]
async fn snapshot_clears_previous_error() {
    let store = UnreliableStore::wrapping(Arc::new(deterministic_store()));
    let feed = TodoFeed::connect(Arc::new(store.clone()));
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    store.fail_writes(true);
    feed.add("doomed").await.unwrap_err();
    wait_for(&mut rx, |s: &ListState| s.error.is_some()).await;

    store.fail_writes(false);
    feed.add("Buy milk").await.unwrap();

    let state = wait_for(&mut rx, |s: &ListState| s.count() == 1).await;
    assert_eq!(state.error, None);
    assert!(!state.loading);
}

#[tokio::test]
async fn disconnect_is_idempotent_and_final() {
    let store = Arc::new(deterministic_store());
    let feed = TodoFeed::connect(Arc::clone(&store) as Arc<dyn DocumentStore>);
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    feed.disconnect();
    feed.disconnect();
    assert!(feed.is_disconnected());

    // A write landing after teardown must not reach the mirror.
    store.create(TodoDraft::new("after teardown")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(feed.state().count(), 0);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn mirror_follows_writes_from_other_handles() {
    let store = Arc::new(deterministic_store());
    let feed = TodoFeed::connect(Arc::clone(&store) as Arc<dyn DocumentStore>);
    let mut rx = feed.watch_state();
    ready(&mut rx).await;

    // Writes that bypass the feed still arrive via the subscription.
    store.create(TodoDraft::new("from elsewhere")).await.unwrap();

    let state = wait_for(&mut rx, |s: &ListState| s.count() == 1).await;
    assert_eq!(state.items[0].title, "from elsewhere");
}
