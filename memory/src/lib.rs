//! # Livetodo Memory
//!
//! In-memory [`DocumentStore`] adapter.
//!
//! This crate provides [`MemoryStore`] - a real, fully functional backend
//! holding the collection in process memory. It is the default store for
//! embedding, demos, and integration tests.
//!
//! ## How snapshots are delivered
//!
//! Every write bumps a revision on a `tokio::sync::watch` channel. Each
//! subscriber drives its own stream: on every revision change it re-reads
//! the collection, orders it as requested, and yields one full [`Snapshot`].
//! The watch channel coalesces intermediate revisions, so a slow subscriber
//! always receives the latest state next - snapshots are serialized per
//! subscriber, never two in flight.
//!
//! A write racing a subscriber's snapshot read can produce one duplicate
//! identical snapshot. Whole-list replacement absorbs duplicates.
//!
//! ## Example
//!
//! ```ignore
//! use livetodo_memory::MemoryStore;
//! use livetodo_core::{SnapshotOrder, TodoDraft};
//! use futures::StreamExt;
//!
//! let store = MemoryStore::new();
//! let id = store.create(TodoDraft::new("Buy milk")).await?;
//!
//! let mut snapshots = store.watch(SnapshotOrder::default()).await?;
//! let first = snapshots.next().await.unwrap()?;
//! assert_eq!(first.len(), 1);
//! ```

use futures::StreamExt;
use livetodo_core::environment::{Clock, IdGenerator, SystemClock, UuidIds};
use livetodo_core::snapshot::{Snapshot, SnapshotOrder};
use livetodo_core::store::{DocumentStore, SnapshotStream, StoreError};
use livetodo_core::todo::{Todo, TodoDraft, TodoId, TodoPatch};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// In-memory document store.
///
/// Documents live in insertion order behind an `RwLock`; insertion order is
/// the store-assigned tie-break for equal sort keys. Identity and creation
/// time come from the injected [`IdGenerator`] and [`Clock`], so tests can
/// make both deterministic.
///
/// Cloning a `MemoryStore` yields a handle to the same collection.
///
/// # Example
///
/// ```ignore
/// // Deterministic store for tests
/// let store = MemoryStore::with_environment(
///     Arc::new(test_clock()),
///     Arc::new(SequentialIds::new("todo")),
/// );
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    docs: Arc<RwLock<Vec<Todo>>>,
    changes: Arc<watch::Sender<u64>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl MemoryStore {
    /// Create an empty store with the system clock and random UUID ids.
    #[must_use]
    pub fn new() -> Self {
        Self::with_environment(Arc::new(SystemClock), Arc::new(UuidIds))
    }

    /// Create an empty store with an injected clock and id generator.
    #[must_use]
    pub fn with_environment(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            docs: Arc::new(RwLock::new(Vec::new())),
            changes: Arc::new(changes),
            clock,
            ids,
        }
    }

    /// Number of documents currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_docs().len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_docs().is_empty()
    }

    fn read_docs(&self) -> Vec<Todo> {
        self.docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notify subscribers that the collection changed.
    fn bump(&self) {
        self.changes.send_modify(|revision| *revision += 1);

        // Intentional cast for metrics - collection sizes are far below 2^53
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("memory_store.documents").set(self.len() as f64);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.len())
            .finish_non_exhaustive()
    }
}

impl DocumentStore for MemoryStore {
    fn watch(
        &self,
        order: SnapshotOrder,
    ) -> Pin<Box<dyn Future<Output = Result<SnapshotStream, StoreError>> + Send + '_>> {
        let mut rx = self.changes.subscribe();
        // The stream must not hold a store handle: it keeps only the
        // documents and the change receiver, so dropping every store handle
        // ends the stream.
        let docs = Arc::clone(&self.docs);

        Box::pin(async move {
            let stream = async_stream::stream! {
                loop {
                    // Mark the current revision seen before reading, so a
                    // write landing mid-read re-notifies instead of being
                    // missed.
                    rx.borrow_and_update();

                    let mut current = docs
                        .read()
                        .unwrap_or_else(PoisonError::into_inner)
                        .clone();
                    order.sort(&mut current);

                    metrics::counter!("memory_store.snapshots_emitted").increment(1);
                    yield Ok(Snapshot::new(current));

                    if rx.changed().await.is_err() {
                        tracing::debug!("store handle dropped, snapshot stream ending");
                        break;
                    }
                }
            };

            let stream: SnapshotStream = stream.boxed();
            Ok(stream)
        })
    }

    fn create(
        &self,
        draft: TodoDraft,
    ) -> Pin<Box<dyn Future<Output = Result<TodoId, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let id = TodoId::new(self.ids.next_id());
            let todo = Todo::new(id.clone(), draft.title, self.clock.now());

            self.docs
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(todo);
            self.bump();

            tracing::debug!(id = %id, "document created");
            Ok(id)
        })
    }

    fn patch(
        &self,
        id: &TodoId,
        patch: TodoPatch,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let id = id.clone();

        Box::pin(async move {
            {
                let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
                let Some(doc) = docs.iter_mut().find(|doc| doc.id == id) else {
                    return Err(StoreError::NotFound(id));
                };

                if let Some(title) = patch.title {
                    doc.title = title;
                }
                if let Some(completed) = patch.completed {
                    doc.completed = completed;
                }
            }
            self.bump();

            tracing::debug!(id = %id, "document patched");
            Ok(())
        })
    }

    fn remove(
        &self,
        id: &TodoId,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let id = id.clone();

        Box::pin(async move {
            let removed = {
                let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
                let before = docs.len();
                docs.retain(|doc| doc.id != id);
                docs.len() < before
            };

            // Removing an unknown id succeeds silently; no snapshot either.
            if removed {
                self.bump();
                tracing::debug!(id = %id, "document removed");
            } else {
                tracing::debug!(id = %id, "remove of unknown document ignored");
            }

            Ok(())
        })
    }
}
