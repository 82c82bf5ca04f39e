//! # Livetodo Runtime
//!
//! Runtime implementation for the Livetodo synchronization engine.
//!
//! This crate provides [`TodoFeed`] - a live local mirror of a remote todo
//! collection with write-through mutation operations.
//!
//! ## Core Components
//!
//! - **`TodoFeed`**: owns one subscription to the store and a driver task
//!   that applies inbound snapshots
//! - **`ListState`**: the mirrored view (`items`, `loading`, `error`) held in
//!   a `tokio::sync::watch` channel so observers are notified on every change
//! - **Mutations**: `add`/`toggle`/`rename`/`delete` write through to the
//!   store and rely on the next snapshot to reflect results back
//!
//! ## Subscription lifecycle
//!
//! ```text
//!                 connect
//! Uninitialized ──────────► Loading ──first snapshot──► Ready ◄─┐
//!                              │                          │     │ snapshots
//!                              │ subscription error       └─────┘
//!                              ▼
//!                           Failed (terminal until a new connect)
//! ```
//!
//! Every inbound snapshot atomically replaces the whole `items` sequence and
//! clears any prior error. A subscription-level failure records a fixed
//! user-facing message and halts loading; mutations after that still work,
//! but the mirror no longer observes the collection.
//!
//! ## Example
//!
//! ```ignore
//! use livetodo_runtime::TodoFeed;
//! use livetodo_memory::MemoryStore;
//! use std::sync::Arc;
//!
//! let feed = TodoFeed::connect(Arc::new(MemoryStore::new()));
//! let mut states = feed.watch_state();
//!
//! let id = feed.add("Buy milk").await?;
//! states.changed().await?;
//! assert_eq!(states.borrow().items[0].title, "Buy milk");
//!
//! feed.disconnect();
//! ```

use livetodo_core::todo::{Todo, TodoId};

/// Error types for the synchronization engine
pub mod error {
    use livetodo_core::store::StoreError;
    use std::fmt;
    use thiserror::Error;

    /// Fixed user-facing message recorded when the subscription fails.
    pub const LOAD_FAILED: &str = "Failed to load todos";

    /// The write-through operation a mutation failure belongs to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MutationKind {
        /// `add(title)` - create a document
        Add,
        /// `toggle(id)` - flip the completion flag
        Toggle,
        /// `rename(id, title)` - replace the title
        Rename,
        /// `delete(id)` - remove the document
        Delete,
    }

    impl MutationKind {
        /// Stable label for logs and metrics.
        #[must_use]
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::Add => "add",
                Self::Toggle => "toggle",
                Self::Rename => "rename",
                Self::Delete => "delete",
            }
        }

        /// Fixed user-facing message recorded for this operation.
        ///
        /// Toggle and rename share a message: both are updates to an
        /// existing document.
        #[must_use]
        pub const fn user_message(self) -> &'static str {
            match self {
                Self::Add => "Failed to add todo",
                Self::Toggle | Self::Rename => "Failed to update todo",
                Self::Delete => "Failed to delete todo",
            }
        }
    }

    impl fmt::Display for MutationKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.as_str())
        }
    }

    /// A subscription-level failure.
    ///
    /// Fatal for the current session: the collection becomes unobservable
    /// until a new feed is connected. Absorbed into the shared state's
    /// `error` field rather than returned to callers.
    #[derive(Error, Debug, Clone)]
    #[error("Subscription failed: {source}")]
    pub struct SubscriptionError {
        /// The underlying store failure
        #[source]
        pub source: StoreError,
    }

    /// A single write-through mutation failure.
    ///
    /// Localized to one write; the subscription is unaffected. Recorded in
    /// the shared state's `error` field *and* returned to the caller so the
    /// UI can react per action. No retries are built in; retry policy is
    /// the caller's responsibility layered on this error.
    #[derive(Error, Debug, Clone)]
    #[error("{operation} failed: {source}")]
    pub struct MutationError {
        /// Which operation failed
        pub operation: MutationKind,
        /// The underlying store failure
        #[source]
        pub source: StoreError,
    }
}

/// The mirrored view of the collection.
///
/// Always a direct projection of the last snapshot received from the store;
/// the engine never mutates an item outside of a round-trip through the
/// store.
///
/// The shared `error` field holds the most recent failure message only -
/// concurrent mutation failures overwrite each other (last-write-wins).
/// Callers needing per-action feedback use the [`MutationError`] returned by
/// each operation instead.
///
/// [`MutationError`]: error::MutationError
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListState {
    /// Mirrored documents, newest first
    pub items: Vec<Todo>,
    /// True until the first snapshot (or subscription failure) arrives
    pub loading: bool,
    /// Most recent user-facing failure message, if any
    pub error: Option<String>,
}

impl ListState {
    /// State before any snapshot has arrived.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            error: None,
        }
    }

    /// Number of mirrored todos.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Number of completed todos.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|t| t.completed).count()
    }

    /// Returns a todo by ID.
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.items.iter().find(|t| &t.id == id)
    }

    /// Checks if a todo exists.
    #[must_use]
    pub fn exists(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }
}

impl Default for ListState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Feed module - the synchronization engine.
///
/// One [`TodoFeed`] per mounted list view: it opens exactly one subscription
/// on connect and tears it down exactly once on disconnect.
pub mod feed {
    use super::ListState;
    use super::error::{LOAD_FAILED, MutationError, MutationKind, SubscriptionError};
    use futures::StreamExt;
    use livetodo_core::snapshot::SnapshotOrder;
    use livetodo_core::store::{DocumentStore, StoreError};
    use livetodo_core::todo::{TodoDraft, TodoId, TodoPatch};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};
    use tokio::sync::watch;
    use tokio::task::JoinHandle;

    /// Apply a state update unless the feed has been torn down.
    ///
    /// All state writes go through here. The closed check runs inside the
    /// watch channel's own lock, which also serializes against the barrier
    /// in [`TodoFeed::disconnect`]: once `disconnect` returns, no update can
    /// land. Returns whether the update was applied.
    fn publish(
        state_tx: &watch::Sender<ListState>,
        closed: &AtomicBool,
        update: impl FnOnce(&mut ListState),
    ) -> bool {
        state_tx.send_if_modified(|state| {
            if closed.load(Ordering::Acquire) {
                return false;
            }
            update(state);
            true
        })
    }

    /// The synchronization engine - a live mirror of the remote collection.
    ///
    /// The feed manages:
    /// 1. One subscription to the store, ordered newest-first
    /// 2. A driver task applying inbound snapshots to shared state
    /// 3. Write-through mutations (`add`/`toggle`/`rename`/`delete`)
    /// 4. Idempotent, cancellation-safe teardown
    ///
    /// # Consistency
    ///
    /// A mutation's completion is not synchronized with the next snapshot
    /// arrival: treat [`state`](Self::state) as eventually consistent, not as
    /// immediately reflecting a just-issued mutation. There is no optimistic
    /// local update, no debounce, and no client-side locking; concurrent
    /// writes resolve last-write-wins at the document level in the store.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let feed = TodoFeed::connect(Arc::new(MemoryStore::new()));
    ///
    /// let id = feed.add("Buy milk").await?;
    /// feed.toggle(&id).await?;
    /// feed.delete(&id).await?;
    ///
    /// feed.disconnect();
    /// ```
    pub struct TodoFeed {
        store: Arc<dyn DocumentStore>,
        state_tx: Arc<watch::Sender<ListState>>,
        closed: Arc<AtomicBool>,
        driver: Mutex<Option<JoinHandle<()>>>,
    }

    impl TodoFeed {
        /// Connect to a store and start mirroring its collection.
        ///
        /// Opens exactly one subscription (ordered by creation time,
        /// newest first) by spawning one driver task. The initial state is
        /// `loading = true` with no items; the first snapshot or a
        /// subscription failure ends the loading phase.
        ///
        /// Must be called from within a tokio runtime.
        #[must_use]
        pub fn connect(store: Arc<dyn DocumentStore>) -> Self {
            let (state_tx, _) = watch::channel(ListState::initial());
            let state_tx = Arc::new(state_tx);
            let closed = Arc::new(AtomicBool::new(false));

            let driver = tokio::spawn(Self::drive(
                Arc::clone(&store),
                Arc::clone(&state_tx),
                Arc::clone(&closed),
            ));

            Self {
                store,
                state_tx,
                closed,
                driver: Mutex::new(Some(driver)),
            }
        }

        /// Driver task: open the subscription and apply snapshots until the
        /// stream ends, the subscription fails, or the feed is torn down.
        async fn drive(
            store: Arc<dyn DocumentStore>,
            state_tx: Arc<watch::Sender<ListState>>,
            closed: Arc<AtomicBool>,
        ) {
            let mut snapshots = match store.watch(SnapshotOrder::created_at_desc()).await {
                Ok(stream) => stream,
                Err(source) => {
                    Self::fail_subscription(&state_tx, &closed, SubscriptionError { source });
                    return;
                }
            };

            while let Some(result) = snapshots.next().await {
                match result {
                    Ok(snapshot) => {
                        let applied = publish(&state_tx, &closed, |state| {
                            state.items = snapshot.into_docs();
                            state.loading = false;
                            state.error = None;
                        });

                        if !applied {
                            break;
                        }

                        metrics::counter!("feed.snapshots_applied").increment(1);
                        tracing::trace!("snapshot applied");
                    }
                    // The stream's error channel is terminal for this session.
                    Err(source) => {
                        Self::fail_subscription(&state_tx, &closed, SubscriptionError { source });
                        return;
                    }
                }
            }

            tracing::debug!("snapshot stream ended");
        }

        fn fail_subscription(
            state_tx: &watch::Sender<ListState>,
            closed: &AtomicBool,
            error: SubscriptionError,
        ) {
            tracing::error!(error = %error, "subscription failed");
            metrics::counter!("feed.subscription_failures").increment(1);

            publish(state_tx, closed, |state| {
                state.loading = false;
                state.error = Some(LOAD_FAILED.to_string());
            });
        }

        /// A clone of the current mirrored state.
        #[must_use]
        pub fn state(&self) -> ListState {
            self.state_tx.borrow().clone()
        }

        /// A receiver notified on every state change (the re-render signal).
        ///
        /// The receiver initially holds the current state; await
        /// `changed()` for subsequent snapshots and error updates.
        #[must_use]
        pub fn watch_state(&self) -> watch::Receiver<ListState> {
            self.state_tx.subscribe()
        }

        /// Create a new todo with the given title.
        ///
        /// The store assigns the id and creation timestamp; the new item
        /// appears in the mirror with the next snapshot, before all items
        /// with an earlier timestamp. Title trimming and non-emptiness are
        /// the caller's responsibility; the feed does not enforce them.
        ///
        /// # Errors
        ///
        /// Returns [`MutationError`] if the write fails; the shared
        /// `error` field records `"Failed to add todo"`.
        #[tracing::instrument(skip(self, title), name = "feed_add")]
        pub async fn add(&self, title: impl Into<String>) -> Result<TodoId, MutationError> {
            match self.store.create(TodoDraft::new(title)).await {
                Ok(id) => {
                    tracing::debug!(id = %id, "todo created");
                    Ok(id)
                }
                Err(source) => Err(self.record_failure(MutationKind::Add, source)),
            }
        }

        /// Flip the completion flag of a known todo.
        ///
        /// The negation is computed from the current mirror. An id that is
        /// not currently mirrored is a silent no-op.
        ///
        /// # Errors
        ///
        /// Returns [`MutationError`] if the write fails; the shared
        /// `error` field records `"Failed to update todo"`.
        #[tracing::instrument(skip(self), name = "feed_toggle", fields(id = %id))]
        pub async fn toggle(&self, id: &TodoId) -> Result<(), MutationError> {
            let completed = {
                let state = self.state_tx.borrow();
                match state.get(id) {
                    Some(todo) => todo.completed,
                    None => {
                        tracing::debug!("toggle of unknown todo ignored");
                        return Ok(());
                    }
                }
            };

            match self.store.patch(id, TodoPatch::completed(!completed)).await {
                Ok(()) => Ok(()),
                Err(source) => Err(self.record_failure(MutationKind::Toggle, source)),
            }
        }

        /// Replace the title of a todo.
        ///
        /// # Errors
        ///
        /// Returns [`MutationError`] if the write fails; the shared
        /// `error` field records `"Failed to update todo"`.
        #[tracing::instrument(skip(self, title), name = "feed_rename", fields(id = %id))]
        pub async fn rename(
            &self,
            id: &TodoId,
            title: impl Into<String>,
        ) -> Result<(), MutationError> {
            match self.store.patch(id, TodoPatch::title(title)).await {
                Ok(()) => Ok(()),
                Err(source) => Err(self.record_failure(MutationKind::Rename, source)),
            }
        }

        /// Remove a todo.
        ///
        /// # Errors
        ///
        /// Returns [`MutationError`] if the write fails; the shared
        /// `error` field records `"Failed to delete todo"`.
        #[tracing::instrument(skip(self), name = "feed_delete", fields(id = %id))]
        pub async fn delete(&self, id: &TodoId) -> Result<(), MutationError> {
            match self.store.remove(id).await {
                Ok(()) => Ok(()),
                Err(source) => Err(self.record_failure(MutationKind::Delete, source)),
            }
        }

        /// Record a mutation failure in shared state and build the typed
        /// error for the caller.
        ///
        /// The shared field is last-write-wins across concurrent failures;
        /// the returned error is the per-operation result.
        fn record_failure(&self, operation: MutationKind, source: StoreError) -> MutationError {
            let error = MutationError { operation, source };
            tracing::warn!(operation = %operation, error = %error, "mutation failed");
            metrics::counter!("feed.mutation_failures", "operation" => operation.as_str())
                .increment(1);

            publish(&self.state_tx, &self.closed, |state| {
                state.error = Some(operation.user_message().to_string());
            });

            error
        }

        /// Tear down the subscription.
        ///
        /// Idempotent: the first call releases the store-side watch; later
        /// calls do nothing. After this returns, no in-flight snapshot or
        /// error can mutate state.
        pub fn disconnect(&self) {
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }

            // Barrier: a publish racing this call either completes first or
            // observes the closed flag inside the channel lock.
            self.state_tx.send_if_modified(|_| false);

            if let Some(driver) = self
                .driver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            {
                driver.abort();
            }

            metrics::counter!("feed.disconnected").increment(1);
            tracing::debug!("feed disconnected");
        }

        /// Whether the feed has been torn down.
        #[must_use]
        pub fn is_disconnected(&self) -> bool {
            self.closed.load(Ordering::Acquire)
        }
    }

    impl Drop for TodoFeed {
        fn drop(&mut self) {
            self.disconnect();
        }
    }

    impl std::fmt::Debug for TodoFeed {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TodoFeed")
                .field("state", &*self.state_tx.borrow())
                .field("disconnected", &self.is_disconnected())
                .finish_non_exhaustive()
        }
    }
}

pub use error::{LOAD_FAILED, MutationError, MutationKind, SubscriptionError};
pub use feed::TodoFeed;
