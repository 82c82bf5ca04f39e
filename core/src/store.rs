//! Remote document store contract.
//!
//! This module provides the [`DocumentStore`] trait - the boundary between
//! the synchronization engine and whatever backend persists the collection.
//! A store exposes one subscription primitive that streams ordered
//! collection snapshots, and point operations to create, patch, and remove
//! documents by identifier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ Presentation │
//! └──────┬───────┘
//!        │ add / toggle / rename / delete
//!        ▼
//! ┌──────────────┐   create / patch / remove   ┌───────────────┐
//! │   TodoFeed   │ ──────────────────────────► │ DocumentStore │
//! │  (runtime)   │ ◄────────────────────────── │   (adapter)   │
//! └──────────────┘     snapshot stream         └───────────────┘
//! ```
//!
//! # Key Principles
//!
//! - **Write-through**: mutations never touch the local mirror directly;
//!   their results come back through the next snapshot
//! - **Serialized snapshots**: a subscription never has two snapshots
//!   concurrently in flight
//! - **Error channel**: on failure the stream yields an `Err` item instead
//!   of a snapshot
//! - **Teardown**: dropping the stream releases the store-side watch
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use livetodo_core::snapshot::SnapshotOrder;
//! use livetodo_core::store::{DocumentStore, StoreError};
//! use livetodo_core::todo::{TodoDraft, TodoPatch};
//!
//! async fn example(store: &dyn DocumentStore) -> Result<(), StoreError> {
//!     let id = store.create(TodoDraft::new("Buy milk")).await?;
//!     store.patch(&id, TodoPatch::completed(true)).await?;
//!
//!     let mut snapshots = store.watch(SnapshotOrder::default()).await?;
//!     while let Some(result) = snapshots.next().await {
//!         match result {
//!             Ok(snapshot) => println!("{} todos", snapshot.len()),
//!             Err(e) => eprintln!("Error: {e}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use crate::snapshot::{Snapshot, SnapshotOrder};
use crate::todo::{TodoDraft, TodoId, TodoPatch};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Failed to connect to the backing store
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to open or keep a collection subscription
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    /// The addressed document does not exist
    #[error("Document {0} not found")]
    NotFound(TodoId),

    /// A point write (create/patch/remove) failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Generic error for other failures
    #[error("Store error: {0}")]
    Other(String),
}

/// Stream of snapshots from a subscription.
///
/// Each item is a `Result` that may contain a full collection [`Snapshot`]
/// or an error. Delivery is serialized per subscriber. The first item
/// arrives promptly after subscribing, even for an empty collection.
///
/// # Examples
///
/// ```rust,ignore
/// use futures::StreamExt;
///
/// let mut snapshots = store.watch(SnapshotOrder::default()).await?;
/// while let Some(result) = snapshots.next().await {
///     match result {
///         Ok(snapshot) => apply(snapshot),
///         Err(e) => tracing::error!("Snapshot stream error: {e}"),
///     }
/// }
/// ```
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Snapshot, StoreError>> + Send>>;

/// Trait for document store implementations.
///
/// A [`DocumentStore`] holds a single collection of todo documents and
/// exposes the subscribe/create/patch/remove surface the synchronization
/// engine is built on.
///
/// # Design Principles
///
/// - **Async-first**: all operations are async for non-blocking I/O
/// - **Server-assigned identity**: `create` assigns `id` and `created_at`
/// - **Last-write-wins**: concurrent writes to the same document resolve at
///   the document level; the store does not mediate
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to support concurrent access
/// from the engine's driver task and callers' mutation tasks.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` to enable trait object usage (`Arc<dyn DocumentStore>`). The
/// engine holds its store as a trait object so adapters can be swapped
/// without recompiling it.
pub trait DocumentStore: Send + Sync {
    /// Subscribe to the collection and receive a stream of snapshots.
    ///
    /// The returned stream yields a complete, ordered snapshot after every
    /// change to the collection (and one promptly after subscribing). On a
    /// subscription-level failure it yields an `Err` item; implementations
    /// should treat that as terminal for the stream.
    ///
    /// # Arguments
    ///
    /// - `order`: Requested snapshot ordering (key + direction)
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SubscriptionFailed`] if the subscription cannot
    /// be opened.
    fn watch(
        &self,
        order: SnapshotOrder,
    ) -> Pin<Box<dyn Future<Output = Result<SnapshotStream, StoreError>> + Send + '_>>;

    /// Create a new document from the draft.
    ///
    /// The store assigns the identifier and the creation timestamp;
    /// `completed` always starts false.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] (or a transport-specific variant)
    /// if the write fails.
    fn create(
        &self,
        draft: TodoDraft,
    ) -> Pin<Box<dyn Future<Output = Result<TodoId, StoreError>> + Send + '_>>;

    /// Apply a partial update to an existing document.
    ///
    /// Fields not mentioned in the patch are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document has the given id, or
    /// [`StoreError::WriteFailed`] if the write fails.
    fn patch(
        &self,
        id: &TodoId,
        patch: TodoPatch,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Remove a document.
    ///
    /// Removing an id that does not exist succeeds silently.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] (or a transport-specific variant)
    /// if the write fails.
    fn remove(
        &self,
        id: &TodoId,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}
