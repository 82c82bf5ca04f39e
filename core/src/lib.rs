//! # Livetodo Core
//!
//! Core types and the store contract for the Livetodo synchronization engine.
//!
//! This crate provides the fundamental abstractions for mirroring a remote
//! document collection into local state with write-through mutations.
//!
//! ## Core Concepts
//!
//! - **Todo**: One persisted document in the collection
//! - **Snapshot**: A complete, ordered copy of the collection, delivered atomically
//! - **`DocumentStore`**: The remote store boundary (subscribe + point writes)
//! - **Environment**: Injected dependencies (`Clock`, `IdGenerator`) via traits
//!
//! ## Architecture Principles
//!
//! - Write-through: mutations go to the store; local state is updated only
//!   indirectly via the next snapshot, never optimistically
//! - Whole-snapshot replacement (no incremental patching, no divergence)
//! - Dependency injection via environment traits
//!
//! ## Example
//!
//! ```ignore
//! use livetodo_core::snapshot::SnapshotOrder;
//! use livetodo_core::store::DocumentStore;
//! use livetodo_core::todo::TodoDraft;
//!
//! async fn example(store: &dyn DocumentStore) {
//!     let id = store.create(TodoDraft::new("Buy milk")).await?;
//!
//!     let mut snapshots = store.watch(SnapshotOrder::default()).await?;
//!     while let Some(result) = snapshots.next().await {
//!         let snapshot = result?;
//!         println!("{} todos", snapshot.len());
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod environment;
pub mod snapshot;
pub mod store;
pub mod todo;

pub use snapshot::{Snapshot, SnapshotOrder};
pub use store::{DocumentStore, SnapshotStream, StoreError};
pub use todo::{Todo, TodoDraft, TodoId, TodoPatch};
