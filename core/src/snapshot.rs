//! Collection snapshots and their ordering.
//!
//! A [`Snapshot`] is a complete, ordered copy of the collection's current
//! documents, delivered atomically by the store. Subscribers replace their
//! entire local view with each snapshot; there is no incremental patching.

use crate::todo::Todo;
use serde::{Deserialize, Serialize};

/// Field a snapshot is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKey {
    /// Creation timestamp (the only sort key today)
    #[default]
    CreatedAt,
}

/// Direction of a snapshot ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Oldest first
    Ascending,
    /// Newest first
    #[default]
    Descending,
}

/// Requested ordering for a subscription.
///
/// Ties on the sort key are broken by store-assigned insertion order
/// (stable).
///
/// # Examples
///
/// ```
/// use livetodo_core::snapshot::{OrderKey, SnapshotOrder, SortDirection};
///
/// let order = SnapshotOrder::default();
/// assert_eq!(order.key, OrderKey::CreatedAt);
/// assert_eq!(order.direction, SortDirection::Descending);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotOrder {
    /// Field to order by
    pub key: OrderKey,
    /// Ascending or descending
    pub direction: SortDirection,
}

impl SnapshotOrder {
    /// Creates an ordering over the given key and direction.
    #[must_use]
    pub const fn new(key: OrderKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Newest-first ordering by creation time.
    #[must_use]
    pub const fn created_at_desc() -> Self {
        Self::new(OrderKey::CreatedAt, SortDirection::Descending)
    }

    /// Sorts documents in place according to this ordering.
    ///
    /// The sort is stable: documents with equal sort keys keep their
    /// relative (store-assigned) order.
    pub fn sort(self, docs: &mut [Todo]) {
        match (self.key, self.direction) {
            (OrderKey::CreatedAt, SortDirection::Ascending) => {
                docs.sort_by_key(|todo| todo.created_at);
            }
            (OrderKey::CreatedAt, SortDirection::Descending) => {
                docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }
    }
}

/// A complete, ordered copy of the collection's current documents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    docs: Vec<Todo>,
}

impl Snapshot {
    /// Creates a snapshot from already-ordered documents.
    #[must_use]
    pub const fn new(docs: Vec<Todo>) -> Self {
        Self { docs }
    }

    /// The documents, in snapshot order.
    #[must_use]
    pub fn docs(&self) -> &[Todo] {
        &self.docs
    }

    /// Consumes the snapshot, returning its documents.
    #[must_use]
    pub fn into_docs(self) -> Vec<Todo> {
        self.docs
    }

    /// Number of documents in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the snapshot holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl IntoIterator for Snapshot {
    type Item = Todo;
    type IntoIter = std::vec::IntoIter<Todo>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}
