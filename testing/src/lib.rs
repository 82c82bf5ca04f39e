//! # Livetodo Testing
//!
//! Testing utilities and helpers for the Livetodo synchronization engine.
//!
//! This crate provides:
//! - Deterministic environment implementations (`FixedClock`, `SteppingClock`,
//!   `SequentialIds`)
//! - `UnreliableStore`: fault injection around any `DocumentStore`
//! - Watch-channel assertion helpers with timeouts
//!
//! ## Example
//!
//! ```ignore
//! use livetodo_testing::{test_clock, SequentialIds, UnreliableStore};
//! use livetodo_memory::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_write_failure() {
//!     let store = UnreliableStore::wrapping(Arc::new(MemoryStore::new()));
//!     store.fail_writes(true);
//!
//!     let result = store.create(TodoDraft::new("Buy milk")).await;
//!     assert!(result.is_err());
//! }
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use livetodo_core::environment::{Clock, IdGenerator};

/// Mock implementations for deterministic tests.
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, TimeDelta, Utc};
    use futures::StreamExt;
    use livetodo_core::snapshot::SnapshotOrder;
    use livetodo_core::store::{DocumentStore, SnapshotStream, StoreError};
    use livetodo_core::todo::{TodoDraft, TodoId, TodoPatch};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use livetodo_testing::mocks::FixedClock;
    /// use livetodo_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Clock that advances by a fixed step on every call.
    ///
    /// Useful when a test needs distinct, ordered creation timestamps
    /// without touching the system clock.
    #[derive(Debug)]
    pub struct SteppingClock {
        start: DateTime<Utc>,
        step: TimeDelta,
        ticks: AtomicI64,
    }

    impl SteppingClock {
        /// Create a clock starting at `start`, advancing `step` per call.
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
            Self {
                start,
                step,
                ticks: AtomicI64::new(0),
            }
        }

        /// Clock starting at the fixed test epoch, one second per call.
        #[must_use]
        pub fn seconds_from_test_epoch() -> Self {
            Self::new(test_clock().now(), TimeDelta::seconds(1))
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
            self.start + self.step * i32::try_from(tick).unwrap_or(i32::MAX)
        }
    }

    /// Id generator producing `prefix-1`, `prefix-2`, ... in call order.
    #[derive(Debug)]
    pub struct SequentialIds {
        prefix: String,
        next: AtomicU64,
    }

    impl SequentialIds {
        /// Create a generator with the given prefix.
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicU64::new(1),
            }
        }
    }

    impl Default for SequentialIds {
        fn default() -> Self {
            Self::new("todo")
        }
    }

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            format!("{}-{n}", self.prefix)
        }
    }

    /// Fault-injecting wrapper around any [`DocumentStore`].
    ///
    /// Failure switches can be flipped at any point during a test:
    ///
    /// - `fail_subscriptions`: `watch()` itself fails
    /// - `fail_streams`: `watch()` succeeds but the stream yields one error
    ///   and ends (the "error channel instead of a snapshot" path)
    /// - `fail_writes`: `create`/`patch`/`remove` fail
    ///
    /// Switches are shared with clones, so a test can keep a handle while
    /// the code under test owns another.
    #[derive(Clone)]
    pub struct UnreliableStore {
        inner: Arc<dyn DocumentStore>,
        fail_subscriptions: Arc<AtomicBool>,
        fail_streams: Arc<AtomicBool>,
        fail_writes: Arc<AtomicBool>,
    }

    impl UnreliableStore {
        /// Wrap an inner store with all switches off.
        #[must_use]
        pub fn wrapping(inner: Arc<dyn DocumentStore>) -> Self {
            Self {
                inner,
                fail_subscriptions: Arc::new(AtomicBool::new(false)),
                fail_streams: Arc::new(AtomicBool::new(false)),
                fail_writes: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Make `watch()` fail while `on` is true.
        pub fn fail_subscriptions(&self, on: bool) {
            self.fail_subscriptions.store(on, Ordering::Release);
        }

        /// Make subscription streams yield an error and end while `on` is true.
        pub fn fail_streams(&self, on: bool) {
            self.fail_streams.store(on, Ordering::Release);
        }

        /// Make point writes fail while `on` is true.
        pub fn fail_writes(&self, on: bool) {
            self.fail_writes.store(on, Ordering::Release);
        }

        fn write_error() -> StoreError {
            StoreError::WriteFailed("injected write failure".to_string())
        }
    }

    impl std::fmt::Debug for UnreliableStore {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("UnreliableStore")
                .field(
                    "fail_subscriptions",
                    &self.fail_subscriptions.load(Ordering::Acquire),
                )
                .field("fail_streams", &self.fail_streams.load(Ordering::Acquire))
                .field("fail_writes", &self.fail_writes.load(Ordering::Acquire))
                .finish_non_exhaustive()
        }
    }

    impl DocumentStore for UnreliableStore {
        fn watch(
            &self,
            order: SnapshotOrder,
        ) -> Pin<Box<dyn Future<Output = Result<SnapshotStream, StoreError>> + Send + '_>> {
            Box::pin(async move {
                if self.fail_subscriptions.load(Ordering::Acquire) {
                    return Err(StoreError::SubscriptionFailed(
                        "injected subscription failure".to_string(),
                    ));
                }

                if self.fail_streams.load(Ordering::Acquire) {
                    let stream = futures::stream::once(async {
                        Err(StoreError::SubscriptionFailed(
                            "injected stream failure".to_string(),
                        ))
                    });
                    return Ok(stream.boxed());
                }

                self.inner.watch(order).await
            })
        }

        fn create(
            &self,
            draft: TodoDraft,
        ) -> Pin<Box<dyn Future<Output = Result<TodoId, StoreError>> + Send + '_>> {
            Box::pin(async move {
                if self.fail_writes.load(Ordering::Acquire) {
                    return Err(Self::write_error());
                }
                self.inner.create(draft).await
            })
        }

        fn patch(
            &self,
            id: &TodoId,
            patch: TodoPatch,
        ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
            let id = id.clone();
            Box::pin(async move {
                if self.fail_writes.load(Ordering::Acquire) {
                    return Err(Self::write_error());
                }
                self.inner.patch(&id, patch).await
            })
        }

        fn remove(
            &self,
            id: &TodoId,
        ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
            let id = id.clone();
            Box::pin(async move {
                if self.fail_writes.load(Ordering::Acquire) {
                    return Err(Self::write_error());
                }
                self.inner.remove(&id).await
            })
        }
    }
}

/// Watch-channel assertion helpers.
///
/// Tests observe the engine through `tokio::sync::watch` receivers; these
/// helpers wait for a state matching a predicate with a bounded timeout so
/// a broken engine fails the test instead of hanging it.
pub mod helpers {
    use std::time::Duration;
    use tokio::sync::watch;

    /// Default timeout for state assertions.
    pub const DEFAULT_WAIT: Duration = Duration::from_secs(2);

    /// Wait until the watched value satisfies `pred`, returning a clone.
    ///
    /// # Panics
    ///
    /// Panics if the timeout elapses or the channel closes first (this is a
    /// test assertion).
    #[allow(clippy::expect_used)] // Intentional panic for test assertions
    pub async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, pred: F) -> T
    where
        T: Clone,
        F: FnMut(&T) -> bool,
    {
        let value = tokio::time::timeout(DEFAULT_WAIT, rx.wait_for(pred))
            .await
            .expect("timed out waiting for watched state")
            .expect("watch channel closed while waiting");
        value.clone()
    }

    /// Wait for the next change notification, returning a clone of the value.
    ///
    /// # Panics
    ///
    /// Panics if the timeout elapses or the channel closes first (this is a
    /// test assertion).
    #[allow(clippy::expect_used)] // Intentional panic for test assertions
    pub async fn next_change<T: Clone>(rx: &mut watch::Receiver<T>) -> T {
        tokio::time::timeout(DEFAULT_WAIT, rx.changed())
            .await
            .expect("timed out waiting for a change notification")
            .expect("watch channel closed while waiting");
        rx.borrow().clone()
    }
}

// Re-export commonly used items
pub use helpers::{next_change, wait_for};
pub use mocks::{FixedClock, SequentialIds, SteppingClock, UnreliableStore, test_clock};
