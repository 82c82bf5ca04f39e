//! Dependency injection traits.
//!
//! The store assigns document identity and creation time. Both capabilities
//! are abstracted behind traits so adapters stay deterministic under test.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use livetodo_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Identifier generator - abstracts id assignment for testability
///
/// Store adapters call this when creating documents; the engine never
/// generates ids itself.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier, unique within the collection
    fn next_id(&self) -> String;
}

/// Production id generator producing random v4 UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
