//! Todo document types.
//!
//! This module defines the document shape stored in the remote collection
//! (`Todo`), the identifier type (`TodoId`), and the value types used for
//! point writes (`TodoDraft` for creation, `TodoPatch` for partial updates).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for `TodoId` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid todo ID: {0}")]
pub struct ParseTodoIdError(String);

/// Opaque identifier for a todo document.
///
/// Identifiers are assigned by the store at creation time and are immutable
/// thereafter. The engine never interprets their contents.
///
/// # Design
///
/// `TodoId` is a newtype wrapper around `String` that provides:
/// - Type safety (can't accidentally use a regular string)
/// - Clear intent in function signatures
/// - Serialization support for storage
///
/// # Validation
///
/// - `FromStr::from_str()`: Validates input (rejects empty strings)
/// - `From::from()` and `new()`: No validation (for internal use with trusted input)
///
/// Use `FromStr` when parsing external/user input. Use `new()` or `From` when
/// constructing identifiers from store-assigned data.
///
/// # Examples
///
/// ```
/// use livetodo_core::todo::TodoId;
///
/// let id = TodoId::new("todo-12345");
/// assert_eq!(id.as_str(), "todo-12345");
///
/// let parsed: TodoId = "todo-abc".parse().unwrap();
/// assert_eq!(parsed, TodoId::new("todo-abc"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoId(String);

impl TodoId {
    /// Create a new `TodoId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the `TodoId` into its inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = ParseTodoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseTodoIdError("Todo ID cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TodoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TodoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single todo document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, assigned by the store at creation
    pub id: TodoId,
    /// Title/description of the todo
    pub title: String,
    /// Whether the todo is completed
    pub completed: bool,
    /// When the todo was created (store clock); sole sort key, newest first
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a new todo document.
    #[must_use]
    pub const fn new(id: TodoId, title: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            completed: false,
            created_at,
        }
    }
}

/// Caller-supplied fields for creating a todo.
///
/// The store assigns `id` and `created_at`; `completed` always starts false.
/// Title trimming and non-emptiness are the caller's responsibility.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDraft {
    /// Title of the new todo
    pub title: String,
}

impl TodoDraft {
    /// Creates a draft with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Partial update for a todo document.
///
/// Fields left as `None` are untouched by the store. An all-`None` patch is
/// a valid (if pointless) write.
///
/// # Examples
///
/// ```
/// use livetodo_core::todo::TodoPatch;
///
/// let patch = TodoPatch::completed(true);
/// assert!(patch.title.is_none());
///
/// let patch = TodoPatch::title("Buy oat milk");
/// assert!(patch.completed.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    /// New title, if changing
    pub title: Option<String>,
    /// New completion flag, if changing
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// Patch that replaces the title.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    /// Patch that replaces the completion flag.
    #[must_use]
    pub const fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}
