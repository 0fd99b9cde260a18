//! Identifier types for the sequent runtime.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a running sequent.
///
/// A supervisor may watch several children at once; when one of them
/// terminates, the notification carries the dying child's `SequentId` so
/// the supervisor can locate the matching entry in its own bookkeeping.
///
/// # Identity Strategy
///
/// Ids are random UUIDs (v4) generated at spawn time. The id of a live
/// sequent is therefore:
///
/// - **stable** — it never changes for the lifetime of the sequent
/// - **non-nil** — [`is_nil`](Self::is_nil) is `false` for every spawned
///   sequent; the nil id is reserved as an explicit "no sequent" marker
///
/// # Example
///
/// ```
/// use sequent_types::SequentId;
///
/// let a = SequentId::new();
/// let b = SequentId::new();
/// assert_ne!(a, b);
/// assert!(!a.is_nil());
/// assert!(SequentId::nil().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequentId(Uuid);

impl SequentId {
    /// Creates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the nil id, used as a "no sequent" marker.
    ///
    /// No spawned sequent ever carries this id.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `true` if this is the nil id.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SequentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SequentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
