//! Supervision: termination reasons and the observer contract.
//!
//! Supervision here is *observation*, not restart. A supervisor is any
//! collaborator that wants to know when a child sequent terminates; what
//! it does with that knowledge (rebuild structure, spawn a replacement,
//! log and move on) is its own business.

use sequent_types::SequentId;
use serde::{Deserialize, Serialize};

/// Why a sequent terminated.
///
/// | Variant | Cause |
/// |---------|-------|
/// | [`Requested`](Self::Requested) | explicit `terminate(reason)` |
/// | [`Fault`](Self::Fault) | a handler panicked; the payload text is preserved |
/// | [`Detached`](Self::Detached) | every handle was dropped; no message can ever arrive |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminateReason {
    /// Orderly shutdown requested through `terminate`.
    Requested(String),
    /// A handler raised a fault; contains the panic payload text.
    Fault(String),
    /// All handles to the sequent were dropped.
    Detached,
}

impl TerminateReason {
    /// Returns `true` for fault-caused terminations.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

impl std::fmt::Display for TerminateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested(reason) => write!(f, "requested: {reason}"),
            Self::Fault(fault) => write!(f, "fault: {fault}"),
            Self::Detached => f.write_str("detached"),
        }
    }
}

/// Observer of child terminations.
///
/// # Guarantees
///
/// - Called **exactly once** per child that reaches termination.
/// - `id` equals the value `child.id()` returned while the child lived,
///   so a supervisor holding an id → child map can locate the entry.
/// - Invoked from the dying child's worker context, after the child
///   stopped accepting new requests and before its mailbox is purged;
///   callers still blocked on replies unblock shortly after this returns.
///
/// # Contract for implementors
///
/// The callback must not call back into the dying child synchronously —
/// its mailbox is about to close and the call would be rejected or
/// purged. Spawning replacement children is fine.
///
/// The child holds its supervisor as a `Weak` reference: the supervisor
/// owns the child, never the other way around. A supervisor that has
/// already been dropped is silently skipped.
pub trait Supervisor: Send + Sync {
    /// Observes the termination of the child identified by `id`.
    fn on_terminated(&self, reason: TerminateReason, id: SequentId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(
            TerminateReason::Requested("shutdown".into()).to_string(),
            "requested: shutdown"
        );
        assert_eq!(
            TerminateReason::Fault("index out of range".into()).to_string(),
            "fault: index out of range"
        );
        assert_eq!(TerminateReason::Detached.to_string(), "detached");
    }

    #[test]
    fn fault_predicate() {
        assert!(TerminateReason::Fault("boom".into()).is_fault());
        assert!(!TerminateReason::Requested("bye".into()).is_fault());
        assert!(!TerminateReason::Detached.is_fault());
    }

    #[test]
    fn serde_round_trip() {
        let reason = TerminateReason::Fault("boom".into());
        let json = serde_json::to_string(&reason).unwrap();
        assert_eq!(serde_json::from_str::<TerminateReason>(&json).unwrap(), reason);
    }
}
