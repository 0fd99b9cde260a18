//! Signal-match reference counting.
//!
//! A bus connection should hold exactly one upstream subscription per
//! `interface.member` pair no matter how many local listeners want it.
//! [`MatchRegistry`] hosts the reference counts inside a dedicated
//! sequent, so concurrent add/remove traffic is serialized by the mailbox
//! instead of a lock, and reports the edge transitions the caller acts
//! on: *first* reference (subscribe upstream) and *last* reference
//! (unsubscribe upstream).

use sequent_core::{MethodTable, ParamKind, Sequent, SequentError, Value};
use sequent_types::SequentId;
use serde_json::json;
use std::collections::HashMap;

/// Reference counts keyed by `interface.member`.
#[derive(Default)]
struct MatchState {
    refs: HashMap<String, u64>,
}

fn match_key(args: &[Value]) -> String {
    let interface = args.first().and_then(Value::as_str).unwrap_or_default();
    let member = args.get(1).and_then(Value::as_str).unwrap_or_default();
    format!("{interface}.{member}")
}

fn match_table() -> MethodTable<MatchState> {
    let signature = [ParamKind::String, ParamKind::String];
    MethodTable::builder()
        .method(
            "AddMatch",
            &signature,
            &[ParamKind::Bool],
            |state: &mut MatchState, args| {
                let count = state.refs.entry(match_key(&args)).or_insert(0);
                *count += 1;
                vec![json!(*count == 1)]
            },
        )
        .method(
            "RemoveMatch",
            &signature,
            &[ParamKind::Bool],
            |state: &mut MatchState, args| {
                let key = match_key(&args);
                match state.refs.get_mut(&key) {
                    Some(count) => {
                        *count -= 1;
                        let last = *count == 0;
                        if last {
                            state.refs.remove(&key);
                        }
                        vec![json!(last)]
                    }
                    // Removing a match that was never added is a no-op.
                    None => vec![json!(false)],
                }
            },
        )
        .method(
            "MatchCount",
            &signature,
            &[ParamKind::Number],
            |state: &mut MatchState, args| {
                vec![json!(state.refs.get(&match_key(&args)).copied().unwrap_or(0))]
            },
        )
        .build()
}

/// Sequent-hosted bookkeeping for signal-match subscriptions.
///
/// All operations are calls against one sequent, so bus-wide subscription
/// bookkeeping is totally ordered.
///
/// # Example
///
/// ```ignore
/// let registry = MatchRegistry::new();
/// assert!(registry.add_match("net.Peers", "Joined").await?);   // first: subscribe upstream
/// assert!(!registry.add_match("net.Peers", "Joined").await?);  // already held
/// assert!(!registry.remove_match("net.Peers", "Joined").await?);
/// assert!(registry.remove_match("net.Peers", "Joined").await?); // last: unsubscribe upstream
/// ```
pub struct MatchRegistry {
    sequent: Sequent<MatchState>,
}

impl MatchRegistry {
    /// Spawns the registry's sequent. Must be called within a Tokio
    /// runtime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sequent: Sequent::spawn(MatchState::default(), match_table()),
        }
    }

    /// Identity of the hosting sequent.
    #[must_use]
    pub fn id(&self) -> SequentId {
        self.sequent.id()
    }

    /// Whether the hosting sequent still accepts requests.
    #[must_use]
    pub fn running(&self) -> bool {
        self.sequent.running()
    }

    /// Takes a reference on `interface.member`.
    ///
    /// Returns `true` when this was the first reference, i.e. the caller
    /// should establish the upstream subscription.
    ///
    /// # Errors
    ///
    /// Passes through [`SequentError`] from the hosting sequent.
    pub async fn add_match(&self, interface: &str, member: &str) -> Result<bool, SequentError> {
        let result = self
            .sequent
            .call("AddMatch", vec![json!(interface), json!(member)])
            .await?;
        Ok(first_bool(&result))
    }

    /// Drops a reference on `interface.member`.
    ///
    /// Returns `true` when this was the last reference, i.e. the caller
    /// should drop the upstream subscription. Dropping an absent match
    /// returns `false`.
    ///
    /// # Errors
    ///
    /// Passes through [`SequentError`] from the hosting sequent.
    pub async fn remove_match(&self, interface: &str, member: &str) -> Result<bool, SequentError> {
        let result = self
            .sequent
            .call("RemoveMatch", vec![json!(interface), json!(member)])
            .await?;
        Ok(first_bool(&result))
    }

    /// Current reference count for `interface.member`.
    ///
    /// # Errors
    ///
    /// Passes through [`SequentError`] from the hosting sequent.
    pub async fn count(&self, interface: &str, member: &str) -> Result<u64, SequentError> {
        let result = self
            .sequent
            .call("MatchCount", vec![json!(interface), json!(member)])
            .await?;
        Ok(result.first().and_then(Value::as_u64).unwrap_or(0))
    }

    /// Shuts the registry down.
    pub async fn shutdown(&self, reason: impl Into<String>) {
        self.sequent.terminate(reason).await;
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn first_bool(values: &[Value]) -> bool {
    values.first().and_then(Value::as_bool).unwrap_or(false)
}
