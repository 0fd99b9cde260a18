//! Type-erased sequent handles.
//!
//! `Sequent<S>` is generic over its state, but a tree hosts objects of
//! many state types side by side. [`ObjectSequent`] erases the state
//! parameter behind an object-safe trait whose async operations return
//! boxed futures; every `Sequent<S>` implements it.

use futures::future::BoxFuture;
use sequent_core::{Sequent, SequentError, Value};
use sequent_types::SequentId;

/// Object-safe facade over a [`Sequent`].
///
/// The tree stores nodes as `Arc<dyn ObjectSequent>` so a single tree can
/// host objects with unrelated state types.
pub trait ObjectSequent: Send + Sync {
    /// Stable identity of the underlying sequent.
    fn id(&self) -> SequentId;

    /// Whether the underlying sequent still accepts requests.
    fn running(&self) -> bool;

    /// Dispatches a synchronous call; totally ordered per object.
    fn call<'a>(
        &'a self,
        method: &'a str,
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Vec<Value>, SequentError>>;

    /// Dispatches a fire-and-forget cast.
    fn cast<'a>(&'a self, method: &'a str, args: Vec<Value>)
        -> BoxFuture<'a, Result<(), SequentError>>;

    /// Requests orderly shutdown of the underlying sequent.
    fn terminate<'a>(&'a self, reason: String) -> BoxFuture<'a, ()>;
}

impl<S: Send + 'static> ObjectSequent for Sequent<S> {
    fn id(&self) -> SequentId {
        Sequent::id(self)
    }

    fn running(&self) -> bool {
        Sequent::running(self)
    }

    fn call<'a>(
        &'a self,
        method: &'a str,
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Vec<Value>, SequentError>> {
        Box::pin(Sequent::call(self, method, args))
    }

    fn cast<'a>(
        &'a self,
        method: &'a str,
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<(), SequentError>> {
        Box::pin(Sequent::cast(self, method, args))
    }

    fn terminate<'a>(&'a self, reason: String) -> BoxFuture<'a, ()> {
        Box::pin(Sequent::terminate(self, reason))
    }
}
