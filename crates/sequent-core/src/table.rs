//! Method tables: name → type-erased invoker dispatch.
//!
//! Without runtime reflection, dispatch-by-name is built from an explicit
//! table: each entry pairs a method name with declared parameter/return
//! kinds and a closure that applies the handler to the sequent's state.
//! The builder's signatures enforce at compile time what a reflective
//! implementation would have to filter at construction (the entry is
//! callable, takes the state as its receiver, and owns its argument
//! conversion).
//!
//! # Example
//!
//! ```
//! use sequent_core::{MethodTable, ParamKind};
//! use serde_json::json;
//!
//! struct Counter {
//!     total: i64,
//! }
//!
//! let table = MethodTable::builder()
//!     .method("Add", &[ParamKind::Number], &[ParamKind::Number], |state: &mut Counter, args| {
//!         state.total += args[0].as_i64().unwrap_or(0);
//!         vec![json!(state.total)]
//!     })
//!     .build();
//!
//! assert!(table.resolve("Add").is_some());
//! assert!(table.resolve("Subtract").is_none());
//! ```

use crate::{ParamKind, SequentError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

type PlainHandler<S> = dyn Fn(&mut S, Vec<Value>) -> Vec<Value> + Send + Sync;
type FallibleHandler<S> = dyn Fn(&mut S, Vec<Value>) -> Result<Vec<Value>, String> + Send + Sync;

enum Invoker<S> {
    Plain(Box<PlainHandler<S>>),
    Fallible(Box<FallibleHandler<S>>),
}

/// Immutable description of one callable method.
///
/// Carries the declared name, the ordered parameter kinds (the implicit
/// state receiver is not listed), the ordered return kinds, and the
/// type-erased invoker.
pub struct MethodDescriptor<S> {
    name: String,
    params: Vec<ParamKind>,
    returns: Vec<ParamKind>,
    invoker: Invoker<S>,
}

impl<S> MethodDescriptor<S> {
    /// The declared method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter kinds, receiver excluded.
    #[must_use]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// Declared return kinds.
    #[must_use]
    pub fn returns(&self) -> &[ParamKind] {
        &self.returns
    }

    /// Whether the handler's trailing error is unwrapped into the
    /// caller's error channel.
    #[must_use]
    pub fn is_fallible(&self) -> bool {
        matches!(self.invoker, Invoker::Fallible(_))
    }

    /// Validates a caller-supplied argument vector against the declared
    /// parameter kinds.
    ///
    /// # Errors
    ///
    /// [`SequentError::WrongArity`] on a count mismatch,
    /// [`SequentError::NotAssignable`] on the first kind mismatch.
    pub fn validate_args(&self, args: &[Value]) -> Result<(), SequentError> {
        if args.len() != self.params.len() {
            return Err(SequentError::WrongArity {
                need: self.params.len(),
                have: args.len(),
            });
        }
        for (index, (arg, want)) in args.iter().zip(&self.params).enumerate() {
            if !want.accepts(arg) {
                return Err(SequentError::NotAssignable {
                    index,
                    got: ParamKind::of(arg),
                    want: *want,
                });
            }
        }
        Ok(())
    }

    /// Applies the handler to the state.
    ///
    /// Plain handlers pass their return vector through unchanged; fallible
    /// handlers surface their error side for the caller.
    pub(crate) fn invoke(&self, state: &mut S, args: Vec<Value>) -> Result<Vec<Value>, String> {
        match &self.invoker {
            Invoker::Plain(handler) => Ok(handler(state, args)),
            Invoker::Fallible(handler) => handler(state, args),
        }
    }
}

impl<S> std::fmt::Debug for MethodDescriptor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("fallible", &self.is_fallible())
            .finish()
    }
}

/// Mapping from method name to [`MethodDescriptor`].
///
/// Immutable once built; shared by the sequent handle (for call-time
/// resolution and validation) and freely cloneable via `Arc` internally.
pub struct MethodTable<S> {
    methods: HashMap<String, Arc<MethodDescriptor<S>>>,
}

impl<S> MethodTable<S> {
    /// Starts building a table.
    #[must_use]
    pub fn builder() -> MethodTableBuilder<S> {
        MethodTableBuilder {
            methods: HashMap::new(),
        }
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Arc<MethodDescriptor<S>>> {
        self.methods.get(name)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` when no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Iterates over the registered descriptors in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MethodDescriptor<S>>> {
        self.methods.values()
    }
}

impl<S> std::fmt::Debug for MethodTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("MethodTable").field("methods", &names).finish()
    }
}

/// Builder for [`MethodTable`].
///
/// Registering a name twice keeps the later entry.
pub struct MethodTableBuilder<S> {
    methods: HashMap<String, Arc<MethodDescriptor<S>>>,
}

impl<S> MethodTableBuilder<S> {
    /// Registers a plain method.
    ///
    /// The handler receives the state and the validated argument vector
    /// and returns its result tuple; the caller of `call` receives the
    /// tuple unchanged.
    #[must_use]
    pub fn method<F>(
        mut self,
        name: impl Into<String>,
        params: &[ParamKind],
        returns: &[ParamKind],
        handler: F,
    ) -> Self
    where
        F: Fn(&mut S, Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        self.methods.insert(
            name.clone(),
            Arc::new(MethodDescriptor {
                name,
                params: params.to_vec(),
                returns: returns.to_vec(),
                invoker: Invoker::Plain(Box::new(handler)),
            }),
        );
        self
    }

    /// Registers a fallible method.
    ///
    /// The handler's `Err` side is unwrapped into the caller's error
    /// channel as [`SequentError::HandlerFailed`] instead of being
    /// delivered as a return value.
    #[must_use]
    pub fn fallible_method<F>(
        mut self,
        name: impl Into<String>,
        params: &[ParamKind],
        returns: &[ParamKind],
        handler: F,
    ) -> Self
    where
        F: Fn(&mut S, Vec<Value>) -> Result<Vec<Value>, String> + Send + Sync + 'static,
    {
        let name = name.into();
        self.methods.insert(
            name.clone(),
            Arc::new(MethodDescriptor {
                name,
                params: params.to_vec(),
                returns: returns.to_vec(),
                invoker: Invoker::Fallible(Box::new(handler)),
            }),
        );
        self
    }

    /// Finishes the table.
    #[must_use]
    pub fn build(self) -> MethodTable<S> {
        MethodTable {
            methods: self.methods,
        }
    }
}
