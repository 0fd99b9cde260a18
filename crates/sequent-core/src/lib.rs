//! Serial-execution actor runtime.
//!
//! Each actor — a **sequent** — owns a mutable state value and a bounded
//! FIFO mailbox. A single worker task drains the mailbox one request at a
//! time, so handlers see the state free of data races without any locking
//! of their own. Sequents communicate through two primitives:
//!
//! | Primitive | Shape | Returns |
//! |-----------|-------|---------|
//! | [`Sequent::call`] | request/response | the handler's result tuple |
//! | [`Sequent::cast`] | fire-and-forget | once the request is enqueued |
//!
//! # Architecture
//!
//! ```text
//! caller ──call/cast──► Sequent handle ──► Queue ──► worker task
//!            │              │                          │
//!            │         MethodTable                &mut state
//!            │         (resolve + validate)           │
//!            ▼                                        ▼
//!       SequentError                         Supervisor::on_terminated
//! ```
//!
//! Dispatch is by name through a [`MethodTable`]: each entry declares its
//! parameter and return kinds ([`ParamKind`]) and a type-erased invoker.
//! Arguments travel as [`serde_json::Value`]s and are validated in the
//! caller's context before the request reaches the mailbox.
//!
//! # Fault containment
//!
//! A panicking handler never takes the process down: the worker catches
//! the panic, converts it into [`TerminateReason::Fault`], reports it to
//! the supervisor exactly once, and purges the mailbox so every pending
//! caller unblocks with [`SequentError::Died`]. Supervision is
//! observation only — nothing is restarted automatically.
//!
//! # Example
//!
//! ```ignore
//! use sequent_core::{MethodTable, ParamKind, Sequent};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Tally {
//!     count: i64,
//! }
//!
//! let table = MethodTable::builder()
//!     .method("Bump", &[], &[ParamKind::Number], |state: &mut Tally, _| {
//!         state.count += 1;
//!         vec![json!(state.count)]
//!     })
//!     .build();
//!
//! let tally = Sequent::spawn(Tally::default(), table);
//! assert_eq!(tally.call("Bump", vec![]).await?, vec![json!(1)]);
//! ```
//!
//! # Crate Structure
//!
//! - [`Queue`], [`Message`] — bounded mailbox with purge-on-stop
//! - [`MethodTable`], [`MethodDescriptor`] — name → invoker dispatch
//! - [`Sequent`], [`SequentOptions`] — the actor and its worker
//! - [`Supervisor`], [`TerminateReason`] — termination observation
//! - [`SequentError`] — the caller-visible error taxonomy

mod error;
mod queue;
mod request;
mod sequent;
mod supervisor;
mod table;
mod value;

pub use error::SequentError;
pub use queue::{EnqueueError, Message, Queue};
pub use sequent::{Sequent, SequentOptions};
pub use supervisor::{Supervisor, TerminateReason};
pub use table::{MethodDescriptor, MethodTable, MethodTableBuilder};
pub use value::ParamKind;

// Re-exported for convenience: the argument/return currency of every
// handler.
pub use serde_json::Value;

// Re-export so downstream crates can name ids without an extra import.
pub use sequent_types::SequentId;
