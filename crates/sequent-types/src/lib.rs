//! Shared vocabulary types for the sequent runtime.
//!
//! This crate is the bottom of the workspace dependency graph:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  sequent-tree  : object tree adapter                │
//! ├─────────────────────────────────────────────────────┤
//! │  sequent-core  : queue, method table, Sequent       │
//! ├─────────────────────────────────────────────────────┤
//! │  sequent-types : SequentId, ErrorCode   ◄── HERE    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! It carries the types every layer needs to agree on:
//!
//! - [`SequentId`] — the stable identity a supervisor uses to correlate
//!   a termination notice with the child that produced it
//! - [`ErrorCode`] — the machine-readable error code contract implemented
//!   by every public error type in the workspace, plus the
//!   [`assert_error_code`]/[`assert_error_codes`] test helpers
//!
//! # Example
//!
//! ```
//! use sequent_types::SequentId;
//!
//! let id = SequentId::new();
//! assert!(!id.is_nil());
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::SequentId;
