//! Object tree adapter for the sequent runtime.
//!
//! Composes sequents into a hierarchical namespace of named objects:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     ObjectTree                        │
//! │                                                       │
//! │   "/"  ──► root (placeholder)                         │
//! │              ├── "net" (placeholder)                  │
//! │              │     └── "peers"  ◄── Sequent<PeerSet>  │
//! │              └── "store"        ◄── Sequent<Store>    │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Each node supervises its children's sequents. Method dispatch to an
//! object is a [`Sequent`](sequent_core::Sequent) call, so every object's
//! handlers execute in a total order. When an object dies, its parent
//! collapses the node: leaves disappear, nodes with living descendants
//! become placeholders that keep the subtree addressable.
//!
//! The crate also hosts [`MatchRegistry`], the sequent-backed reference
//! counting used to decide when a signal-match subscription must actually
//! be established or torn down upstream.
//!
//! # Crate Structure
//!
//! - [`ObjectTree`], [`ObjectNode`] — the namespace and its nodes
//! - [`ObjectSequent`] — type-erased sequent handle stored at each node
//! - [`MatchRegistry`] — serialized signal-match bookkeeping
//! - [`TreeError`] — path and dispatch errors

mod error;
mod matches;
mod object;
mod tree;

pub use error::TreeError;
pub use matches::MatchRegistry;
pub use object::ObjectSequent;
pub use tree::{ObjectNode, ObjectTree};
