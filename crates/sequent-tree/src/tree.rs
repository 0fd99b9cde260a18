//! The object tree: named nodes, supervisor chains, placeholder collapse.
//!
//! Every node supervises the sequents hosted by its direct children: when
//! a child's sequent terminates, the parent rewrites its own child map:
//!
//! ```text
//!        parent                      parent
//!          │      child dies,          │
//!        child    grandchildren   placeholder      ── subtree preserved
//!        ╱   ╲    survive          ╱   ╲
//!      gc1   gc2  ───────────►   gc1   gc2
//! ```
//!
//! A dead leaf is simply removed, and a placeholder that loses its last
//! child is pruned recursively toward the root, so the tree never
//! accumulates empty scaffolding.
//!
//! Structural rewrites move children between nodes — a placeholder takes
//! over a dead node's children, a replacement takes over the replaced
//! node's children — so a sequent's parent node at death time may not be
//! the node that existed at spawn time. The supervisor link registered
//! with each sequent therefore points at the tree **root**, the one node
//! whose lifetime matches the tree's, and a termination is routed from
//! there by id to whichever node is the dead sequent's parent *now*.
//! That parent applies the rewrite.
//!
//! Paths are `/`-separated (`"/net/peers/alpha"`); intermediate segments
//! that do not exist yet are created as placeholders, mirroring how a
//! hierarchical namespace is usually populated leaf-first.

use crate::{ObjectSequent, TreeError};
use sequent_core::{MethodTable, Sequent, Supervisor, TerminateReason, Value};
use sequent_types::SequentId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use tracing::{debug, warn};

/// One named node in an [`ObjectTree`].
///
/// A node either hosts a sequent (an *object*) or is a **placeholder**: a
/// name that exists only to keep its descendants addressable.
pub struct ObjectNode {
    name: String,
    sequent: Option<Arc<dyn ObjectSequent>>,
    children: RwLock<HashMap<String, Arc<ObjectNode>>>,
    parent: RwLock<Weak<ObjectNode>>,
    self_weak: Weak<ObjectNode>,
}

impl ObjectNode {
    fn new(
        name: String,
        sequent: Option<Arc<dyn ObjectSequent>>,
        parent: Weak<ObjectNode>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Self {
            name,
            sequent,
            children: RwLock::new(HashMap::new()),
            parent: RwLock::new(parent),
            self_weak: self_weak.clone(),
        })
    }

    /// The node's own name (one path segment).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the node hosts no sequent.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.sequent.is_none()
    }

    /// The hosted sequent handle, if any.
    #[must_use]
    pub fn sequent(&self) -> Option<Arc<dyn ObjectSequent>> {
        self.sequent.clone()
    }

    /// Looks up a direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<Arc<ObjectNode>> {
        self.children().get(name).cloned()
    }

    /// Names of the direct children, sorted.
    #[must_use]
    pub fn child_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.children().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Dispatches a call on the hosted sequent.
    ///
    /// # Errors
    ///
    /// [`TreeError::NoHandler`] on a placeholder; sequent errors pass
    /// through.
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Vec<Value>, TreeError> {
        let sequent = self
            .sequent
            .as_ref()
            .ok_or_else(|| TreeError::NoHandler(self.name.clone()))?;
        Ok(sequent.call(method, args).await?)
    }

    /// Dispatches a cast on the hosted sequent.
    ///
    /// # Errors
    ///
    /// As for [`call`](Self::call).
    pub async fn cast(&self, method: &str, args: Vec<Value>) -> Result<(), TreeError> {
        let sequent = self
            .sequent
            .as_ref()
            .ok_or_else(|| TreeError::NoHandler(self.name.clone()))?;
        Ok(sequent.cast(method, args).await?)
    }

    fn children(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<ObjectNode>>> {
        self.children.read().expect("object tree poisoned")
    }

    /// Returns the existing child or creates a placeholder with that name.
    fn ensure_child(self: &Arc<Self>, name: &str) -> Arc<ObjectNode> {
        if let Some(existing) = self.child(name) {
            return existing;
        }
        let mut children = self.children.write().expect("object tree poisoned");
        // Re-check under the write lock.
        if let Some(existing) = children.get(name) {
            return Arc::clone(existing);
        }
        let node = ObjectNode::new(name.to_string(), None, self.self_weak.clone());
        children.insert(name.to_string(), Arc::clone(&node));
        node
    }

    /// Inserts a node hosting `sequent` under `name`, keeping the children
    /// of any node it replaces.
    fn attach(self: &Arc<Self>, name: &str, sequent: Arc<dyn ObjectSequent>) -> Arc<ObjectNode> {
        let node = ObjectNode::new(name.to_string(), Some(sequent), self.self_weak.clone());
        let mut children = self.children.write().expect("object tree poisoned");
        if let Some(replaced) = children.get(name) {
            let grandchildren =
                std::mem::take(&mut *replaced.children.write().expect("object tree poisoned"));
            for grandchild in grandchildren.values() {
                *grandchild.parent.write().expect("object tree poisoned") =
                    Arc::downgrade(&node);
            }
            *node.children.write().expect("object tree poisoned") = grandchildren;
        }
        children.insert(name.to_string(), Arc::clone(&node));
        node
    }

    /// Removes a direct child by name, then prunes upward if that leaves
    /// this node an empty placeholder.
    fn remove_child(&self, name: &str) {
        let removed = self
            .children
            .write()
            .expect("object tree poisoned")
            .remove(name);
        if removed.is_some() {
            self.prune_if_empty_placeholder();
        }
    }

    /// A childless placeholder has nothing left to name; ask the parent to
    /// drop it. Stops at the root and at nodes that host state.
    fn prune_if_empty_placeholder(&self) {
        if self.sequent.is_some() {
            return;
        }
        if !self.children().is_empty() {
            return;
        }
        let parent = self.parent.read().expect("object tree poisoned").upgrade();
        if let Some(parent) = parent {
            debug!(name = %self.name, "pruning empty placeholder");
            parent.remove_child(&self.name);
        }
    }

    /// Rewrites the child map when a directly hosted child sequent dies:
    /// a node with grandchildren is swapped for a placeholder preserving
    /// the subtree, a leaf is removed outright.
    ///
    /// Returns `false` when no direct child hosts the dead sequent.
    fn child_terminated(&self, reason: &TerminateReason, id: SequentId) -> bool {
        let removed_leaf = {
            let mut children = self.children.write().expect("object tree poisoned");
            let found = children
                .iter()
                .find(|(_, node)| {
                    node.sequent.as_ref().is_some_and(|sequent| sequent.id() == id)
                })
                .map(|(name, node)| (name.clone(), Arc::clone(node)));
            let Some((name, dead)) = found else {
                return false;
            };
            warn!(child = %name, %reason, "child sequent terminated");

            let grandchildren =
                std::mem::take(&mut *dead.children.write().expect("object tree poisoned"));
            if grandchildren.is_empty() {
                children.remove(&name);
                true
            } else {
                let placeholder =
                    ObjectNode::new(name.clone(), None, self.self_weak.clone());
                for grandchild in grandchildren.values() {
                    *grandchild.parent.write().expect("object tree poisoned") =
                        Arc::downgrade(&placeholder);
                }
                *placeholder.children.write().expect("object tree poisoned") = grandchildren;
                children.insert(name, placeholder);
                false
            }
        };
        if removed_leaf {
            self.prune_if_empty_placeholder();
        }
        true
    }

    /// Finds the dead sequent's current parent in this subtree and lets
    /// it rewrite its child map.
    ///
    /// Returns `true` once the termination was handled.
    fn route_terminated(&self, reason: &TerminateReason, id: SequentId) -> bool {
        if self.child_terminated(reason, id) {
            return true;
        }
        let children: Vec<Arc<ObjectNode>> = self.children().values().cloned().collect();
        children
            .into_iter()
            .any(|child| child.route_terminated(reason, id))
    }
}

impl Supervisor for ObjectNode {
    /// Routes the termination to the dead sequent's current parent, which
    /// collapses the node: a leaf is removed, a node with living
    /// descendants becomes a placeholder.
    ///
    /// Sequents are registered against the tree root, so delivery still
    /// reaches the right parent after the spawn-time parent was itself
    /// replaced by a placeholder or a newer object. A termination that
    /// matches no node (already rewritten away) is a no-op.
    fn on_terminated(&self, reason: TerminateReason, id: SequentId) {
        self.route_terminated(&reason, id);
    }
}

impl std::fmt::Debug for ObjectNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectNode")
            .field("name", &self.name)
            .field("placeholder", &self.is_placeholder())
            .field("children", &self.child_names())
            .finish()
    }
}

/// A tree of named objects, each serialized by its own sequent.
///
/// Dispatching through the tree gives every object a total order over its
/// handler invocations. Structural updates (death, pruning) flow through
/// supervision: terminations are delivered to the root and routed to the
/// dead object's current parent node.
///
/// # Example
///
/// ```ignore
/// let tree = ObjectTree::new();
/// tree.add_object("/net/peers", PeerSet::default(), peer_table())?;
/// let replies = tree.call("/net/peers", "List", vec![]).await?;
/// ```
pub struct ObjectTree {
    root: Arc<ObjectNode>,
}

impl ObjectTree {
    /// Creates an empty tree with a placeholder root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ObjectNode::new(String::new(), None, Weak::new()),
        }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> &Arc<ObjectNode> {
        &self.root
    }

    /// Hosts `state` at `path`, spawning a sequent supervised through the
    /// tree. Missing intermediate segments become placeholders; an
    /// existing node at `path` is replaced, its children preserved.
    ///
    /// The sequent's supervisor link points at the root node, which
    /// outlives every structural rewrite; the termination is routed to
    /// whichever node is the object's parent when it dies.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPath`] when the path has no segments (the root
    /// cannot host state).
    pub fn add_object<S: Send + 'static>(
        &self,
        path: &str,
        state: S,
        table: MethodTable<S>,
    ) -> Result<Arc<ObjectNode>, TreeError> {
        let segments = split_path(path)?;
        let Some((leaf, ancestors)) = segments.split_last() else {
            return Err(TreeError::InvalidPath(path.to_string()));
        };
        let mut parent = Arc::clone(&self.root);
        for segment in ancestors {
            parent = parent.ensure_child(segment);
        }
        let supervisor: Arc<dyn Supervisor> = Arc::clone(&self.root) as Arc<dyn Supervisor>;
        let supervisor: Weak<dyn Supervisor> = Arc::downgrade(&supervisor);
        let sequent = Sequent::spawn_supervised(state, table, supervisor);
        debug!(path, id = %sequent.id(), "object added");
        Ok(parent.attach(leaf, Arc::new(sequent)))
    }

    /// Resolves a path to a node. `"/"` resolves to the root.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<Arc<ObjectNode>> {
        let segments = split_path(path).ok()?;
        let mut current = Arc::clone(&self.root);
        for segment in &segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Calls a method on the object at `path`.
    ///
    /// # Errors
    ///
    /// [`TreeError::NoObject`] for an unknown path,
    /// [`TreeError::NoHandler`] for a placeholder; sequent errors pass
    /// through.
    pub async fn call(
        &self,
        path: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, TreeError> {
        let node = self
            .lookup(path)
            .ok_or_else(|| TreeError::NoObject(path.to_string()))?;
        node.call(method, args).await
    }

    /// Casts a method on the object at `path`.
    ///
    /// # Errors
    ///
    /// As for [`call`](Self::call).
    pub async fn cast(&self, path: &str, method: &str, args: Vec<Value>) -> Result<(), TreeError> {
        let node = self
            .lookup(path)
            .ok_or_else(|| TreeError::NoObject(path.to_string()))?;
        node.cast(method, args).await
    }

    /// Terminates the object at `path`.
    ///
    /// Removal of the node is not immediate: it flows through the
    /// supervision link once the worker observes the kill.
    ///
    /// # Errors
    ///
    /// [`TreeError::NoObject`] / [`TreeError::NoHandler`] as for
    /// [`call`](Self::call).
    pub async fn terminate(&self, path: &str, reason: impl Into<String>) -> Result<(), TreeError> {
        let node = self
            .lookup(path)
            .ok_or_else(|| TreeError::NoObject(path.to_string()))?;
        let sequent = node
            .sequent()
            .ok_or_else(|| TreeError::NoHandler(path.to_string()))?;
        sequent.terminate(reason.into()).await;
        Ok(())
    }
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectTree").field("root", &self.root).finish()
    }
}

/// Splits a `/`-separated path into segments.
///
/// `"/"` and `""` yield no segments; empty interior segments are invalid.
fn split_path(path: &str) -> Result<Vec<String>, TreeError> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(TreeError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_path_forms() {
        assert!(split_path("/").unwrap().is_empty());
        assert!(split_path("").unwrap().is_empty());
        assert_eq!(split_path("/a/b").unwrap(), vec!["a", "b"]);
        assert_eq!(split_path("a/b").unwrap(), vec!["a", "b"]);
        assert!(split_path("/a//b").is_err());
    }

    #[test]
    fn empty_tree_lookup() {
        let tree = ObjectTree::new();
        assert!(tree.lookup("/").is_some());
        assert!(tree.lookup("/missing").is_none());
        assert!(tree.root().is_placeholder());
    }
}
