//! Structural bookkeeping for one node in a tree model.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

use super::expander::NodeExpander;
use crate::node::NodeRef;

/// The model's record of one node: its parent, its materialised children
/// and the expander filling them in.
///
/// Exactly one `ModelNode` exists per node in a model. The node handle and
/// parent link never change; refreshing or replacing a node installs a new
/// `ModelNode` instead.
pub struct ModelNode {
    node: NodeRef,
    parent: Option<Weak<ModelNode>>,
    state: Mutex<ModelNodeState>,
}

/// Mutable part of a [`ModelNode`], guarded by the node's own lock.
#[derive(Default)]
pub(crate) struct ModelNodeState {
    pub(crate) children: Vec<Arc<ModelNode>>,
    pub(crate) expander: Option<Arc<NodeExpander>>,
    /// Set once the node has left the model; nothing may be added after.
    pub(crate) discarded: bool,
}

impl ModelNode {
    pub(crate) fn new(node: NodeRef, parent: Option<&Arc<ModelNode>>) -> Self {
        Self {
            node,
            parent: parent.map(Arc::downgrade),
            state: Mutex::new(ModelNodeState::default()),
        }
    }

    /// The wrapped data node.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// The parent record, or `None` for the root or a detached node.
    pub fn parent(&self) -> Option<Arc<ModelNode>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Snapshot of the current children.
    pub fn children(&self) -> Vec<NodeRef> {
        self.state
            .lock()
            .children
            .iter()
            .map(|c| c.node.clone())
            .collect()
    }

    /// Number of children currently materialised.
    pub fn child_count(&self) -> usize {
        self.state.lock().children.len()
    }

    /// The expander attached to this node, if any.
    pub fn expander(&self) -> Option<Arc<NodeExpander>> {
        self.state.lock().expander.clone()
    }

    /// Whether this record has been removed from its model.
    pub fn is_discarded(&self) -> bool {
        self.state.lock().discarded
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ModelNodeState> {
        self.state.lock()
    }

    /// Nodes from the root down to this one, following parent links.
    pub(crate) fn path(self: &Arc<Self>) -> Vec<NodeRef> {
        let mut path = vec![self.node.clone()];
        let mut current = self.parent();
        while let Some(parent) = current {
            path.push(parent.node.clone());
            current = parent.parent();
        }
        path.reverse();
        path
    }
}

impl ModelNodeState {
    /// Whether `expander` is the one currently attached.
    pub(crate) fn is_current(&self, expander: &NodeExpander) -> bool {
        self.expander
            .as_ref()
            .is_some_and(|e| std::ptr::eq(Arc::as_ptr(e), expander))
    }

    pub(crate) fn position_of(&self, child: &Arc<ModelNode>) -> Option<usize> {
        self.children.iter().position(|c| Arc::ptr_eq(c, child))
    }
}

impl fmt::Debug for ModelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ModelNode")
            .field("node", &self.node.label())
            .field("children", &state.children.len())
            .field("expander", &state.expander)
            .field("discarded", &state.discarded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::BranchDataNode;

    fn record(name: &str, parent: Option<&Arc<ModelNode>>) -> Arc<ModelNode> {
        Arc::new(ModelNode::new(
            Arc::new(BranchDataNode::new(name, Vec::new())),
            parent,
        ))
    }

    #[test]
    fn test_path_follows_parents() {
        let root = record("root", None);
        let mid = record("mid", Some(&root));
        let leaf = record("leaf", Some(&mid));

        let names: Vec<String> = leaf.path().iter().map(|n| n.name()).collect();
        assert_eq!(names, ["root", "mid", "leaf"]);
        assert!(root.parent().is_none());
        assert!(Arc::ptr_eq(&leaf.parent().unwrap(), &mid));
    }

    #[test]
    fn test_parent_link_is_weak() {
        let root = record("root", None);
        let child = record("child", Some(&root));
        drop(root);

        assert!(child.parent().is_none());
        assert_eq!(child.path().len(), 1);
    }

    #[test]
    fn test_position_of() {
        let root = record("root", None);
        let a = record("a", Some(&root));
        let b = record("b", Some(&root));
        root.lock().children.extend([a.clone(), b.clone()]);

        let state = root.lock();
        assert_eq!(state.position_of(&b), Some(1));
        assert_eq!(state.position_of(&record("c", None)), None);
        assert!(!state.discarded);
    }
}
