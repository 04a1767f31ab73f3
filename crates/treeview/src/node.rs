//! The data node contract.
//!
//! A [`DataNode`] is one item in a browsable hierarchy: a directory, a file,
//! a table inside a container format, an error placeholder. The tree model
//! only talks to nodes through this trait. Everything a view needs to draw a
//! node (name, type, icon) must be cheap; only [`DataNode::children`] may
//! block on I/O, and it is always called off the dispatch thread.
//!
//! Node identity is reference identity: two `Arc`s to the same allocation are
//! the same node, and two distinct allocations are distinct tree positions
//! even if they describe the same data.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use treeview::{ChildIter, CreationCell, DataNode, NodeRef};
//!
//! #[derive(Default)]
//! struct Leaf {
//!     creation: CreationCell,
//! }
//!
//! impl DataNode for Leaf {
//!     fn name(&self) -> String {
//!         "leaf".to_string()
//!     }
//!     fn node_type(&self) -> &str {
//!         "Leaf"
//!     }
//!     fn allows_children(&self) -> bool {
//!         false
//!     }
//!     fn creation(&self) -> &CreationCell {
//!         &self.creation
//!     }
//! }
//!
//! let node: NodeRef = Arc::new(Leaf::default());
//! assert_eq!(node.label(), "leaf");
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::factory::{CreationState, SourceRef};

/// Shared handle to a data node.
pub type NodeRef = Arc<dyn DataNode>;

/// Lazy sequence of child nodes.
pub type ChildIter = Box<dyn Iterator<Item = NodeRef> + Send>;

/// Slot holding a node's [`CreationState`], filled at most once.
pub type CreationCell = OnceLock<CreationState>;

/// Icon a view should draw for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeIcon {
    /// A node without children.
    #[default]
    Leaf,
    /// A generic node with children.
    Branch,
    /// A plain file.
    File,
    /// A directory.
    Directory,
    /// A failure placeholder.
    Error,
    /// An empty placeholder root.
    Empty,
}

/// A node in a browsable data hierarchy.
pub trait DataNode: Send + Sync + 'static {
    /// Short name of the node.
    fn name(&self) -> String;

    /// Human-readable kind of node, such as `"Directory"`.
    fn node_type(&self) -> &str;

    /// Icon to draw.
    fn icon(&self) -> NodeIcon {
        if self.allows_children() {
            NodeIcon::Branch
        } else {
            NodeIcon::Leaf
        }
    }

    /// Longer text for a detail view.
    fn description(&self) -> Option<String> {
        None
    }

    /// Whether the node can have children. Must not do I/O.
    fn allows_children(&self) -> bool;

    /// Produce the node's children.
    ///
    /// May block. Called at most once per expansion, never concurrently with
    /// itself for the same node. Failures must be yielded as error
    /// placeholder nodes, not panics.
    fn children(self: Arc<Self>) -> ChildIter {
        Box::new(std::iter::empty())
    }

    /// Typed data the node can expose, looked up by kind.
    fn data_object(&self, _kind: &str) -> Option<SourceRef> {
        None
    }

    /// How this node was made. Filled once by the factory.
    fn creation(&self) -> &CreationCell;

    /// The object this node logically sits under, used for display paths.
    ///
    /// This is separate from the structural parent in the tree.
    fn logical_origin(&self) -> Option<SourceRef> {
        self.creation().get().and_then(|c| c.origin().cloned())
    }

    /// Label for display, falling back to the name.
    fn label(&self) -> String {
        self.creation()
            .get()
            .and_then(|c| c.label().map(str::to_string))
            .unwrap_or_else(|| self.name())
    }
}

impl fmt::Debug for dyn DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataNode")
            .field("name", &self.name())
            .field("type", &self.node_type())
            .finish()
    }
}

impl fmt::Display for dyn DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Identity key of a node: the address of its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey(usize);

impl NodeKey {
    pub(crate) fn of(node: &NodeRef) -> Self {
        Self(Arc::as_ptr(node) as *const () as usize)
    }
}

/// Whether two handles refer to the same node.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    NodeKey::of(a) == NodeKey::of(b)
}

/// The node's structural parent as recorded at creation, if it is still
/// alive.
pub fn creation_parent(node: &dyn DataNode) -> Option<NodeRef> {
    node.creation().get().and_then(|c| c.parent())
}

/// Slash-separated labels from the oldest live ancestor down to `node`.
pub fn logical_path(node: &NodeRef) -> String {
    let mut labels = vec![node.label()];
    let mut current = creation_parent(node.as_ref());
    while let Some(parent) = current {
        labels.push(parent.label());
        current = creation_parent(parent.as_ref());
    }

    let mut path = String::new();
    for label in labels.iter().rev() {
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(label);
    }
    path
}
