//! The asynchronous tree model.
//!
//! [`DataNodeTreeModel`] presents a tree of [`DataNode`](crate::DataNode)s
//! through the usual tree-view queries (child count, child at index, index
//! of child) while the children themselves are found in the background:
//!
//! 1. A view asks for a node's child count.
//! 2. The model attaches a [`NodeExpander`] to the node and starts it on a
//!    thread of its own.
//! 3. The expander pulls children from the node one at a time and appends
//!    each to the model.
//! 4. Each append queues a [`TreeModelEvent`] onto the dispatch thread,
//!    where the view hears about it.
//!
//! Each node in the model has a [`ModelNode`] record with its own lock, so
//! unrelated subtrees expand concurrently while appends to any one node are
//! serialised.

mod event;
mod expander;
mod model_node;
mod recursive;
mod tree_model;

pub use event::TreeModelEvent;
pub use expander::{ExpansionState, NodeExpander};
pub use model_node::ModelNode;
pub use recursive::{
    RECURSIVE_EXPANDER_PREFIX, RecursiveExpansion, recursive_expand, spawn_recursive_expand,
};
pub use tree_model::DataNodeTreeModel;
