//! Notifications emitted by [`DataNodeTreeModel`](super::DataNodeTreeModel).

use std::fmt;

use crate::node::NodeRef;

/// A change to the model's tree.
///
/// Every event is delivered on the dispatch thread. `path` runs from the
/// root down to the parent whose children changed, or, for
/// [`StructureChanged`](Self::StructureChanged), down to the node whose
/// whole subtree should be re-read.
#[derive(Clone)]
pub enum TreeModelEvent {
    /// Children were inserted at `indices` under the end of `path`.
    NodesInserted {
        path: Vec<NodeRef>,
        indices: Vec<usize>,
        children: Vec<NodeRef>,
    },
    /// Children formerly at `indices` under the end of `path` were removed.
    NodesRemoved {
        path: Vec<NodeRef>,
        indices: Vec<usize>,
        children: Vec<NodeRef>,
    },
    /// Children at `indices` changed appearance but not structure.
    NodesChanged {
        path: Vec<NodeRef>,
        indices: Vec<usize>,
        children: Vec<NodeRef>,
    },
    /// Everything below the end of `path` may have changed.
    StructureChanged { path: Vec<NodeRef> },
}

impl TreeModelEvent {
    /// The path carried by the event.
    pub fn path(&self) -> &[NodeRef] {
        match self {
            Self::NodesInserted { path, .. }
            | Self::NodesRemoved { path, .. }
            | Self::NodesChanged { path, .. }
            | Self::StructureChanged { path } => path,
        }
    }

    /// Child indices carried by the event; empty for structure changes.
    pub fn indices(&self) -> &[usize] {
        match self {
            Self::NodesInserted { indices, .. }
            | Self::NodesRemoved { indices, .. }
            | Self::NodesChanged { indices, .. } => indices,
            Self::StructureChanged { .. } => &[],
        }
    }

    /// Child nodes carried by the event; empty for structure changes.
    pub fn children(&self) -> &[NodeRef] {
        match self {
            Self::NodesInserted { children, .. }
            | Self::NodesRemoved { children, .. }
            | Self::NodesChanged { children, .. } => children,
            Self::StructureChanged { .. } => &[],
        }
    }

    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NodesInserted { .. } => "nodes_inserted",
            Self::NodesRemoved { .. } => "nodes_removed",
            Self::NodesChanged { .. } => "nodes_changed",
            Self::StructureChanged { .. } => "structure_changed",
        }
    }
}

impl fmt::Debug for TreeModelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path().iter().map(|n| n.label()).collect();
        let children: Vec<String> = self.children().iter().map(|n| n.label()).collect();
        f.debug_struct("TreeModelEvent")
            .field("kind", &self.kind())
            .field("path", &path)
            .field("indices", &self.indices())
            .field("children", &children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::nodes::BranchDataNode;

    #[test]
    fn test_accessors() {
        let root: NodeRef = Arc::new(BranchDataNode::new("root", Vec::new()));
        let child: NodeRef = Arc::new(BranchDataNode::new("child", Vec::new()));

        let inserted = TreeModelEvent::NodesInserted {
            path: vec![root.clone()],
            indices: vec![3],
            children: vec![child.clone()],
        };
        assert_eq!(inserted.kind(), "nodes_inserted");
        assert_eq!(inserted.indices(), [3]);
        assert!(crate::same_node(&inserted.children()[0], &child));

        let changed = TreeModelEvent::StructureChanged {
            path: vec![root, child],
        };
        assert_eq!(changed.path().len(), 2);
        assert!(changed.indices().is_empty());
        assert!(format!("{changed:?}").contains("structure_changed"));
    }
}
