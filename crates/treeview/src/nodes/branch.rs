use std::sync::Arc;

use crate::factory::{DataNodeFactory, SourceRef};
use crate::node::{ChildIter, CreationCell, DataNode, NodeRef};

/// A named node with a fixed list of child sources.
///
/// Children are made lazily, one per source, through the node's child
/// factory. Sources can be anything the factory knows how to build,
/// including other nodes wrapped with [`source`](crate::factory::source).
#[derive(Debug)]
pub struct BranchDataNode {
    name: String,
    sources: Vec<SourceRef>,
    creation: CreationCell,
}

impl BranchDataNode {
    /// Node type reported by branch nodes.
    pub const NODE_TYPE: &'static str = "Branch";

    pub fn new(name: impl Into<String>, sources: Vec<SourceRef>) -> Self {
        Self {
            name: name.into(),
            sources,
            creation: CreationCell::new(),
        }
    }

    /// The child sources.
    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }
}

impl DataNode for BranchDataNode {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn allows_children(&self) -> bool {
        true
    }

    fn children(self: Arc<Self>) -> ChildIter {
        let factory = self
            .creation
            .get()
            .map(|c| c.child_factory().clone())
            .unwrap_or_else(|| Arc::new(DataNodeFactory::new()));
        let sources = self.sources.clone();
        let parent: NodeRef = self;
        Box::new(
            sources
                .into_iter()
                .map(move |src| factory.make_child_node(Some(&parent), src)),
        )
    }

    fn creation(&self) -> &CreationCell {
        &self.creation
    }
}
