use crate::node::{CreationCell, DataNode, NodeIcon};

/// A root with no children, used before anything has been opened.
#[derive(Debug, Default)]
pub struct EmptyDataNode {
    creation: CreationCell,
}

impl EmptyDataNode {
    /// Node type reported by empty nodes.
    pub const NODE_TYPE: &'static str = "Empty";

    pub fn new() -> Self {
        Self::default()
    }
}

impl DataNode for EmptyDataNode {
    fn name(&self) -> String {
        String::new()
    }

    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn icon(&self) -> NodeIcon {
        NodeIcon::Empty
    }

    fn allows_children(&self) -> bool {
        true
    }

    fn creation(&self) -> &CreationCell {
        &self.creation
    }
}
