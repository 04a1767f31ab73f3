use std::sync::Arc;

use crate::error::error_chain;
use crate::node::{CreationCell, DataNode, NodeIcon};

/// Placeholder node standing in for something that failed.
///
/// Shown in the tree at the position where the failure happened, so the
/// rest of the tree stays navigable.
#[derive(Debug, Default)]
pub struct ErrorDataNode {
    message: String,
    detail: String,
    creation: CreationCell,
}

impl ErrorDataNode {
    /// Node type reported by error placeholders.
    pub const NODE_TYPE: &'static str = "Error";

    /// An error placeholder with a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            detail: message.clone(),
            message,
            creation: CreationCell::new(),
        }
    }

    /// An error placeholder describing `error` and its causes.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            message: error.to_string(),
            detail: error_chain(error),
            creation: CreationCell::new(),
        }
    }

    /// A shared error placeholder.
    pub fn shared(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(message))
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl DataNode for ErrorDataNode {
    fn name(&self) -> String {
        self.message.lines().next().unwrap_or_default().to_string()
    }

    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn icon(&self) -> NodeIcon {
        NodeIcon::Error
    }

    fn description(&self) -> Option<String> {
        Some(self.detail.clone())
    }

    fn allows_children(&self) -> bool {
        false
    }

    fn creation(&self) -> &CreationCell {
        &self.creation
    }
}
