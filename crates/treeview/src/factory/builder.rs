//! Builders that turn source objects into nodes.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::{DataNodeFactory, NodeSource, SourceRef};
use crate::error::NoSuchDataError;
use crate::node::NodeRef;
use crate::nodes::{DirectoryDataNode, ErrorDataNode, FileDataNode};

/// Turns suitable source objects into nodes.
///
/// A builder either produces one specific node type (reported by
/// [`node_type`](Self::node_type)) or is generic and may produce several.
/// The distinction matters for deprecated types: a deprecated node type is
/// only accepted from a builder dedicated to it.
pub trait DataNodeBuilder: Send + Sync {
    /// Name shown in factory listings and traces.
    fn name(&self) -> &str;

    /// The single node type this builder produces, or `None` if generic.
    fn node_type(&self) -> Option<&str>;

    /// Whether it is worth calling [`build`](Self::build) on this source.
    fn suitable(&self, source: &dyn NodeSource) -> bool;

    /// Build a node. The node's creation state is filled in by the factory.
    fn build(&self, factory: &DataNodeFactory, source: SourceRef)
    -> Result<NodeRef, NoSuchDataError>;
}

impl fmt::Debug for dyn DataNodeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataNodeBuilder")
            .field("name", &self.name())
            .field("node_type", &self.node_type())
            .finish()
    }
}

impl fmt::Display for dyn DataNodeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node_type() {
            Some(node_type) => write!(f, "{} -> {}", self.name(), node_type),
            None => write!(f, "{} (generic)", self.name()),
        }
    }
}

fn path_of(source: &dyn NodeSource) -> Option<PathBuf> {
    source.as_path().filter(|p| !p.as_os_str().is_empty())
}

fn metadata(source: &SourceRef) -> Result<(PathBuf, fs::Metadata), NoSuchDataError> {
    let path = path_of(source.as_ref())
        .ok_or_else(|| NoSuchDataError::new(format!("{source:?} is not a path")))?;
    let meta = fs::metadata(&path).map_err(|e| {
        NoSuchDataError::with_source(format!("cannot read {}", path.display()), e)
    })?;
    Ok((path, meta))
}

/// Generic builder that passes ready-made nodes through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodePassThroughBuilder;

impl DataNodeBuilder for NodePassThroughBuilder {
    fn name(&self) -> &str {
        "node"
    }

    fn node_type(&self) -> Option<&str> {
        None
    }

    fn suitable(&self, source: &dyn NodeSource) -> bool {
        source.is::<NodeRef>()
    }

    fn build(&self, _: &DataNodeFactory, source: SourceRef) -> Result<NodeRef, NoSuchDataError> {
        source
            .downcast_ref::<NodeRef>()
            .cloned()
            .ok_or_else(|| NoSuchDataError::new(format!("{source:?} is not a node")))
    }
}

/// Generic builder for filesystem paths: directories and files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathNodeBuilder;

impl DataNodeBuilder for PathNodeBuilder {
    fn name(&self) -> &str {
        "path"
    }

    fn node_type(&self) -> Option<&str> {
        None
    }

    fn suitable(&self, source: &dyn NodeSource) -> bool {
        path_of(source).is_some()
    }

    fn build(&self, _: &DataNodeFactory, source: SourceRef) -> Result<NodeRef, NoSuchDataError> {
        let (path, meta) = metadata(&source)?;
        if meta.is_dir() {
            Ok(Arc::new(DirectoryDataNode::new(path)))
        } else {
            Ok(Arc::new(FileDataNode::new(path)))
        }
    }
}

/// Dedicated builder for [`DirectoryDataNode`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryNodeBuilder;

impl DataNodeBuilder for DirectoryNodeBuilder {
    fn name(&self) -> &str {
        "directory"
    }

    fn node_type(&self) -> Option<&str> {
        Some(DirectoryDataNode::NODE_TYPE)
    }

    fn suitable(&self, source: &dyn NodeSource) -> bool {
        path_of(source).is_some()
    }

    fn build(&self, _: &DataNodeFactory, source: SourceRef) -> Result<NodeRef, NoSuchDataError> {
        let (path, meta) = metadata(&source)?;
        if !meta.is_dir() {
            return Err(NoSuchDataError::new(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        Ok(Arc::new(DirectoryDataNode::new(path)))
    }
}

/// Dedicated builder for [`FileDataNode`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FileNodeBuilder;

impl DataNodeBuilder for FileNodeBuilder {
    fn name(&self) -> &str {
        "file"
    }

    fn node_type(&self) -> Option<&str> {
        Some(FileDataNode::NODE_TYPE)
    }

    fn suitable(&self, source: &dyn NodeSource) -> bool {
        path_of(source).is_some()
    }

    fn build(&self, _: &DataNodeFactory, source: SourceRef) -> Result<NodeRef, NoSuchDataError> {
        let (path, meta) = metadata(&source)?;
        if meta.is_dir() {
            return Err(NoSuchDataError::new(format!(
                "{} is a directory",
                path.display()
            )));
        }
        Ok(Arc::new(FileDataNode::new(path)))
    }
}

/// Dedicated builder for [`ErrorDataNode`], from error sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorNodeBuilder;

impl DataNodeBuilder for ErrorNodeBuilder {
    fn name(&self) -> &str {
        "error"
    }

    fn node_type(&self) -> Option<&str> {
        Some(ErrorDataNode::NODE_TYPE)
    }

    fn suitable(&self, source: &dyn NodeSource) -> bool {
        source.is::<NoSuchDataError>() || source.is::<std::io::Error>()
    }

    fn build(&self, _: &DataNodeFactory, source: SourceRef) -> Result<NodeRef, NoSuchDataError> {
        if let Some(error) = source.downcast_ref::<NoSuchDataError>() {
            Ok(Arc::new(ErrorDataNode::from_error(error)))
        } else if let Some(error) = source.downcast_ref::<std::io::Error>() {
            Ok(Arc::new(ErrorDataNode::from_error(error)))
        } else {
            Err(NoSuchDataError::new(format!("{source:?} is not an error")))
        }
    }
}

/// The builders a default factory starts with, in order.
pub fn default_builders() -> Vec<Arc<dyn DataNodeBuilder>> {
    vec![
        Arc::new(NodePassThroughBuilder),
        Arc::new(PathNodeBuilder),
        Arc::new(DirectoryNodeBuilder),
        Arc::new(FileNodeBuilder),
        Arc::new(ErrorNodeBuilder),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::source;

    #[test]
    fn test_path_builder_suitability() {
        let builder = PathNodeBuilder;
        assert!(builder.suitable(source(PathBuf::from("/tmp")).as_ref()));
        assert!(builder.suitable(source("relative/name").as_ref()));
        assert!(!builder.suitable(source(String::new()).as_ref()));
        assert!(!builder.suitable(source(17_i64).as_ref()));
    }

    #[test]
    fn test_dedicated_builders_reject_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();
        let factory = DataNodeFactory::new();

        assert!(
            DirectoryNodeBuilder
                .build(&factory, source(file.clone()))
                .is_err()
        );
        assert!(
            FileNodeBuilder
                .build(&factory, source(dir.path().to_path_buf()))
                .is_err()
        );

        let node = FileNodeBuilder.build(&factory, source(file)).unwrap();
        assert_eq!(node.node_type(), FileDataNode::NODE_TYPE);
    }

    #[test]
    fn test_missing_path_reports_cause() {
        let factory = DataNodeFactory::new();
        let err = PathNodeBuilder
            .build(&factory, source(PathBuf::from("/definitely/not/here")))
            .unwrap_err();

        assert!(err.message().contains("/definitely/not/here"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_pass_through_returns_same_node() {
        let factory = DataNodeFactory::new();
        let node: NodeRef = Arc::new(crate::nodes::EmptyDataNode::new());

        assert!(NodePassThroughBuilder.suitable(source(node.clone()).as_ref()));
        let built = NodePassThroughBuilder
            .build(&factory, source(node.clone()))
            .unwrap();
        assert!(crate::same_node(&built, &node));
    }

    #[test]
    fn test_builder_display() {
        let generic: Arc<dyn DataNodeBuilder> = Arc::new(PathNodeBuilder);
        let dedicated: Arc<dyn DataNodeBuilder> = Arc::new(ErrorNodeBuilder);
        assert_eq!(generic.to_string(), "path (generic)");
        assert_eq!(dedicated.to_string(), "error -> Error");
    }
}
