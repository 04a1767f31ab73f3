use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use treeview_core::logging::targets;

use crate::error::NoSuchDataError;
use crate::factory::{DataNodeFactory, SourceRef, source};
use crate::node::{ChildIter, CreationCell, DataNode, NodeIcon, NodeRef};

/// Data kind under which filesystem nodes expose their path.
pub const PATH_DATA: &str = "path";

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A plain file on disk.
#[derive(Debug)]
pub struct FileDataNode {
    path: PathBuf,
    creation: CreationCell,
}

impl FileDataNode {
    /// Node type reported by file nodes.
    pub const NODE_TYPE: &'static str = "File";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            creation: CreationCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataNode for FileDataNode {
    fn name(&self) -> String {
        display_name(&self.path)
    }

    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn icon(&self) -> NodeIcon {
        NodeIcon::File
    }

    fn description(&self) -> Option<String> {
        let meta = fs::metadata(&self.path).ok()?;
        Some(format!("{} ({} bytes)", self.path.display(), meta.len()))
    }

    fn allows_children(&self) -> bool {
        false
    }

    fn data_object(&self, kind: &str) -> Option<SourceRef> {
        (kind == PATH_DATA).then(|| source(self.path.clone()))
    }

    fn creation(&self) -> &CreationCell {
        &self.creation
    }
}

/// A directory on disk.
///
/// Children are the directory's entries sorted by file name, each made
/// through the node's child factory. If the directory cannot be read, the
/// only child is an error placeholder.
#[derive(Debug)]
pub struct DirectoryDataNode {
    path: PathBuf,
    creation: CreationCell,
}

impl DirectoryDataNode {
    /// Node type reported by directory nodes.
    pub const NODE_TYPE: &'static str = "Directory";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            creation: CreationCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sorted_entries(&self) -> Result<Vec<PathBuf>, NoSuchDataError> {
        let read_dir = fs::read_dir(&self.path).map_err(|e| {
            NoSuchDataError::with_source(format!("cannot list {}", self.path.display()), e)
        })?;
        let mut entries = read_dir
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                NoSuchDataError::with_source(format!("cannot list {}", self.path.display()), e)
            })?;
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(entries)
    }
}

impl DataNode for DirectoryDataNode {
    fn name(&self) -> String {
        display_name(&self.path)
    }

    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn icon(&self) -> NodeIcon {
        NodeIcon::Directory
    }

    fn description(&self) -> Option<String> {
        Some(self.path.display().to_string())
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
        let entries = self.sorted_entries();
        let parent: NodeRef = self;

        match entries {
            Ok(entries) => Box::new(
                entries
                    .into_iter()
                    .map(move |path| factory.make_child_node(Some(&parent), source(path))),
            ),
            Err(e) => {
                debug!(target: targets::FACTORY, error = %e, "directory listing failed");
                let node = factory.make_error_node(Some(&parent), e);
                Box::new(std::iter::once(node))
            }
        }
    }

    fn data_object(&self, kind: &str) -> Option<SourceRef> {
        (kind == PATH_DATA).then(|| source(self.path.clone()))
    }

    fn creation(&self) -> &CreationCell {
        &self.creation
    }
}
