//! Node construction and provenance.
//!
//! A [`DataNodeFactory`] turns arbitrary source objects (paths, URLs, errors,
//! format-specific payloads) into [`DataNode`](crate::DataNode)s by trying an
//! ordered list of [`DataNodeBuilder`]s. Every node it makes is stamped with a
//! [`CreationState`] recording its parent, its source, a display label, and
//! the factory its own children should be made with.
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use treeview::factory::{DataNodeFactory, source};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let factory = DataNodeFactory::new();
//!
//! let node = factory
//!     .make_data_node(None, source(dir.path().to_path_buf()))
//!     .unwrap();
//! assert_eq!(node.node_type(), "Directory");
//!
//! // Failures become error placeholders instead.
//! let missing = factory.make_child_node(None, source(PathBuf::from("/no/such/path")));
//! assert_eq!(missing.node_type(), "Error");
//! ```

mod builder;
mod creation;
mod source;

use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use treeview_core::logging::targets;

pub use builder::{
    DataNodeBuilder, DirectoryNodeBuilder, ErrorNodeBuilder, FileNodeBuilder,
    NodePassThroughBuilder, PathNodeBuilder, default_builders,
};
pub use creation::CreationState;
pub use source::{NodeSource, SourceRef, source};

use crate::config::FactoryConfig;
use crate::error::{NoSuchDataError, error_chain};
use crate::node::NodeRef;
use crate::nodes::ErrorDataNode;

/// Last element of a `/`, `\` or `:` separated location.
static LAST_PATH_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^ /\\:]+)$").expect("path element pattern is valid")
});

/// Makes nodes from source objects.
///
/// Cloning gives an independent copy with its own builder list.
#[derive(Clone)]
pub struct DataNodeFactory {
    builders: Vec<Arc<dyn DataNodeBuilder>>,
    shunned: HashSet<String>,
    deprecated: HashSet<String>,
    debug: bool,
}

static_assertions::assert_impl_all!(DataNodeFactory: Send, Sync);

impl Default for DataNodeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DataNodeFactory {
    /// A factory with the [default builders](default_builders).
    pub fn new() -> Self {
        Self::with_builders(default_builders())
    }

    /// A factory with an explicit builder list.
    pub fn with_builders(builders: Vec<Arc<dyn DataNodeBuilder>>) -> Self {
        Self {
            builders,
            shunned: HashSet::new(),
            deprecated: HashSet::new(),
            debug: false,
        }
    }

    /// A default factory adjusted by configuration.
    ///
    /// Deprecated types are applied first, then preferred ones, then shunned.
    pub fn from_config(config: &FactoryConfig) -> Self {
        let mut factory = Self::new();
        factory.set_debug(config.debug);
        for node_type in &config.deprecated {
            factory.set_deprecated_type(node_type);
        }
        for node_type in config.preferred.iter().rev() {
            factory.set_preferred_type(node_type);
        }
        for node_type in &config.shunned {
            factory.remove_node_type(node_type);
        }
        factory
    }

    /// The builders, in the order they are tried.
    pub fn builders(&self) -> &[Arc<dyn DataNodeBuilder>] {
        &self.builders
    }

    /// Append a builder to the end of the list.
    pub fn add_builder(&mut self, builder: Arc<dyn DataNodeBuilder>) {
        self.builders.push(builder);
    }

    /// Insert a builder at `index`, clamped to the list length.
    pub fn insert_builder(&mut self, index: usize, builder: Arc<dyn DataNodeBuilder>) {
        let index = index.min(self.builders.len());
        self.builders.insert(index, builder);
    }

    /// Never produce nodes of `node_type`.
    ///
    /// Builders dedicated to the type are removed, and results of the type
    /// from generic builders are rejected.
    pub fn remove_node_type(&mut self, node_type: &str) {
        self.builders
            .retain(|b| b.node_type() != Some(node_type));
        self.shunned.insert(node_type.to_string());
    }

    /// Prefer `node_type` over everything else.
    ///
    /// Builders dedicated to the type move to the head of the list.
    pub fn set_preferred_type(&mut self, node_type: &str) {
        let (mut preferred, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.builders)
            .into_iter()
            .partition(|b| b.node_type() == Some(node_type));
        preferred.extend(rest);
        self.builders = preferred;
        self.deprecated.remove(node_type);
        self.shunned.remove(node_type);
    }

    /// Avoid `node_type` unless nothing else works.
    ///
    /// Builders dedicated to the type move to the tail of the list, and
    /// results of the type from generic builders are rejected.
    pub fn set_deprecated_type(&mut self, node_type: &str) {
        let (deprecated, mut rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.builders)
            .into_iter()
            .partition(|b| b.node_type() == Some(node_type));
        rest.extend(deprecated);
        self.builders = rest;
        self.deprecated.insert(node_type.to_string());
    }

    /// Whether nodes of `node_type` are never produced.
    pub fn is_shunned(&self, node_type: &str) -> bool {
        self.shunned.contains(node_type)
    }

    /// Whether `node_type` is deprecated.
    pub fn is_deprecated(&self, node_type: &str) -> bool {
        self.deprecated.contains(node_type)
    }

    /// Whether builder traces are recorded on created nodes.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Turn builder traces on or off.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Make a node from `source` using the first builder that accepts it.
    ///
    /// The new node is configured with [`configure_data_node`](Self::configure_data_node)
    /// and its creation state names the successful builder.
    pub fn make_data_node(
        &self,
        parent: Option<&NodeRef>,
        source: SourceRef,
    ) -> Result<NodeRef, NoSuchDataError> {
        let mut trace = self
            .debug
            .then(|| format!("Object: {:?}\nType: {}\n", source, source.type_name()));
        let mut tried = Vec::new();

        for builder in &self.builders {
            if !builder.suitable(source.as_ref()) {
                continue;
            }
            tried.push(builder.to_string());
            if let Some(trace) = trace.as_mut() {
                let _ = writeln!(trace, "\nBuilder: {builder}");
            }

            let node = match builder.build(self, source.clone()) {
                Ok(node) => node,
                Err(e) => {
                    if let Some(trace) = trace.as_mut() {
                        for line in error_chain(&e).lines() {
                            let _ = writeln!(trace, "   {line}");
                        }
                    }
                    tracing::debug!(
                        target: targets::FACTORY,
                        builder = builder.name(),
                        error = %e,
                        "builder failed"
                    );
                    continue;
                }
            };

            let node_type = node.node_type().to_string();
            if self.shunned.contains(&node_type) {
                if let Some(trace) = trace.as_mut() {
                    let _ = writeln!(trace, "   Type {node_type} shunned.");
                }
                continue;
            }
            if self.deprecated.contains(&node_type) && builder.node_type() != Some(node_type.as_str()) {
                if let Some(trace) = trace.as_mut() {
                    let _ = writeln!(trace, "   Type {node_type} deprecated.");
                }
                continue;
            }

            if let Some(trace) = trace.as_mut() {
                let _ = writeln!(trace, "   SUCCESS ({node_type})");
            }
            let state = self
                .creation_state(node.as_ref(), parent, Some(source))
                .with_builder(builder.name(), trace);
            self.install(&node, state);
            return Ok(node);
        }

        let mut message = format!(
            "No DataNode could be constructed from {:?} of type {}\nTried:\n",
            source,
            source.type_name()
        );
        for name in &tried {
            let _ = writeln!(message, "    {name}");
        }
        Err(NoSuchDataError::new(message))
    }

    /// Make a node from `error`. Never fails.
    pub fn make_error_node(&self, parent: Option<&NodeRef>, error: NoSuchDataError) -> NodeRef {
        let fallback = ErrorDataNode::from_error(&error);
        match self.make_data_node(parent, Arc::new(error)) {
            Ok(node) => node,
            Err(_) => Arc::new(fallback),
        }
    }

    /// Make a child of `parent` from `source`. Never fails.
    ///
    /// If no builder accepts the source, the result is an error node
    /// describing why.
    pub fn make_child_node(&self, parent: Option<&NodeRef>, source: SourceRef) -> NodeRef {
        match self.make_data_node(parent, source) {
            Ok(node) => node,
            Err(e) => self.make_error_node(parent, e),
        }
    }

    /// Stamp a node made outside the builder system with its creation state.
    ///
    /// The state is set only once; a node that already has one keeps it.
    pub fn configure_data_node(
        &self,
        node: &NodeRef,
        parent: Option<&NodeRef>,
        source: Option<SourceRef>,
    ) {
        let state = self.creation_state(node.as_ref(), parent, source);
        self.install(node, state);
    }

    /// Fill in the structural ancestry of a node from its logical origins.
    ///
    /// Walks upward: each node's logical origin is made into a node, which
    /// goes into the creation parent slot if that slot is empty. Stops when
    /// a node has no origin or no node can be made from it.
    ///
    /// Ancestors made here have no other owner, so each is held by the node
    /// below it and lives as long as `node` does.
    pub fn fill_in_ancestors(&self, node: &NodeRef) {
        let mut current = node.clone();
        loop {
            if let Some(parent) = crate::node::creation_parent(current.as_ref()) {
                current = parent;
                continue;
            }
            let Some(origin) = current.logical_origin() else {
                break;
            };
            let parent = match self.make_data_node(None, origin.clone()) {
                Ok(parent) => parent,
                Err(e) => {
                    tracing::debug!(
                        target: targets::FACTORY,
                        origin = ?origin,
                        error = %e.message().lines().next().unwrap_or_default(),
                        "ancestor could not be made"
                    );
                    break;
                }
            };
            match current.creation().get() {
                Some(state) => {
                    state.set_owned_parent(parent.clone());
                }
                None => {
                    let state = CreationState::new(None, Some(origin), Arc::new(self.clone()))
                        .with_owned_parent(parent.clone());
                    let _ = current.creation().set(state);
                }
            }
            current = parent;
        }
    }

    fn child_factory_of(&self, parent: Option<&NodeRef>) -> Arc<DataNodeFactory> {
        parent
            .and_then(|p| p.creation().get())
            .map(|state| state.child_factory().clone())
            .unwrap_or_else(|| Arc::new(self.clone()))
    }

    fn creation_state(
        &self,
        node: &dyn crate::DataNode,
        parent: Option<&NodeRef>,
        source: Option<SourceRef>,
    ) -> CreationState {
        let (label, origin) = match source.as_ref() {
            Some(source) => describe_source(source.as_ref()),
            None => (None, None),
        };
        let origin = if node.logical_origin().is_some() {
            None
        } else {
            origin
        };
        CreationState::new(parent, source, self.child_factory_of(parent))
            .with_origin(origin)
            .with_label(label)
    }

    fn install(&self, node: &NodeRef, state: CreationState) {
        if node.creation().set(state).is_err() {
            tracing::debug!(
                target: targets::FACTORY,
                node = %node.name(),
                "creation state already set"
            );
        }
    }
}

/// Label and logical origin derived from well-known source types.
fn describe_source(source: &dyn NodeSource) -> (Option<String>, Option<SourceRef>) {
    if let Some(path) = source.downcast_ref::<PathBuf>() {
        return describe_path(path);
    }
    let Some(text) = source.as_text() else {
        return (None, None);
    };
    if let Some(rest) = text.strip_prefix("ftp://") {
        let label = last_path_element(text);
        let origin = rest
            .rfind('/')
            .map(|i| self::source(text[..i + "ftp://".len()].to_string()));
        return (label, origin);
    }
    let (label, origin) = describe_path(Path::new(text));
    (label.or_else(|| last_path_element(text)), origin)
}

fn describe_path(path: &Path) -> (Option<String>, Option<SourceRef>) {
    let label = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let origin = std::path::absolute(path)
        .ok()
        .and_then(|abs| abs.parent().map(Path::to_path_buf))
        .map(self::source);
    (label, origin)
}

fn last_path_element(text: &str) -> Option<String> {
    LAST_PATH_ELEMENT
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

impl fmt::Display for DataNodeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DataNodeFactory with builders:")?;
        for builder in &self.builders {
            writeln!(f, "    {builder}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DataNodeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataNodeFactory")
            .field("builders", &self.builders)
            .field("shunned", &self.shunned)
            .field("deprecated", &self.deprecated)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{DirectoryDataNode, FileDataNode};

    fn builder_names(factory: &DataNodeFactory) -> Vec<String> {
        factory
            .builders()
            .iter()
            .map(|b| b.name().to_string())
            .collect()
    }

    #[test]
    fn test_make_data_node_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("table.fits");
        std::fs::write(&file, b"SIMPLE").unwrap();

        let factory = DataNodeFactory::new();
        let node = factory.make_data_node(None, source(file.clone())).unwrap();

        assert_eq!(node.node_type(), FileDataNode::NODE_TYPE);
        assert_eq!(node.label(), "table.fits");

        let state = node.creation().get().unwrap();
        assert_eq!(state.builder(), Some("path"));
        assert!(state.parent().is_none());
        let origin = node.logical_origin().unwrap();
        assert_eq!(
            origin.downcast_ref::<PathBuf>(),
            Some(&std::path::absolute(dir.path()).unwrap())
        );
    }

    #[test]
    fn test_failure_lists_builders_tried() {
        let factory = DataNodeFactory::new();
        let err = factory
            .make_data_node(None, source(PathBuf::from("/no/such/thing")))
            .unwrap_err();

        let text = err.to_string();
        assert!(text.starts_with("No DataNode could be constructed"));
        assert!(text.contains("path (generic)"));
        assert!(text.contains("directory -> Directory"));
        assert!(!text.contains("error -> Error"));
    }

    #[test]
    fn test_unsuitable_source_fails() {
        let factory = DataNodeFactory::new();
        assert!(factory.make_data_node(None, source(3.5_f64)).is_err());
    }

    #[test]
    fn test_make_child_node_returns_error_node() {
        let factory = DataNodeFactory::new();
        let node = factory.make_child_node(None, source(PathBuf::from("/no/such/thing")));

        assert_eq!(node.node_type(), ErrorDataNode::NODE_TYPE);
        assert!(node.description().unwrap().contains("No DataNode could be constructed"));
        assert_eq!(node.creation().get().unwrap().builder(), Some("error"));
    }

    #[test]
    fn test_make_error_node_without_error_builder() {
        let mut factory = DataNodeFactory::new();
        factory.remove_node_type(ErrorDataNode::NODE_TYPE);

        let node = factory.make_error_node(None, NoSuchDataError::new("bad header"));
        assert_eq!(node.node_type(), ErrorDataNode::NODE_TYPE);
        assert_eq!(node.name(), "bad header");
    }

    #[test]
    fn test_preferred_and_deprecated_reorder() {
        let mut factory = DataNodeFactory::new();
        factory.set_preferred_type(FileDataNode::NODE_TYPE);
        assert_eq!(builder_names(&factory), ["file", "node", "path", "directory", "error"]);

        factory.set_deprecated_type(FileDataNode::NODE_TYPE);
        assert_eq!(builder_names(&factory), ["node", "path", "directory", "error", "file"]);
        assert!(factory.is_deprecated(FileDataNode::NODE_TYPE));

        factory.set_preferred_type(FileDataNode::NODE_TYPE);
        assert!(!factory.is_deprecated(FileDataNode::NODE_TYPE));
    }

    #[test]
    fn test_deprecated_type_only_from_dedicated_builder() {
        let dir = tempfile::tempdir().unwrap();
        let mut factory = DataNodeFactory::new();
        factory.set_debug(true);
        factory.set_deprecated_type(DirectoryDataNode::NODE_TYPE);

        let node = factory
            .make_data_node(None, source(dir.path().to_path_buf()))
            .unwrap();
        let state = node.creation().get().unwrap();

        assert_eq!(node.node_type(), DirectoryDataNode::NODE_TYPE);
        assert_eq!(state.builder(), Some("directory"));
        let trace = state.factory_trace().unwrap();
        assert!(trace.contains("Type Directory deprecated."));
        assert!(trace.contains("SUCCESS (Directory)"));
    }

    #[test]
    fn test_shunned_type_never_produced() {
        let dir = tempfile::tempdir().unwrap();
        let mut factory = DataNodeFactory::new();
        factory.remove_node_type(DirectoryDataNode::NODE_TYPE);

        assert!(!builder_names(&factory).contains(&"directory".to_string()));
        assert!(factory.is_shunned(DirectoryDataNode::NODE_TYPE));
        assert!(
            factory
                .make_data_node(None, source(dir.path().to_path_buf()))
                .is_err()
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let original = DataNodeFactory::new();
        let mut copy = original.clone();
        copy.remove_node_type(FileDataNode::NODE_TYPE);

        assert_eq!(original.builders().len(), 5);
        assert_eq!(copy.builders().len(), 4);
    }

    #[test]
    fn test_child_factory_is_inherited() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();

        let mut factory = DataNodeFactory::new();
        factory.set_debug(true);
        let parent = factory
            .make_data_node(None, source(dir.path().to_path_buf()))
            .unwrap();
        let parent_factory = parent.creation().get().unwrap().child_factory().clone();

        let child = DataNodeFactory::new()
            .make_data_node(Some(&parent), source(dir.path().join("a.txt")))
            .unwrap();
        let child_state = child.creation().get().unwrap();

        assert!(Arc::ptr_eq(child_state.child_factory(), &parent_factory));
        assert!(child_state.child_factory().debug());
        assert!(crate::same_node(&child_state.parent().unwrap(), &parent));
    }

    #[test]
    fn test_configure_data_node_sets_state_once() {
        let factory = DataNodeFactory::new();
        let node: NodeRef = Arc::new(crate::nodes::BranchDataNode::new("group", Vec::new()));

        factory.configure_data_node(&node, None, Some(source("archive/inner/group")));
        factory.configure_data_node(&node, None, Some(source("other")));

        assert_eq!(node.label(), "group");
        let state = node.creation().get().unwrap();
        assert_eq!(state.source().unwrap().as_text(), Some("archive/inner/group"));
        assert!(state.builder().is_none());
    }

    #[test]
    fn test_ftp_source_origin_is_directory_url() {
        let (label, origin) = describe_source(source("ftp://host/pub/data/file.fits").as_ref());
        assert_eq!(label.as_deref(), Some("file.fits"));
        assert_eq!(
            origin.unwrap().as_text(),
            Some("ftp://host/pub/data")
        );
    }

    #[test]
    fn test_last_path_element() {
        assert_eq!(last_path_element("c:\\data\\x.sdf").as_deref(), Some("x.sdf"));
        assert_eq!(last_path_element("a/b/"), None);
        assert_eq!(last_path_element("http://h/p/q.xml").as_deref(), Some("q.xml"));
    }

    #[test]
    fn test_fill_in_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("outer").join("inner");
        std::fs::create_dir_all(&nested).unwrap();

        let factory = DataNodeFactory::new();
        let node = factory.make_data_node(None, source(nested)).unwrap();
        factory.fill_in_ancestors(&node);

        let parent = crate::node::creation_parent(node.as_ref()).unwrap();
        assert_eq!(parent.label(), "outer");
        let grandparent = crate::node::creation_parent(parent.as_ref()).unwrap();
        assert_eq!(
            grandparent.label(),
            dir.path().file_name().unwrap().to_string_lossy()
        );
        assert!(crate::logical_path(&node).ends_with("outer/inner"));
    }

    #[test]
    fn test_display_lists_builders() {
        let text = DataNodeFactory::new().to_string();
        assert!(text.starts_with("DataNodeFactory with builders:\n"));
        assert!(text.contains("    path (generic)\n"));
        assert!(text.contains("    file -> File\n"));
    }
}
