//! Provenance of factory-made nodes.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use super::{DataNodeFactory, SourceRef};
use crate::node::{DataNode, NodeRef};

/// Link from a node to the node it was made under.
///
/// A node that made its children may also hold them (a branch keeps its
/// child sources), so the usual link does not own the parent. Ancestors
/// built after the fact by [`DataNodeFactory::fill_in_ancestors`] have no
/// other owner and are held strongly.
enum ParentLink {
    Weak(Weak<dyn DataNode>),
    Owned(NodeRef),
}

impl ParentLink {
    fn get(&self) -> Option<NodeRef> {
        match self {
            Self::Weak(parent) => parent.upgrade(),
            Self::Owned(parent) => Some(parent.clone()),
        }
    }
}

/// Records how a node came to exist.
///
/// Set once on a node by [`DataNodeFactory::configure_data_node`] or
/// [`DataNodeFactory::make_data_node`]. The parent slot may be filled later by
/// [`DataNodeFactory::fill_in_ancestors`] when it was empty.
///
/// The parent recorded at creation is not kept alive by its children:
/// once every other handle to it is gone, [`parent`](Self::parent) returns
/// `None`.
pub struct CreationState {
    parent: OnceLock<ParentLink>,
    source: Option<SourceRef>,
    origin: Option<SourceRef>,
    label: Option<String>,
    child_factory: Arc<DataNodeFactory>,
    builder: Option<String>,
    factory_trace: Option<String>,
}

impl CreationState {
    pub(crate) fn new(
        parent: Option<&NodeRef>,
        source: Option<SourceRef>,
        child_factory: Arc<DataNodeFactory>,
    ) -> Self {
        let parent_slot = OnceLock::new();
        if let Some(parent) = parent {
            let _ = parent_slot.set(ParentLink::Weak(Arc::downgrade(parent)));
        }
        Self {
            parent: parent_slot,
            source,
            origin: None,
            label: None,
            child_factory,
            builder: None,
            factory_trace: None,
        }
    }

    pub(crate) fn with_origin(mut self, origin: Option<SourceRef>) -> Self {
        self.origin = origin;
        self
    }

    pub(crate) fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub(crate) fn with_builder(mut self, builder: &str, trace: Option<String>) -> Self {
        self.builder = Some(builder.to_string());
        self.factory_trace = trace;
        self
    }

    pub(crate) fn with_owned_parent(self, parent: NodeRef) -> Self {
        let _ = self.parent.set(ParentLink::Owned(parent));
        self
    }

    /// The node this one was made as a child of, while it is still alive.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.get().and_then(ParentLink::get)
    }

    /// Fill the parent slot with an ancestor this node owns, if the slot is
    /// still empty.
    pub(crate) fn set_owned_parent(&self, parent: NodeRef) -> bool {
        self.parent.set(ParentLink::Owned(parent)).is_ok()
    }

    /// The object the node was made from.
    pub fn source(&self) -> Option<&SourceRef> {
        self.source.as_ref()
    }

    /// The logical origin derived from the source.
    pub fn origin(&self) -> Option<&SourceRef> {
        self.origin.as_ref()
    }

    /// Display label derived from the source.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Factory the node should use to make its own children.
    pub fn child_factory(&self) -> &Arc<DataNodeFactory> {
        &self.child_factory
    }

    /// Name of the builder that made the node.
    pub fn builder(&self) -> Option<&str> {
        self.builder.as_deref()
    }

    /// Record of the builders tried, kept when the factory is in debug mode.
    pub fn factory_trace(&self) -> Option<&str> {
        self.factory_trace.as_deref()
    }
}

impl fmt::Debug for CreationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationState")
            .field("parent", &self.parent().map(|p| p.name()))
            .field("source", &self.source)
            .field("origin", &self.origin)
            .field("label", &self.label)
            .field("builder", &self.builder)
            .finish()
    }
}
