//! The lazily-expanding tree model.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::thread;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, trace, warn};
use treeview_core::logging::targets;
use treeview_core::{EventDispatcher, Signal};

use super::event::TreeModelEvent;
use super::expander::{ExpansionState, NodeExpander};
use super::model_node::{ModelNode, ModelNodeState};
use crate::config::{ExpanderConfig, TreeViewConfig};
use crate::error::{Result, TreeError};
use crate::node::{NodeKey, NodeRef};
use crate::nodes::EmptyDataNode;

/// Shared state behind every clone of a [`DataNodeTreeModel`].
///
/// Locks are always taken in the order root, node, identity map, and a
/// node lock is never held while another node's lock is taken.
///
/// Events are queued while the lock guarding the change is still held, so
/// listeners see changes to a node's children in the order they were made.
/// Queueing never runs a slot on the calling thread.
pub(crate) struct ModelInner {
    root: RwLock<Arc<ModelNode>>,
    nodes: Mutex<HashMap<NodeKey, Arc<ModelNode>>>,
    dispatcher: Arc<EventDispatcher>,
    events: Arc<Signal<TreeModelEvent>>,
    expander_config: ExpanderConfig,
}

impl ModelInner {
    fn lookup(&self, node: &NodeRef) -> Option<Arc<ModelNode>> {
        self.nodes.lock().get(&NodeKey::of(node)).cloned()
    }

    fn model_node(&self, node: &NodeRef) -> Result<Arc<ModelNode>> {
        self.lookup(node)
            .ok_or_else(|| TreeError::not_in_model(node.label()))
    }

    fn is_root(&self, record: &Arc<ModelNode>) -> bool {
        Arc::ptr_eq(&self.root.read(), record)
    }

    fn register(&self, record: &Arc<ModelNode>) -> Result<()> {
        match self.nodes.lock().entry(NodeKey::of(record.node())) {
            Entry::Occupied(_) => Err(TreeError::already_in_model(record.node().label())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    /// Insert `child` at `index` under `parent`, whose lock the caller holds
    /// as `state`.
    pub(crate) fn insert_locked(
        &self,
        parent: &Arc<ModelNode>,
        state: &mut ModelNodeState,
        child: NodeRef,
        index: usize,
    ) -> Result<TreeModelEvent> {
        if state.discarded {
            return Err(TreeError::not_in_model(parent.node().label()));
        }
        let len = state.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        let record = Arc::new(ModelNode::new(child.clone(), Some(parent)));
        self.register(&record)?;
        state.children.insert(index, record);

        Ok(TreeModelEvent::NodesInserted {
            path: parent.path(),
            indices: vec![index],
            children: vec![child],
        })
    }

    /// Drop `record` and its whole subtree from the model, stopping every
    /// expander on the way.
    ///
    /// Each node's lock is held only for its own bookkeeping. The map entry
    /// is removed only if it still refers to `record`, so a node that has
    /// been re-housed keeps its new record.
    fn discard(&self, record: &Arc<ModelNode>) {
        let (children, expander) = {
            let mut state = record.lock();
            state.discarded = true;
            (std::mem::take(&mut state.children), state.expander.take())
        };
        if let Some(expander) = expander {
            expander.stop();
        }
        for child in &children {
            self.discard(child);
        }

        let key = NodeKey::of(record.node());
        let mut nodes = self.nodes.lock();
        if nodes.get(&key).is_some_and(|r| Arc::ptr_eq(r, record)) {
            nodes.remove(&key);
        }
    }

    /// Queue `event` for delivery on the dispatch thread. Safe to call with
    /// node locks held.
    pub(crate) fn fire(&self, event: TreeModelEvent) {
        trace!(target: targets::MODEL, kind = event.kind(), "queueing model event");
        if let Err(e) = self.events.emit_queued(&self.dispatcher, event) {
            warn!(target: targets::MODEL, error = %e, "model event dropped");
        }
    }

    /// Fire a nodes-changed event for `record`. The root has no parent row
    /// to repaint and is skipped.
    pub(crate) fn repaint(&self, record: &Arc<ModelNode>) {
        let Some(parent) = record.parent() else {
            return;
        };
        let state = parent.lock();
        let Some(index) = state.position_of(record) else {
            return;
        };
        self.fire(TreeModelEvent::NodesChanged {
            path: parent.path(),
            indices: vec![index],
            children: vec![record.node().clone()],
        });
    }
}

impl Drop for ModelInner {
    fn drop(&mut self) {
        for record in self.nodes.get_mut().values() {
            if let Some(expander) = &record.lock().expander {
                expander.stop();
            }
        }
    }
}

/// A tree model over [`DataNode`](crate::DataNode)s whose children are
/// discovered in the background.
///
/// Asking for a node's [`child_count`](Self::child_count) for the first
/// time starts a [`NodeExpander`] on its own thread. The count returned is
/// whatever has been found so far; listeners connected to
/// [`events`](Self::events) hear about each child as it is added.
///
/// Every node appears at most once. Identity is by reference, so the same
/// data described by two node instances occupies two positions.
///
/// The model is a cheap handle; clones share the same tree.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use treeview::{DataNodeTreeModel, NodeRef, TreeModelEvent};
/// use treeview::nodes::DirectoryDataNode;
///
/// let root: NodeRef = Arc::new(DirectoryDataNode::new("/data"));
/// let model = DataNodeTreeModel::new(root.clone());
///
/// model.events().connect(|event: &TreeModelEvent| {
///     println!("{event:?}");
/// });
///
/// // Starts expansion; children arrive asynchronously.
/// let _ = model.child_count(&root).unwrap();
/// ```
#[derive(Clone)]
pub struct DataNodeTreeModel {
    inner: Arc<ModelInner>,
}

static_assertions::assert_impl_all!(DataNodeTreeModel: Send, Sync, Clone);

impl DataNodeTreeModel {
    /// Create a model using the global dispatcher and default settings.
    pub fn new(root: NodeRef) -> Self {
        Self::with_dispatcher(root, EventDispatcher::global(), ExpanderConfig::default())
    }

    /// Create a model from a configuration.
    ///
    /// Starts the global dispatcher with the configured settings if it is
    /// not running yet.
    pub fn with_config(root: NodeRef, config: &TreeViewConfig) -> Result<Self> {
        let dispatcher = EventDispatcher::init_global((&config.dispatcher).into())?;
        Ok(Self::with_dispatcher(root, dispatcher, config.expander.clone()))
    }

    /// Create a model that delivers its events through `dispatcher`.
    pub fn with_dispatcher(
        root: NodeRef,
        dispatcher: Arc<EventDispatcher>,
        expander_config: ExpanderConfig,
    ) -> Self {
        let record = Arc::new(ModelNode::new(root.clone(), None));
        let mut nodes = HashMap::new();
        nodes.insert(NodeKey::of(&root), record.clone());
        debug!(target: targets::MODEL, root = %root.label(), "tree model created");

        Self {
            inner: Arc::new(ModelInner {
                root: RwLock::new(record),
                nodes: Mutex::new(nodes),
                dispatcher,
                events: Arc::new(Signal::new()),
                expander_config,
            }),
        }
    }

    /// The dispatcher events are delivered through.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.inner.dispatcher
    }

    /// Model change notifications, emitted on the dispatch thread.
    pub fn events(&self) -> &Signal<TreeModelEvent> {
        &self.inner.events
    }

    /// Block until every event queued so far has been delivered.
    ///
    /// On the dispatch thread this returns at once; events queued from a
    /// slot are delivered after it returns.
    pub fn flush_events(&self) -> Result<()> {
        Ok(self.inner.dispatcher.flush()?)
    }

    /// The root node.
    pub fn root(&self) -> NodeRef {
        self.inner.root.read().node().clone()
    }

    // =========================================================================
    // Structure queries
    // =========================================================================

    /// Number of children of `parent` found so far.
    ///
    /// The first call for a node starts its expansion in the background.
    /// Later calls only report the current count.
    pub fn child_count(&self, parent: &NodeRef) -> Result<usize> {
        let record = self.inner.model_node(parent)?;
        let (count, started) = {
            let mut state = record.lock();
            let started = if state.expander.is_none() && !state.discarded {
                let expander = Arc::new(NodeExpander::new(Arc::downgrade(&self.inner), &record));
                state.expander = Some(expander.clone());
                Some(expander)
            } else {
                None
            };
            (state.children.len(), started)
        };

        if let Some(expander) = started {
            self.start_expander(&record, expander);
        }
        Ok(count)
    }

    fn start_expander(&self, record: &Arc<ModelNode>, expander: Arc<NodeExpander>) {
        // Leaves finish without touching the node's children.
        if !record.node().allows_children() {
            expander.expand_node();
            return;
        }

        let config = &self.inner.expander_config;
        let name = config.thread_name(expander.node_name());
        let mut builder = thread::Builder::new().name(name.clone());
        if config.stack_size > 0 {
            builder = builder.stack_size(config.stack_size);
        }

        let runner = expander.clone();
        match builder.spawn(move || runner.expand_node()) {
            Ok(_) => debug!(target: targets::MODEL, thread = %name, "expander started"),
            Err(e) => {
                error!(target: targets::MODEL, thread = %name, error = %e, "failed to start expander thread");
                expander.stop();
                let mut state = record.lock();
                if state.is_current(&expander) {
                    state.expander = None;
                }
            }
        }
    }

    /// The child of `parent` at `index` in its current child list.
    pub fn child(&self, parent: &NodeRef, index: usize) -> Result<NodeRef> {
        let record = self.inner.model_node(parent)?;
        let state = record.lock();
        state
            .children
            .get(index)
            .map(|c| c.node().clone())
            .ok_or(TreeError::IndexOutOfRange {
                index,
                len: state.children.len(),
            })
    }

    /// Position of `child` under `parent`.
    ///
    /// `None` if either node is not in the model, or `child` is not
    /// currently a child of `parent`.
    pub fn index_of_child(&self, parent: &NodeRef, child: &NodeRef) -> Option<usize> {
        let parent_record = self.inner.lookup(parent)?;
        let child_record = self.inner.lookup(child)?;
        parent_record.lock().position_of(&child_record)
    }

    /// Whether `node` is drawn as a leaf.
    pub fn is_leaf(&self, node: &NodeRef) -> bool {
        !node.allows_children()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert `child` under `parent` at `index`.
    pub fn insert_node(&self, child: NodeRef, parent: &NodeRef, index: usize) -> Result<()> {
        let record = self.inner.model_node(parent)?;
        let mut state = record.lock();
        let event = self.inner.insert_locked(&record, &mut state, child, index)?;
        self.inner.fire(event);
        Ok(())
    }

    /// Add `child` after the current last child of `parent`.
    pub fn append_node(&self, child: NodeRef, parent: &NodeRef) -> Result<()> {
        let record = self.inner.model_node(parent)?;
        let mut state = record.lock();
        let index = state.children.len();
        let event = self.inner.insert_locked(&record, &mut state, child, index)?;
        self.inner.fire(event);
        Ok(())
    }

    /// Remove `node` and everything below it.
    pub fn remove_node(&self, node: &NodeRef) -> Result<()> {
        let record = self.inner.model_node(node)?;
        if self.inner.is_root(&record) {
            return Err(TreeError::RootOperation { op: "remove" });
        }
        let parent = record
            .parent()
            .ok_or_else(|| TreeError::not_in_model(node.label()))?;

        self.inner.discard(&record);
        let mut state = parent.lock();
        let index = state
            .position_of(&record)
            .ok_or_else(|| TreeError::not_in_model(node.label()))?;
        state.children.remove(index);
        self.inner.fire(TreeModelEvent::NodesRemoved {
            path: parent.path(),
            indices: vec![index],
            children: vec![node.clone()],
        });
        drop(state);

        debug!(target: targets::MODEL, node = %node.label(), index, "node removed");
        Ok(())
    }

    /// Put `new` in place of `old`, dropping `old`'s subtree.
    pub fn replace_node(&self, old: &NodeRef, new: NodeRef) -> Result<()> {
        let record = self.inner.model_node(old)?;
        if self.inner.is_root(&record) {
            return Err(TreeError::RootOperation { op: "replace" });
        }
        let parent = record
            .parent()
            .ok_or_else(|| TreeError::not_in_model(old.label()))?;

        let replacement = Arc::new(ModelNode::new(new, Some(&parent)));
        {
            let mut state = parent.lock();
            if state.discarded {
                return Err(TreeError::not_in_model(parent.node().label()));
            }
            let index = state
                .position_of(&record)
                .ok_or_else(|| TreeError::not_in_model(old.label()))?;
            self.inner.register(&replacement)?;
            state.children[index] = replacement.clone();
            self.inner.fire(TreeModelEvent::StructureChanged {
                path: replacement.path(),
            });
        }
        self.inner.discard(&record);

        debug!(target: targets::MODEL, old = %old.label(), new = %replacement.node().label(), "node replaced");
        Ok(())
    }

    /// Replace the node at the end of `path`.
    pub fn set_value_for_path(&self, path: &[NodeRef], new: NodeRef) -> Result<()> {
        let old = path
            .last()
            .ok_or_else(|| TreeError::not_in_model("(empty path)"))?;
        self.replace_node(old, new)
    }

    /// Discard the whole tree and start again from `root`.
    pub fn set_root(&self, root: NodeRef) -> Result<()> {
        let replacement = Arc::new(ModelNode::new(root.clone(), None));
        {
            let mut current = self.inner.root.write();
            self.inner.discard(&current);
            self.inner.register(&replacement)?;
            *current = replacement;
            self.inner.fire(TreeModelEvent::StructureChanged {
                path: vec![root.clone()],
            });
        }

        debug!(target: targets::MODEL, root = %root.label(), "root replaced");
        Ok(())
    }

    /// Forget `node`'s children so that the next
    /// [`child_count`](Self::child_count) expands it again from scratch.
    ///
    /// The node keeps its position but gets a new record, which detaches
    /// any expander still running on the old one.
    pub fn refresh_node(&self, node: &NodeRef) -> Result<()> {
        let record = self.inner.model_node(node)?;

        if self.inner.is_root(&record) {
            let mut current = self.inner.root.write();
            if !Arc::ptr_eq(&current, &record) {
                return Err(TreeError::not_in_model(node.label()));
            }
            let replacement = Arc::new(ModelNode::new(node.clone(), None));
            self.inner
                .nodes
                .lock()
                .insert(NodeKey::of(node), replacement.clone());
            *current = replacement;
            self.inner.fire(TreeModelEvent::StructureChanged {
                path: vec![node.clone()],
            });
        } else {
            let parent = record
                .parent()
                .ok_or_else(|| TreeError::not_in_model(node.label()))?;
            let replacement = Arc::new(ModelNode::new(node.clone(), Some(&parent)));
            let mut state = parent.lock();
            if state.discarded {
                return Err(TreeError::not_in_model(parent.node().label()));
            }
            let index = state
                .position_of(&record)
                .ok_or_else(|| TreeError::not_in_model(node.label()))?;
            state.children[index] = replacement.clone();
            self.inner
                .nodes
                .lock()
                .insert(NodeKey::of(node), replacement.clone());
            self.inner.fire(TreeModelEvent::StructureChanged {
                path: replacement.path(),
            });
        }
        self.inner.discard(&record);

        debug!(target: targets::MODEL, node = %node.label(), "node refreshed");
        Ok(())
    }

    /// Tell listeners that `node` should be redrawn.
    pub fn repaint_node(&self, node: &NodeRef) -> Result<()> {
        let record = self.inner.model_node(node)?;
        self.inner.repaint(&record);
        Ok(())
    }

    /// Ask any running expansion of `node` to stop.
    pub fn stop_expansion(&self, node: &NodeRef) -> Result<()> {
        let record = self.inner.model_node(node)?;
        if let Some(expander) = record.expander()
            && !expander.is_stopped()
        {
            expander.stop();
        }
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn contains_node(&self, node: &NodeRef) -> bool {
        self.inner.lookup(node).is_some()
    }

    /// Number of nodes in the model, root included.
    pub fn node_count(&self) -> usize {
        self.inner.nodes.lock().len()
    }

    /// The model's record for `node`.
    pub fn model_node(&self, node: &NodeRef) -> Result<Arc<ModelNode>> {
        self.inner.model_node(node)
    }

    /// Nodes from the root down to `node`, or `None` if it is not in the
    /// model.
    pub fn path_to_root(&self, node: &NodeRef) -> Option<Vec<NodeRef>> {
        self.inner.lookup(node).map(|record| record.path())
    }

    /// The children found so far, without starting expansion.
    pub fn current_children(&self, node: &NodeRef) -> Result<Vec<NodeRef>> {
        Ok(self.inner.model_node(node)?.children())
    }

    /// The expander attached to `node`, if expansion has been started.
    pub fn expander(&self, node: &NodeRef) -> Result<Option<Arc<NodeExpander>>> {
        Ok(self.inner.model_node(node)?.expander())
    }

    pub fn expansion_state(&self, node: &NodeRef) -> Result<ExpansionState> {
        let expander = self.expander(node)?;
        Ok(ExpansionState::of(expander.as_deref()))
    }

    /// Attach a fresh expander to `node` for the caller to run.
    ///
    /// `None` if the node has already been fully expanded. An unfinished
    /// expansion is thrown away and the node refreshed first.
    pub(crate) fn claim_expansion(&self, node: &NodeRef) -> Result<Option<Arc<NodeExpander>>> {
        loop {
            let record = self.inner.model_node(node)?;
            {
                let mut state = record.lock();
                if state.discarded {
                    return Err(TreeError::not_in_model(node.label()));
                }
                match state.expander.as_ref().map(|e| e.is_complete()) {
                    None => {
                        let expander =
                            Arc::new(NodeExpander::new(Arc::downgrade(&self.inner), &record));
                        state.expander = Some(expander.clone());
                        return Ok(Some(expander));
                    }
                    Some(true) => return Ok(None),
                    Some(false) => {}
                }
            }
            debug!(target: targets::EXPANDER, node = %node.label(), "discarding unfinished expansion");
            self.refresh_node(node)?;
        }
    }
}

impl Default for DataNodeTreeModel {
    fn default() -> Self {
        Self::new(Arc::new(EmptyDataNode::new()))
    }
}

impl fmt::Debug for DataNodeTreeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataNodeTreeModel")
            .field("root", &self.root().label())
            .field("nodes", &self.node_count())
            .field("dispatcher", &self.inner.dispatcher.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use treeview_core::DispatcherConfig;

    use super::*;
    use crate::factory::source;
    use crate::nodes::{BranchDataNode, FileDataNode};

    fn model(root: &NodeRef) -> DataNodeTreeModel {
        let dispatcher = EventDispatcher::new(DispatcherConfig::with_name("model-test")).unwrap();
        DataNodeTreeModel::with_dispatcher(
            root.clone(),
            Arc::new(dispatcher),
            ExpanderConfig::default(),
        )
    }

    fn branch(name: &str) -> NodeRef {
        Arc::new(BranchDataNode::new(name, Vec::new()))
    }

    fn branch_of(name: &str, children: &[&NodeRef]) -> NodeRef {
        let sources = children.iter().map(|c| source((*c).clone())).collect();
        Arc::new(BranchDataNode::new(name, sources))
    }

    fn expand(model: &DataNodeTreeModel, node: &NodeRef) {
        model.child_count(node).unwrap();
        let expander = model.expander(node).unwrap().unwrap();
        assert!(expander.wait_until_stopped(Duration::from_secs(5)));
    }

    #[test]
    fn test_new_model_holds_root() {
        let root = branch("root");
        let model = model(&root);

        assert!(crate::same_node(&model.root(), &root));
        assert!(model.contains_node(&root));
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.path_to_root(&root).unwrap().len(), 1);
        assert_eq!(
            model.expansion_state(&root).unwrap(),
            ExpansionState::Unexpanded
        );
    }

    #[test]
    fn test_insert_and_lookup() {
        let root = branch("root");
        let model = model(&root);
        let (a, b, c) = (branch("a"), branch("b"), branch("c"));

        model.append_node(a.clone(), &root).unwrap();
        model.append_node(c.clone(), &root).unwrap();
        model.insert_node(b.clone(), &root, 1).unwrap();

        let names: Vec<String> = model
            .current_children(&root)
            .unwrap()
            .iter()
            .map(|n| n.name())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(model.index_of_child(&root, &c), Some(2));
        assert!(crate::same_node(&model.child(&root, 1).unwrap(), &b));
        assert_eq!(model.node_count(), 4);

        let path = model.path_to_root(&b).unwrap();
        assert!(crate::same_node(&path[0], &root));
        assert!(crate::same_node(&path[1], &b));
    }

    #[test]
    fn test_insert_errors() {
        let root = branch("root");
        let model = model(&root);
        let a = branch("a");
        model.append_node(a.clone(), &root).unwrap();

        assert!(matches!(
            model.append_node(a.clone(), &root),
            Err(TreeError::NodeAlreadyInModel { .. })
        ));
        assert!(matches!(
            model.insert_node(branch("x"), &root, 5),
            Err(TreeError::IndexOutOfRange { index: 5, len: 1 })
        ));
        assert!(matches!(
            model.append_node(branch("y"), &branch("stranger")),
            Err(TreeError::NodeNotInModel { .. })
        ));
        assert!(matches!(
            model.child(&root, 1),
            Err(TreeError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_remove_discards_subtree() {
        let root = branch("root");
        let model = model(&root);
        let (x, y, z) = (branch("x"), branch("y"), branch("z"));
        model.append_node(x.clone(), &root).unwrap();
        model.append_node(y.clone(), &x).unwrap();
        model.append_node(z.clone(), &y).unwrap();

        model.remove_node(&x).unwrap();

        assert!(!model.contains_node(&x));
        assert!(!model.contains_node(&y));
        assert!(!model.contains_node(&z));
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.index_of_child(&root, &x), None);
        assert!(model.path_to_root(&z).is_none());
    }

    #[test]
    fn test_root_operations_rejected() {
        let root = branch("root");
        let model = model(&root);

        assert!(matches!(
            model.remove_node(&root),
            Err(TreeError::RootOperation { op: "remove" })
        ));
        assert!(matches!(
            model.replace_node(&root, branch("other")),
            Err(TreeError::RootOperation { op: "replace" })
        ));
    }

    #[test]
    fn test_replace_keeps_position() {
        let root = branch("root");
        let model = model(&root);
        let (a, b, c) = (branch("a"), branch("b"), branch("c"));
        model.append_node(a.clone(), &root).unwrap();
        model.append_node(b.clone(), &root).unwrap();
        let below_b = branch("below-b");
        model.append_node(below_b.clone(), &b).unwrap();

        model.set_value_for_path(&[root.clone(), b.clone()], c.clone()).unwrap();

        assert_eq!(model.index_of_child(&root, &c), Some(1));
        assert!(!model.contains_node(&b));
        assert!(!model.contains_node(&below_b));
        assert_eq!(model.node_count(), 3);
    }

    #[test]
    fn test_set_root_discards_everything() {
        let root = branch("root");
        let model = model(&root);
        let a = branch("a");
        model.append_node(a.clone(), &root).unwrap();

        let new_root = branch("new");
        model.set_root(new_root.clone()).unwrap();

        assert!(crate::same_node(&model.root(), &new_root));
        assert!(!model.contains_node(&root));
        assert!(!model.contains_node(&a));
        assert_eq!(model.node_count(), 1);
    }

    #[test]
    fn test_expansion_appends_in_order() {
        let (a, b, c) = (branch("a"), branch("b"), branch("c"));
        let root = branch_of("root", &[&a, &b, &c]);
        let model = model(&root);

        assert_eq!(model.child_count(&root).unwrap(), 0);
        expand(&model, &root);

        assert_eq!(model.child_count(&root).unwrap(), 3);
        for (i, node) in [&a, &b, &c].into_iter().enumerate() {
            assert!(crate::same_node(&model.child(&root, i).unwrap(), node));
        }
        assert_eq!(
            model.expansion_state(&root).unwrap(),
            ExpansionState::Complete
        );
    }

    #[test]
    fn test_leaf_expands_inline() {
        let root = branch("root");
        let model = model(&root);
        let leaf: NodeRef = Arc::new(FileDataNode::new("/tmp/leaf"));
        model.append_node(leaf.clone(), &root).unwrap();

        assert!(model.is_leaf(&leaf));
        assert_eq!(model.child_count(&leaf).unwrap(), 0);
        assert_eq!(
            model.expansion_state(&leaf).unwrap(),
            ExpansionState::Complete
        );
    }

    #[test]
    fn test_refresh_root_rehouses_root() {
        let a = branch("a");
        let root = branch_of("root", &[&a]);
        let model = model(&root);
        expand(&model, &root);
        let before = model.model_node(&root).unwrap();

        model.refresh_node(&root).unwrap();

        let after = model.model_node(&root).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.is_discarded());
        assert!(crate::same_node(&model.root(), &root));
        assert!(model.current_children(&root).unwrap().is_empty());
        assert!(!model.contains_node(&a));
        assert_eq!(
            model.expansion_state(&root).unwrap(),
            ExpansionState::Unexpanded
        );

        expand(&model, &root);
        assert_eq!(model.child_count(&root).unwrap(), 1);
    }

    #[test]
    fn test_events_follow_mutations() {
        let root = branch("root");
        let model = model(&root);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        model.events().connect(move |event: &TreeModelEvent| {
            sink.lock().push(event.kind());
        });

        let a = branch("a");
        model.append_node(a.clone(), &root).unwrap();
        model.repaint_node(&a).unwrap();
        model.repaint_node(&root).unwrap();
        model.refresh_node(&a).unwrap();
        model.remove_node(&a).unwrap();
        model.flush_events().unwrap();

        assert_eq!(
            *seen.lock(),
            [
                "nodes_inserted",
                "nodes_changed",
                "structure_changed",
                "nodes_removed"
            ]
        );
    }

    #[test]
    fn test_claim_expansion() {
        let a = branch("a");
        let root = branch_of("root", &[&a]);
        let model = model(&root);

        let first = model.claim_expansion(&root).unwrap().unwrap();
        // Unfinished: the next claim refreshes and hands out a new one.
        let second = model.claim_expansion(&root).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(first.is_stopped());

        second.expand_node();
        assert!(second.is_complete());
        assert!(model.claim_expansion(&root).unwrap().is_none());
        assert_eq!(model.current_children(&root).unwrap().len(), 1);
    }
}
