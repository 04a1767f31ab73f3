//! Background discovery of a node's children.
//!
//! A [`NodeExpander`] drains one node's child iterator and appends each
//! child to the model as it arrives. It checks before every append, under
//! the node's lock, that it is still the node's registered expander; an
//! expander that has been replaced (by a refresh, a removal, or a new
//! root) stops quietly.
//!
//! ```text
//! not started ──expand_node()──> running ──> stopped
//!      │                           │
//!      └────────stop()─────────────┴──> stopped (+ complete if exhausted)
//! ```
//!
//! Expanders are single-use. Re-expanding a node needs a fresh expander,
//! which [`DataNodeTreeModel::refresh_node`](super::DataNodeTreeModel::refresh_node)
//! arranges.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};
use treeview_core::logging::{panic_message, span_names, targets};

use super::model_node::ModelNode;
use super::tree_model::ModelInner;
use crate::error::NoSuchDataError;
use crate::factory::DataNodeFactory;
use crate::node::NodeRef;

/// How far a node's expansion has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpansionState {
    /// No expander has been attached yet.
    Unexpanded,
    /// An expander is attached and has not stopped.
    Expanding,
    /// The expander stopped before the child iterator ran out.
    Stopped,
    /// Every child has been appended.
    Complete,
}

impl ExpansionState {
    pub(crate) fn of(expander: Option<&NodeExpander>) -> Self {
        match expander {
            None => Self::Unexpanded,
            Some(e) if e.is_complete() => Self::Complete,
            Some(e) if e.is_stopped() => Self::Stopped,
            Some(_) => Self::Expanding,
        }
    }

    /// Whether expansion is still in progress.
    pub fn is_busy(self) -> bool {
        self == Self::Expanding
    }
}

impl fmt::Display for ExpansionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unexpanded => "unexpanded",
            Self::Expanding => "expanding",
            Self::Stopped => "stopped",
            Self::Complete => "complete",
        })
    }
}

/// Drains one node's children into a tree model.
pub struct NodeExpander {
    model: Weak<ModelInner>,
    target: Weak<ModelNode>,
    node_name: String,
    started: AtomicBool,
    stopped: AtomicBool,
    complete: AtomicBool,
    finished: Mutex<bool>,
    finished_cond: Condvar,
}

impl NodeExpander {
    pub(crate) fn new(model: Weak<ModelInner>, target: &Arc<ModelNode>) -> Self {
        Self {
            model,
            target: Arc::downgrade(target),
            node_name: target.node().name(),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            complete: AtomicBool::new(false),
            finished: Mutex::new(false),
            finished_cond: Condvar::new(),
        }
    }

    /// Name of the node being expanded.
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Ask the expander to stop at the next child boundary.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            debug!(target: targets::EXPANDER, node = %self.node_name, "expansion stop requested");
        }
        if !self.started.load(Ordering::Acquire) {
            self.mark_finished();
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Whether the child iterator was drained to the end.
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Block until the expander has finished running, or was stopped
    /// before it started.
    ///
    /// Returns `false` if `timeout` passed first.
    pub fn wait_until_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut finished = self.finished.lock();
        while !*finished {
            if self
                .finished_cond
                .wait_until(&mut finished, deadline)
                .timed_out()
            {
                return *finished;
            }
        }
        true
    }

    /// Expand the node on the calling thread.
    ///
    /// Runs at most once; later calls return immediately.
    pub fn expand_node(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let _span = tracing::debug_span!(
            target: targets::EXPANDER,
            "expand_node",
            name = span_names::EXPAND_NODE,
            node = %self.node_name
        )
        .entered();

        self.run();
        self.stopped.store(true, Ordering::Release);
        self.mark_finished();
    }

    fn run(&self) {
        if self.is_stopped() {
            debug!(target: targets::EXPANDER, "stopped before start");
            return;
        }
        let Some(target) = self.target.upgrade() else {
            return;
        };
        let node = target.node().clone();
        if !node.allows_children() {
            self.complete.store(true, Ordering::Release);
            return;
        }

        self.repaint(&target);

        let started = catch_unwind(AssertUnwindSafe(|| node.clone().children()));
        let mut children = match started {
            Ok(children) => children,
            Err(payload) => {
                self.append_failure(&target, &node, panic_message(payload.as_ref()));
                self.repaint(&target);
                return;
            }
        };

        let mut count = 0usize;
        loop {
            if self.is_stopped() {
                debug!(target: targets::EXPANDER, count, "expansion stopped");
                break;
            }
            match catch_unwind(AssertUnwindSafe(|| children.next())) {
                Ok(Some(child)) => {
                    if !self.append(&target, child) {
                        break;
                    }
                    count += 1;
                }
                Ok(None) => {
                    self.complete.store(true, Ordering::Release);
                    debug!(target: targets::EXPANDER, count, "expansion complete");
                    break;
                }
                Err(payload) => {
                    self.append_failure(&target, &node, panic_message(payload.as_ref()));
                    break;
                }
            }
        }
        drop(children);

        self.repaint(&target);
    }

    /// Append `child` if this expander is still current. Returns `false`
    /// once the expander should stop.
    fn append(&self, target: &Arc<ModelNode>, child: NodeRef) -> bool {
        let Some(model) = self.model.upgrade() else {
            self.stopped.store(true, Ordering::Release);
            return false;
        };

        let mut state = target.lock();
        if state.discarded || !state.is_current(self) {
            drop(state);
            self.stopped.store(true, Ordering::Release);
            debug!(target: targets::EXPANDER, "expander superseded");
            return false;
        }
        let index = state.children.len();
        match model.insert_locked(target, &mut state, child, index) {
            Ok(event) => model.fire(event),
            Err(e) => {
                drop(state);
                warn!(target: targets::EXPANDER, error = %e, "child skipped");
                return true;
            }
        }
        drop(state);
        trace!(target: targets::EXPANDER, "child appended");
        true
    }

    /// Turn a panicking child iterator into a trailing error placeholder.
    fn append_failure(&self, target: &Arc<ModelNode>, node: &NodeRef, message: String) {
        warn!(target: targets::EXPANDER, panic = %message, "child iteration panicked");
        let factory = node
            .creation()
            .get()
            .map(|c| c.child_factory().clone())
            .unwrap_or_else(|| Arc::new(DataNodeFactory::new()));
        let error = NoSuchDataError::new(format!(
            "Error reading children of {}: {message}",
            node.label()
        ));
        let placeholder = factory.make_error_node(Some(node), error);
        self.append(target, placeholder);
        self.stopped.store(true, Ordering::Release);
    }

    fn repaint(&self, target: &Arc<ModelNode>) {
        if let Some(model) = self.model.upgrade() {
            model.repaint(target);
        }
    }

    fn mark_finished(&self) {
        let mut finished = self.finished.lock();
        *finished = true;
        self.finished_cond.notify_all();
    }
}

impl fmt::Debug for NodeExpander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeExpander")
            .field("node", &self.node_name)
            .field("started", &self.is_started())
            .field("stopped", &self.is_stopped())
            .field("complete", &self.is_complete())
            .finish()
    }
}

static_assertions::assert_impl_all!(NodeExpander: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{BranchDataNode, FileDataNode};

    fn detached(node: NodeRef) -> (Arc<ModelNode>, NodeExpander) {
        let target = Arc::new(ModelNode::new(node, None));
        let expander = NodeExpander::new(Weak::new(), &target);
        (target, expander)
    }

    #[test]
    fn test_leaf_completes_immediately() {
        let (_target, expander) = detached(Arc::new(FileDataNode::new("/tmp/x")));
        expander.expand_node();

        assert!(expander.is_stopped());
        assert!(expander.is_complete());
        assert!(expander.wait_until_stopped(Duration::ZERO));
        assert_eq!(
            ExpansionState::of(Some(&expander)),
            ExpansionState::Complete
        );
    }

    #[test]
    fn test_stop_before_start() {
        let (_target, expander) = detached(Arc::new(BranchDataNode::new("b", Vec::new())));
        assert_eq!(
            ExpansionState::of(Some(&expander)),
            ExpansionState::Expanding
        );

        expander.stop();
        assert!(expander.wait_until_stopped(Duration::ZERO));

        expander.expand_node();
        assert!(!expander.is_complete());
        assert_eq!(ExpansionState::of(Some(&expander)), ExpansionState::Stopped);
    }

    #[test]
    fn test_wait_times_out_when_not_run() {
        let (_target, expander) = detached(Arc::new(BranchDataNode::new("b", Vec::new())));
        assert!(!expander.wait_until_stopped(Duration::from_millis(10)));
        assert_eq!(ExpansionState::of(None), ExpansionState::Unexpanded);
    }

    #[test]
    fn test_runs_only_once() {
        let (_target, expander) = detached(Arc::new(BranchDataNode::new("b", Vec::new())));
        expander.expand_node();
        assert!(expander.is_complete());

        // A second run does nothing and does not block.
        expander.expand_node();
        assert!(expander.is_started());
    }
}
