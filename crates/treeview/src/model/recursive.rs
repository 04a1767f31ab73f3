//! Eager expansion of a whole subtree.
//!
//! Walks depth-first, expanding each node on the walking thread before
//! descending into the children it produced. A node that another expander
//! is still working on is refreshed and expanded again, so when the walk
//! returns without being cancelled, every node below the start has been
//! fully expanded at least once.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::debug;
use treeview_core::logging::{PerfSpan, span_names, targets};
use treeview_core::{CancellationToken, CoreError};

use super::expander::NodeExpander;
use super::tree_model::DataNodeTreeModel;
use crate::error::{Result, TreeError};
use crate::node::NodeRef;

/// Thread name prefix for [`spawn_recursive_expand`].
pub const RECURSIVE_EXPANDER_PREFIX: &str = "Recursive expander";

type CurrentExpander = Arc<Mutex<Option<Arc<NodeExpander>>>>;

/// Expand `node` and everything below it on the calling thread.
///
/// Cancelling `token` stops the expander currently running and ends the
/// walk before the next node. Nodes removed from the model during the walk
/// are skipped.
pub fn recursive_expand(
    model: &DataNodeTreeModel,
    node: &NodeRef,
    token: &CancellationToken,
) -> Result<()> {
    let _span = tracing::debug_span!(
        target: targets::EXPANDER,
        "recursive_expand",
        name = span_names::RECURSIVE_EXPAND,
        node = %node.label()
    )
    .entered();
    let _perf = PerfSpan::new("recursive_expand");

    let current: CurrentExpander = Arc::new(Mutex::new(None));
    let on_cancel = current.clone();
    token.on_cancel(move || {
        if let Some(expander) = on_cancel.lock().as_ref() {
            expander.stop();
        }
    });

    expand_subtree(model, node, token, &current)?;
    if token.is_cancelled() {
        debug!(target: targets::EXPANDER, "recursive expansion cancelled");
    }
    Ok(())
}

fn expand_subtree(
    model: &DataNodeTreeModel,
    node: &NodeRef,
    token: &CancellationToken,
    current: &CurrentExpander,
) -> Result<()> {
    if token.is_cancelled() {
        return Ok(());
    }

    if let Some(expander) = model.claim_expansion(node)? {
        *current.lock() = Some(expander.clone());
        if token.is_cancelled() {
            expander.stop();
        }
        expander.expand_node();
        *current.lock() = None;
    }

    for child in model.current_children(node)? {
        if token.is_cancelled() {
            break;
        }
        match expand_subtree(model, &child, token, current) {
            Err(TreeError::NodeNotInModel { .. }) => {
                debug!(target: targets::EXPANDER, node = %child.label(), "node left the model, skipped");
            }
            other => other?,
        }
    }
    Ok(())
}

/// Run [`recursive_expand`] on a background thread named
/// `"Recursive expander: <node name>"`.
pub fn spawn_recursive_expand(
    model: &DataNodeTreeModel,
    node: &NodeRef,
) -> Result<RecursiveExpansion> {
    let name = format!("{RECURSIVE_EXPANDER_PREFIX}: {}", node.name());
    let token = CancellationToken::new();

    let (model, node, worker_token) = (model.clone(), node.clone(), token.clone());
    let handle = thread::Builder::new()
        .name(name.clone())
        .spawn(move || recursive_expand(&model, &node, &worker_token))
        .map_err(|e| CoreError::thread_spawn(name.clone(), e))?;

    Ok(RecursiveExpansion {
        name,
        token,
        handle,
    })
}

/// Handle to a background [`recursive_expand`].
///
/// Dropping the handle lets the walk carry on detached.
#[derive(Debug)]
pub struct RecursiveExpansion {
    name: String,
    token: CancellationToken,
    handle: JoinHandle<Result<()>>,
}

impl RecursiveExpansion {
    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the walk to stop as soon as possible.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the walk to end and return its outcome.
    pub fn join(self) -> Result<()> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(CoreError::ThreadPanicked { name: self.name }.into()),
        }
    }
}
