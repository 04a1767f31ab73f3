//! Logging facilities shared by the treeview crates.
//!
//! Everything is instrumented with the `tracing` crate. Install a subscriber
//! in your application to see the output:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("treeview=debug,treeview_core=info")
//!     .init();
//! ```

use std::any::Any;

/// Span names used for tracing.
pub mod span_names {
    /// Draining the event-dispatch queue.
    pub const DISPATCH: &str = "treeview::dispatch";
    /// Expanding a single node's children.
    pub const EXPAND_NODE: &str = "treeview::expand_node";
    /// Walking and expanding a whole subtree.
    pub const RECURSIVE_EXPAND: &str = "treeview::recursive_expand";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core target.
    pub const CORE: &str = "treeview_core";
    /// Event-dispatch thread.
    pub const DISPATCH: &str = "treeview_core::dispatch";
    /// Signal delivery.
    pub const SIGNAL: &str = "treeview_core::signal";
    /// Tree model structure and events.
    pub const MODEL: &str = "treeview::model";
    /// Background child expansion.
    pub const EXPANDER: &str = "treeview::expander";
    /// Data node factory.
    pub const FACTORY: &str = "treeview::factory";
}

/// A span guard for timing an operation.
///
/// ```
/// use treeview_core::logging::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("load_directory");
///     // ... work ...
/// }
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span, active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "treeview::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Best-effort text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
