//! Debug rendering of a tree model.
//!
//! [`TreeModelDebug`] prints what a model has materialised so far. It only
//! reads current children, so printing never starts an expansion.
//!
//! ```
//! use std::sync::Arc;
//! use treeview::logging::{TreeFormatOptions, TreeModelDebug, TreeStyle};
//! use treeview::nodes::BranchDataNode;
//! use treeview::{DataNodeTreeModel, NodeRef};
//!
//! let root: NodeRef = Arc::new(BranchDataNode::new("root", Vec::new()));
//! let model = DataNodeTreeModel::new(root.clone());
//! model.append_node(Arc::new(BranchDataNode::new("a", Vec::new())), &root).unwrap();
//!
//! let debug = TreeModelDebug::with_options(TreeFormatOptions {
//!     style: TreeStyle::Ascii,
//!     ..TreeFormatOptions::minimal()
//! });
//! assert_eq!(debug.format_subtree(&model, &root).unwrap(), "root\n`-- a\n");
//! ```

use std::fmt::Write;

use crate::error::{Result, TreeError};
use crate::model::DataNodeTreeModel;
use crate::node::NodeRef;

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Single line, children in parentheses.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node types.
    pub show_types: bool,
    /// Whether to show the expansion state of nodes that allow children.
    pub show_expansion: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_types: true,
            show_expansion: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for minimal output: labels only.
    pub fn minimal() -> Self {
        Self {
            show_types: false,
            show_expansion: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing a model's tree.
#[derive(Debug, Clone, Default)]
pub struct TreeModelDebug {
    options: TreeFormatOptions,
}

impl TreeModelDebug {
    /// Create a debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the whole model under a one-line header.
    pub fn format_model(&self, model: &DataNodeTreeModel) -> String {
        let mut output = String::new();
        writeln!(output, "Tree model ({} nodes):", model.node_count()).expect("write to String");
        self.render(model, &model.root(), &mut output);
        output
    }

    /// Format the subtree below `node`.
    pub fn format_subtree(&self, model: &DataNodeTreeModel, node: &NodeRef) -> Result<String> {
        if !model.contains_node(node) {
            return Err(TreeError::not_in_model(node.label()));
        }
        let mut output = String::new();
        self.render(model, node, &mut output);
        Ok(output)
    }

    fn render(&self, model: &DataNodeTreeModel, node: &NodeRef, output: &mut String) {
        if self.options.style == TreeStyle::Compact {
            self.compact_into(model, node, 0, output);
            output.push('\n');
        } else {
            self.subtree_into(model, node, &mut Vec::new(), output);
        }
    }

    /// Write one line per node. `last_flags` records, for each level below
    /// the starting node, whether the ancestor at that level was the last
    /// of its siblings.
    fn subtree_into(
        &self,
        model: &DataNodeTreeModel,
        node: &NodeRef,
        last_flags: &mut Vec<bool>,
        output: &mut String,
    ) {
        let depth = last_flags.len();
        if let Some(max) = self.options.max_depth
            && depth > max
        {
            return;
        }

        if let Some((&is_last, ancestors)) = last_flags.split_last() {
            for &ancestor_last in ancestors {
                output.push_str(&self.guide(ancestor_last));
            }
            output.push_str(&self.connector(is_last));
        }
        output.push_str(&self.describe(model, node));
        output.push('\n');

        let children = model.current_children(node).unwrap_or_default();
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            last_flags.push(i + 1 == count);
            self.subtree_into(model, child, last_flags, output);
            last_flags.pop();
        }
    }

    fn compact_into(
        &self,
        model: &DataNodeTreeModel,
        node: &NodeRef,
        depth: usize,
        output: &mut String,
    ) {
        output.push_str(&self.describe(model, node));
        if self.options.max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        let children = model.current_children(node).unwrap_or_default();
        if children.is_empty() {
            return;
        }
        output.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                output.push_str(", ");
            }
            self.compact_into(model, child, depth + 1, output);
        }
        output.push(')');
    }

    fn describe(&self, model: &DataNodeTreeModel, node: &NodeRef) -> String {
        let label = node.label();
        let mut text = if label.is_empty() {
            "(unnamed)".to_string()
        } else {
            label
        };
        if self.options.show_types {
            write!(text, " [{}]", node.node_type()).expect("write to String");
        }
        if self.options.show_expansion
            && node.allows_children()
            && let Ok(state) = model.expansion_state(node)
        {
            write!(text, " ({state})").expect("write to String");
        }
        text
    }

    fn connector(&self, is_last: bool) -> String {
        let (corner, last, dash) = match self.options.style {
            TreeStyle::Ascii => ('|', '`', "-"),
            _ => ('\u{251c}', '\u{2514}', "\u{2500}"),
        };
        let mut s = String::new();
        s.push(if is_last { last } else { corner });
        s.push_str(&dash.repeat(self.options.indent_size));
        s.push(' ');
        s
    }

    fn guide(&self, ancestor_last: bool) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => '|',
            _ => '\u{2502}',
        };
        let mut s = String::new();
        s.push(if ancestor_last { ' ' } else { branch });
        s.push_str(&" ".repeat(self.options.indent_size + 1));
        s
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use treeview_core::{DispatcherConfig, EventDispatcher};

    use super::*;
    use crate::config::ExpanderConfig;
    use crate::nodes::{BranchDataNode, FileDataNode};

    fn sample() -> (DataNodeTreeModel, NodeRef) {
        let root: NodeRef = Arc::new(BranchDataNode::new("root", Vec::new()));
        let dispatcher = EventDispatcher::new(DispatcherConfig::with_name("debug-test")).unwrap();
        let model =
            DataNodeTreeModel::with_dispatcher(root.clone(), Arc::new(dispatcher), ExpanderConfig::default());

        let a: NodeRef = Arc::new(BranchDataNode::new("a", Vec::new()));
        let b: NodeRef = Arc::new(FileDataNode::new("/data/b.txt"));
        let c: NodeRef = Arc::new(FileDataNode::new("/data/c.txt"));
        model.append_node(a.clone(), &root).unwrap();
        model.append_node(b, &root).unwrap();
        model.append_node(c, &a).unwrap();
        (model, root)
    }

    fn options(style: TreeStyle) -> TreeFormatOptions {
        TreeFormatOptions {
            style,
            ..TreeFormatOptions::minimal()
        }
    }

    #[test]
    fn test_ascii() {
        let (model, root) = sample();
        let text = TreeModelDebug::with_options(options(TreeStyle::Ascii))
            .format_subtree(&model, &root)
            .unwrap();
        assert_eq!(text, "root\n|-- a\n|   `-- c.txt\n`-- b.txt\n");
    }

    #[test]
    fn test_unicode() {
        let (model, root) = sample();
        let text = TreeModelDebug::with_options(options(TreeStyle::Unicode))
            .format_subtree(&model, &root)
            .unwrap();
        assert_eq!(
            text,
            "root\n\u{251c}\u{2500}\u{2500} a\n\u{2502}   \u{2514}\u{2500}\u{2500} c.txt\n\u{2514}\u{2500}\u{2500} b.txt\n"
        );
    }

    #[test]
    fn test_compact_and_depth_limit() {
        let (model, root) = sample();
        let debug = TreeModelDebug::with_options(options(TreeStyle::Compact));
        assert_eq!(
            debug.format_subtree(&model, &root).unwrap(),
            "root(a(c.txt), b.txt)\n"
        );

        let shallow = TreeModelDebug::with_options(TreeFormatOptions {
            max_depth: Some(1),
            ..options(TreeStyle::Ascii)
        });
        assert_eq!(
            shallow.format_subtree(&model, &root).unwrap(),
            "root\n|-- a\n`-- b.txt\n"
        );
    }

    #[test]
    fn test_types_and_expansion_state() {
        let (model, _) = sample();
        let text = TreeModelDebug::new().format_model(&model);

        assert!(text.starts_with("Tree model (4 nodes):\n"));
        assert!(text.contains("root [Branch] (unexpanded)"));
        assert!(text.contains("b.txt [File]\n"));
    }

    #[test]
    fn test_unknown_node() {
        let (model, _) = sample();
        let stranger: NodeRef = Arc::new(BranchDataNode::new("x", Vec::new()));
        assert!(TreeModelDebug::new().format_subtree(&model, &stranger).is_err());
    }
}
