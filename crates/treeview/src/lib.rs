//! treeview - a lazily-expanding tree model over heterogeneous data.
//!
//! Browsable data (directories, files, container formats, anything that can
//! describe itself and list children) is exposed through the [`DataNode`]
//! trait. A [`DataNodeTreeModel`] presents those nodes through the queries a
//! tree view makes, and fetches each node's children on a background thread
//! the first time the view asks for them, so slow I/O never blocks the view.
//!
//! - [`node`]: the node contract and identity helpers
//! - [`model`]: the tree model, background expanders and model events
//! - [`factory`]: building nodes from source objects
//! - [`nodes`]: generic node variants (errors, directories, files, branches)
//! - [`config`]: TOML configuration
//! - [`logging`]: debug rendering of a model's tree
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use treeview::factory::{DataNodeFactory, source};
//! use treeview::logging::TreeModelDebug;
//! use treeview::{DataNodeTreeModel, recursive_expand};
//! use treeview_core::CancellationToken;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = DataNodeFactory::new();
//!     let root = factory.make_data_node(None, source(PathBuf::from("/data")))?;
//!
//!     let model = DataNodeTreeModel::new(root.clone());
//!     recursive_expand(&model, &root, &CancellationToken::new())?;
//!     model.flush_events()?;
//!
//!     print!("{}", TreeModelDebug::new().format_model(&model));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod factory;
pub mod logging;
pub mod model;
pub mod node;
pub mod nodes;

pub use config::{DispatchSettings, ExpanderConfig, FactoryConfig, TreeViewConfig};
pub use error::{ConfigError, NoSuchDataError, Result, TreeError};
pub use factory::{DataNodeBuilder, DataNodeFactory, NodeSource, SourceRef, source};
pub use model::{
    DataNodeTreeModel, ExpansionState, ModelNode, NodeExpander, RecursiveExpansion,
    TreeModelEvent, recursive_expand, spawn_recursive_expand,
};
pub use node::{
    ChildIter, CreationCell, DataNode, NodeIcon, NodeRef, creation_parent, logical_path,
    same_node,
};
