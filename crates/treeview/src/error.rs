//! Error types for the tree model and node factory.

use std::fmt;
use std::path::PathBuf;

use treeview_core::CoreError;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`DataNodeTreeModel`](crate::DataNodeTreeModel) and
/// [`DataNodeFactory`](crate::DataNodeFactory).
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Strict lookup of a node that is not in the model.
    #[error("node '{node}' is not in the tree model")]
    NodeNotInModel { node: String },

    /// Attempt to insert a node that is already in the model.
    #[error("node '{node}' is already in the tree model")]
    NodeAlreadyInModel { node: String },

    /// A child position outside the parent's current child list.
    #[error("child index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    /// An operation that cannot be applied to the root node.
    #[error("cannot {op} the root node; use set_root instead")]
    RootOperation { op: &'static str },

    /// The factory could not make a node.
    #[error(transparent)]
    NoSuchData(#[from] NoSuchDataError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dispatch or threading failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TreeError {
    /// Create a NodeNotInModel error.
    pub fn not_in_model(node: impl fmt::Display) -> Self {
        Self::NodeNotInModel {
            node: node.to_string(),
        }
    }

    /// Create a NodeAlreadyInModel error.
    pub fn already_in_model(node: impl fmt::Display) -> Self {
        Self::NodeAlreadyInModel {
            node: node.to_string(),
        }
    }
}

/// No node could be made from some source object.
///
/// Carries an optional cause so error placeholders can show the full chain.
#[derive(Debug)]
pub struct NoSuchDataError {
    message: String,
    source: Option<BoxedSource>,
}

impl NoSuchDataError {
    /// Create an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error with a message and an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The error message, without the cause.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NoSuchDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for NoSuchDataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for NoSuchDataError {
    fn from(e: std::io::Error) -> Self {
        Self::with_source(e.to_string(), e)
    }
}

/// Errors loading a [`TreeViewConfig`](crate::TreeViewConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Render an error followed by its cause chain, one cause per line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut cause = error.source();
    while let Some(e) = cause {
        let line = e.to_string();
        if !text.contains(&line) {
            text.push_str("\ncaused by: ");
            text.push_str(&line);
        }
        cause = e.source();
    }
    text
}
