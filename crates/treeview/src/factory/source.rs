//! Objects that nodes can be made from.

use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Anything a [`DataNodeBuilder`](super::DataNodeBuilder) might turn into a node.
///
/// Implemented for every `Any + Debug + Send + Sync` type: paths, strings,
/// errors, nodes, arbitrary payloads.
pub trait NodeSource: Any + fmt::Debug + Send + Sync {
    #[doc(hidden)]
    fn source_as_any(&self) -> &dyn Any;

    #[doc(hidden)]
    fn source_type_name(&self) -> &'static str;
}

impl<T: Any + fmt::Debug + Send + Sync> NodeSource for T {
    fn source_as_any(&self) -> &dyn Any {
        self
    }

    fn source_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn NodeSource {
    /// Downcast to a concrete source type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.source_as_any().downcast_ref::<T>()
    }

    /// Whether the source is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.source_as_any().is::<T>()
    }

    /// Rust type name of the source.
    pub fn type_name(&self) -> &'static str {
        self.source_type_name()
    }

    /// The source as a filesystem path, if it is a path-like value.
    pub fn as_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.downcast_ref::<PathBuf>() {
            Some(path.clone())
        } else {
            self.as_text().map(PathBuf::from)
        }
    }

    /// The source as text, if it is a string value.
    pub fn as_text(&self) -> Option<&str> {
        if let Some(s) = self.downcast_ref::<String>() {
            Some(s.as_str())
        } else {
            self.downcast_ref::<&'static str>().copied()
        }
    }
}

/// Shared handle to a node source.
pub type SourceRef = Arc<dyn NodeSource>;

/// Wrap a value as a [`SourceRef`].
pub fn source<T: NodeSource>(value: T) -> SourceRef {
    Arc::new(value)
}
