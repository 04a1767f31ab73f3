//! Error types for treeview-core.

use std::time::Duration;

/// Errors raised by the dispatch and threading layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The dispatcher has been shut down and no longer accepts work.
    #[error("event dispatcher '{name}' has been shut down")]
    DispatcherStopped { name: String },

    /// A background thread could not be started.
    #[error("failed to spawn thread '{name}': {source}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A background thread panicked before producing its result.
    #[error("thread '{name}' panicked")]
    ThreadPanicked { name: String },

    /// Waiting for queued work did not finish in time.
    #[error("timed out after {0:?} waiting for queued work")]
    Timeout(Duration),
}

impl CoreError {
    /// Create a ThreadSpawn error.
    pub fn thread_spawn(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::ThreadSpawn {
            name: name.into(),
            source,
        }
    }

    /// Create a DispatcherStopped error.
    pub fn dispatcher_stopped(name: impl Into<String>) -> Self {
        Self::DispatcherStopped { name: name.into() }
    }
}

/// A specialized Result type for treeview-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
