//! Cooperative cancellation for long-running background walks.
//!
//! ```
//! use treeview_core::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let worker_token = token.clone();
//!
//! token.cancel();
//! assert!(worker_token.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

type CancelCallback = Box<dyn FnOnce() + Send>;

/// A shared flag that requests a background task to stop.
///
/// Clones share state. Besides polling [`is_cancelled`](Self::is_cancelled),
/// a task can register a callback with [`on_cancel`](Self::on_cancel) to
/// interrupt something it is blocked on.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Default)]
struct CancellationState {
    cancelled: AtomicBool,
    callbacks: Mutex<Vec<CancelCallback>>,
}

impl CancellationToken {
    /// Create a new, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation and run any registered callbacks.
    ///
    /// Only the first call has an effect.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let callbacks = std::mem::take(&mut *self.inner.callbacks.lock());
        for callback in callbacks {
            callback();
        }
    }

    /// Register a callback to run on cancellation.
    ///
    /// If the token is already cancelled the callback runs immediately on the
    /// calling thread.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut callbacks = self.inner.callbacks.lock();
            if !self.is_cancelled() {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("callbacks", &self.inner.callbacks.lock().len())
            .finish()
    }
}
