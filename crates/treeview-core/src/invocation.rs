//! Queued invocations for cross-thread delivery.
//!
//! A [`QueuedInvocation`] wraps a closure that must run on another thread
//! (in practice the event-dispatch thread). Blocking callers pair it with a
//! [`CompletionWaiter`] so they can wait until the closure has finished.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A type-erased closure waiting to be executed on its target thread.
pub struct QueuedInvocation {
    invoke: Box<dyn FnOnce() + Send>,
    completion: Option<CompletionHandle>,
}

impl QueuedInvocation {
    /// Create a new queued invocation.
    pub fn new<F>(invoke: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            invoke: Box::new(invoke),
            completion: None,
        }
    }

    /// Create a queued invocation that signals `completion` once it has run.
    pub fn with_completion<F>(invoke: F, completion: CompletionHandle) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            invoke: Box::new(invoke),
            completion: Some(completion),
        }
    }

    /// Execute the invocation.
    ///
    /// The completion handle is signalled even if the closure panics, so a
    /// waiter is never left blocked by a failing listener.
    pub fn execute(self) {
        let Self { invoke, completion } = self;
        let _done = completion.map(CompletionGuard);
        invoke();
    }
}

impl std::fmt::Debug for QueuedInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedInvocation")
            .field("blocking", &self.completion.is_some())
            .finish()
    }
}

/// Signals its handle when dropped, including during unwinding.
struct CompletionGuard(CompletionHandle);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.inner.signal_done();
    }
}

/// The sending half of a completion pair.
#[derive(Debug)]
pub struct CompletionHandle {
    inner: Arc<CompletionState>,
}

impl CompletionHandle {
    /// Mark the associated work as done.
    pub fn signal_done(self) {
        self.inner.signal_done();
    }
}

/// The waiting half of a completion pair.
#[derive(Debug)]
pub struct CompletionWaiter {
    inner: Arc<CompletionState>,
}

impl CompletionWaiter {
    /// Block until the associated work is done.
    ///
    /// # Warning
    ///
    /// Waiting on the dispatch thread for work queued to that same thread
    /// deadlocks. [`crate::EventDispatcher`] runs such work inline instead.
    pub fn wait(self) {
        let mut done = self.inner.done.lock();
        while !*done {
            self.inner.condvar.wait(&mut done);
        }
    }

    /// Wait with a timeout. Returns `true` if the work completed in time.
    pub fn wait_timeout(self, timeout: Duration) -> bool {
        let mut done = self.inner.done.lock();
        if *done {
            return true;
        }
        let _ = self
            .inner
            .condvar
            .wait_while_for(&mut done, |done| !*done, timeout);
        *done
    }
}

#[derive(Debug)]
struct CompletionState {
    done: Mutex<bool>,
    condvar: Condvar,
}

impl CompletionState {
    fn signal_done(&self) {
        let mut done = self.done.lock();
        *done = true;
        self.condvar.notify_all();
    }
}

/// Create a linked completion handle/waiter pair.
pub fn completion_pair() -> (CompletionHandle, CompletionWaiter) {
    let state = Arc::new(CompletionState {
        done: Mutex::new(false),
        condvar: Condvar::new(),
    });

    (
        CompletionHandle {
            inner: state.clone(),
        },
        CompletionWaiter { inner: state },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_execute_runs_closure() {
        let executed = Arc::new(AtomicBool::new(false));
        let executed_clone = executed.clone();
        let invocation = QueuedInvocation::new(move || {
            executed_clone.store(true, Ordering::SeqCst);
        });

        invocation.execute();
        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_completion_pair() {
        let (handle, waiter) = completion_pair();

        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            handle.signal_done();
        });

        waiter.wait();
        thread.join().unwrap();
    }

    #[test]
    fn test_completion_with_invocation_on_other_thread() {
        let executed = Arc::new(AtomicBool::new(false));
        let (handle, waiter) = completion_pair();

        let executed_clone = executed.clone();
        let invocation = QueuedInvocation::with_completion(
            move || {
                executed_clone.store(true, Ordering::SeqCst);
            },
            handle,
        );

        let thread = std::thread::spawn(move || invocation.execute());

        waiter.wait();
        thread.join().unwrap();
        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_completion_signalled_when_invocation_panics() {
        let (handle, waiter) = completion_pair();
        let invocation = QueuedInvocation::with_completion(|| panic!("listener failed"), handle);

        let result = std::thread::spawn(move || invocation.execute()).join();
        assert!(result.is_err());
        assert!(waiter.wait_timeout(Duration::from_secs(1)));
    }

    #[test]
    fn test_completion_timeout() {
        let (_handle, waiter) = completion_pair();
        assert!(!waiter.wait_timeout(Duration::from_millis(10)));
    }
}
