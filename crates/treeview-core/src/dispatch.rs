//! The event-dispatch thread.
//!
//! All tree events are delivered on a single dedicated thread, in the order
//! they were queued. [`EventDispatcher`] owns that thread and a FIFO queue of
//! closures. Any thread may queue work; the queue is drained sequentially.
//! Work submitted from the dispatch thread itself through
//! [`EventDispatcher::invoke_later`] runs immediately, while
//! [`EventDispatcher::post`] always goes to the back of the queue.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use treeview_core::{DispatcherConfig, EventDispatcher};
//!
//! let dispatcher = EventDispatcher::new(DispatcherConfig::with_name("docs-dispatch")).unwrap();
//! let counter = Arc::new(AtomicUsize::new(0));
//!
//! let c = counter.clone();
//! dispatcher.invoke_later(move || {
//!     c.fetch_add(1, Ordering::SeqCst);
//! }).unwrap();
//!
//! dispatcher.flush().unwrap();
//! assert_eq!(counter.load(Ordering::SeqCst), 1);
//! dispatcher.shutdown();
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::invocation::{QueuedInvocation, completion_pair};
use crate::logging::{panic_message, span_names, targets};
use crate::thread_check::ThreadAffinity;

/// Name of the global dispatch thread.
pub const DEFAULT_DISPATCH_THREAD: &str = "treeview-dispatch";

static GLOBAL_DISPATCHER: OnceLock<Arc<EventDispatcher>> = OnceLock::new();

/// Configuration for an [`EventDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Name given to the dispatch thread.
    pub thread_name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_DISPATCH_THREAD.to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            thread_name: name.into(),
        }
    }
}

enum DispatchMessage {
    Run(QueuedInvocation),
    Shutdown,
}

struct DispatchState {
    running: AtomicBool,
    pending: AtomicUsize,
}

/// Owner of the event-dispatch thread.
///
/// Closures queued with [`invoke_later`](Self::invoke_later) run one at a
/// time on the dispatch thread in FIFO order. A panicking closure is logged
/// and does not take the thread down.
pub struct EventDispatcher {
    name: String,
    sender: Sender<DispatchMessage>,
    handle: Mutex<Option<JoinHandle<()>>>,
    affinity: ThreadAffinity,
    state: Arc<DispatchState>,
}

static_assertions::assert_impl_all!(EventDispatcher: Send, Sync);

impl EventDispatcher {
    /// Start a new dispatcher with its own thread.
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let state = Arc::new(DispatchState {
            running: AtomicBool::new(true),
            pending: AtomicUsize::new(0),
        });

        let thread_state = state.clone();
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || dispatch_loop(receiver, thread_state))
            .map_err(|e| CoreError::thread_spawn(config.thread_name.clone(), e))?;

        tracing::debug!(target: targets::DISPATCH, thread = %config.thread_name, "dispatch thread started");

        Ok(Self {
            name: config.thread_name,
            sender,
            affinity: ThreadAffinity::for_thread(handle.thread().id()),
            handle: Mutex::new(Some(handle)),
            state,
        })
    }

    /// The process-wide dispatcher, started on first use.
    ///
    /// # Panics
    ///
    /// Panics if the dispatch thread cannot be spawned.
    pub fn global() -> Arc<EventDispatcher> {
        GLOBAL_DISPATCHER
            .get_or_init(|| {
                Arc::new(
                    EventDispatcher::new(DispatcherConfig::default())
                        .expect("Failed to spawn event dispatch thread"),
                )
            })
            .clone()
    }

    /// Start the global dispatcher with a custom configuration.
    ///
    /// Returns the dispatcher that ends up installed, which is the existing one
    /// if [`global`](Self::global) was already called.
    pub fn init_global(config: DispatcherConfig) -> Result<Arc<EventDispatcher>> {
        if let Some(existing) = GLOBAL_DISPATCHER.get() {
            return Ok(existing.clone());
        }
        let dispatcher = Arc::new(EventDispatcher::new(config)?);
        match GLOBAL_DISPATCHER.set(dispatcher.clone()) {
            Ok(()) => Ok(dispatcher),
            Err(_) => {
                dispatcher.shutdown();
                Ok(Self::global())
            }
        }
    }

    /// Name of the dispatch thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Affinity of the dispatch thread.
    pub fn affinity(&self) -> ThreadAffinity {
        self.affinity
    }

    /// Check if the calling thread is the dispatch thread.
    #[inline]
    pub fn is_dispatch_thread(&self) -> bool {
        self.affinity.is_same_thread()
    }

    /// Check if the dispatcher still accepts work.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Number of queued closures not yet finished.
    pub fn pending_count(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Run a closure on the dispatch thread.
    ///
    /// Called from the dispatch thread, the closure runs inline. From any
    /// other thread it is queued behind everything queued before it.
    pub fn invoke_later<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_dispatch_thread() {
            f();
            return Ok(());
        }
        self.send(QueuedInvocation::new(f))
    }

    /// Queue a closure on the dispatch thread, even when called from it.
    ///
    /// Never runs `f` on the calling thread, so it is safe to call while
    /// holding locks that `f` will take. Closures posted from one thread run
    /// in the order they were posted.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(QueuedInvocation::new(f))
    }

    /// Run a closure on the dispatch thread and wait for it to finish.
    ///
    /// Called from the dispatch thread, the closure runs inline.
    pub fn invoke_and_wait<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_dispatch_thread() {
            f();
            return Ok(());
        }
        let (handle, waiter) = completion_pair();
        self.send(QueuedInvocation::with_completion(f, handle))?;
        waiter.wait();
        Ok(())
    }

    /// Wait until everything queued before this call has run.
    ///
    /// A no-op on the dispatch thread.
    pub fn flush(&self) -> Result<()> {
        self.invoke_and_wait(|| {})
    }

    /// Like [`flush`](Self::flush), but gives up after `timeout`.
    pub fn flush_timeout(&self, timeout: Duration) -> Result<()> {
        if self.is_dispatch_thread() {
            return Ok(());
        }
        let (handle, waiter) = completion_pair();
        self.send(QueuedInvocation::with_completion(|| {}, handle))?;
        if waiter.wait_timeout(timeout) {
            Ok(())
        } else {
            Err(CoreError::Timeout(timeout))
        }
    }

    /// Stop accepting work and let the thread exit after draining the queue.
    ///
    /// Joins the thread unless called from the dispatch thread itself.
    pub fn shutdown(&self) {
        if self.state.running.swap(false, Ordering::AcqRel) {
            let _ = self.sender.send(DispatchMessage::Shutdown);
            tracing::debug!(target: targets::DISPATCH, thread = %self.name, "dispatch thread shutting down");
        }
        if self.is_dispatch_thread() {
            return;
        }
        if let Some(handle) = self.handle.lock().take()
            && handle.join().is_err()
        {
            tracing::error!(target: targets::DISPATCH, thread = %self.name, "dispatch thread panicked");
        }
    }

    fn send(&self, invocation: QueuedInvocation) -> Result<()> {
        if !self.is_running() {
            tracing::warn!(target: targets::DISPATCH, thread = %self.name, "dispatcher stopped, dropping invocation");
            return Err(CoreError::dispatcher_stopped(&self.name));
        }
        self.state.pending.fetch_add(1, Ordering::AcqRel);
        if self.sender.send(DispatchMessage::Run(invocation)).is_err() {
            self.state.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(CoreError::dispatcher_stopped(&self.name));
        }
        Ok(())
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        if self.state.running.swap(false, Ordering::AcqRel) {
            let _ = self.sender.send(DispatchMessage::Shutdown);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("pending", &self.pending_count())
            .finish()
    }
}

fn dispatch_loop(receiver: Receiver<DispatchMessage>, state: Arc<DispatchState>) {
    let _span = tracing::trace_span!(target: targets::DISPATCH, "dispatch", name = span_names::DISPATCH).entered();

    while let Ok(message) = receiver.recv() {
        match message {
            DispatchMessage::Run(invocation) => {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| invocation.execute())) {
                    tracing::error!(
                        target: targets::DISPATCH,
                        panic = %panic_message(&*payload),
                        "queued invocation panicked"
                    );
                }
                state.pending.fetch_sub(1, Ordering::AcqRel);
            }
            DispatchMessage::Shutdown => break,
        }
    }

    state.running.store(false, Ordering::Release);
    tracing::trace!(target: targets::DISPATCH, "dispatch loop exited");
}
