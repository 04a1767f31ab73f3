//! Signal/slot notification.
//!
//! A [`Signal<Args>`] holds a set of connected slots (closures) and invokes
//! each of them when emitted. Slots are called outside the connection lock,
//! so a slot may connect, disconnect, or emit again without deadlocking.
//!
//! [`Signal::emit_queued`] hands delivery to an [`EventDispatcher`], which is
//! how tree models deliver their events on the dispatch thread.
//!
//! # Example
//!
//! ```
//! use treeview_core::Signal;
//!
//! let renamed = Signal::<String>::new();
//! let id = renamed.connect(|name| println!("renamed to {name}"));
//!
//! renamed.emit("docs".to_string());
//! renamed.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::dispatch::EventDispatcher;
use crate::error::Result;
use crate::logging::targets;

new_key_type! {
    /// Identifies one signal-slot connection.
    ///
    /// Pass it to [`Signal::disconnect`] to remove the slot.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal with any number of connected slots.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
    blocked: AtomicBool,
}

impl<Args: Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Send + 'static> Signal<Args> {
    /// Create a signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot.
    ///
    /// Returns a [`ConnectionId`] that can be used to disconnect it later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Disconnect a slot. Returns `true` if it was connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block or unblock emission. While blocked, `emit` does nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if emission is blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Invoke every connected slot on the calling thread.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        // Snapshot so slots run without the lock held.
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }

    /// Queue an emission onto the dispatcher's thread.
    ///
    /// The emission is queued even when called from the dispatch thread, so
    /// emissions are delivered in the order they were queued and a caller may
    /// queue while holding a lock its slots take. Slots are resolved when the
    /// emission runs, not when it is queued, and the blocked flag is checked
    /// at the same point.
    pub fn emit_queued(self: &Arc<Self>, dispatcher: &EventDispatcher, args: Args) -> Result<()> {
        let signal = Arc::clone(self);
        let affinity = dispatcher.affinity();
        dispatcher.post(move || {
            affinity.debug_assert_same_thread();
            signal.emit(args)
        })
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::Relaxed))
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
