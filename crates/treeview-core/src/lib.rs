//! Core systems for treeview.
//!
//! This crate provides the threading plumbing underneath the tree model:
//!
//! - **Event dispatch**: a single dedicated thread that delivers events in order
//! - **Signal/Slot System**: type-safe notification with queued delivery
//! - **Cancellation**: cooperative stop requests for background walks
//! - **Thread checks**: assertions that code runs on the expected thread
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use treeview_core::{DispatcherConfig, EventDispatcher, Signal};
//!
//! let dispatcher = EventDispatcher::new(DispatcherConfig::with_name("example")).unwrap();
//! let changed = Arc::new(Signal::<u32>::new());
//! changed.connect(|count| println!("{count} children"));
//!
//! changed.emit_queued(&dispatcher, 3).unwrap();
//! dispatcher.flush().unwrap();
//! dispatcher.shutdown();
//! ```

pub mod cancel;
pub mod dispatch;
pub mod error;
pub mod invocation;
pub mod logging;
pub mod signal;
pub mod thread_check;

pub use cancel::CancellationToken;
pub use dispatch::{DEFAULT_DISPATCH_THREAD, DispatcherConfig, EventDispatcher};
pub use error::{CoreError, Result};
pub use invocation::{CompletionHandle, CompletionWaiter, QueuedInvocation, completion_pair};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
