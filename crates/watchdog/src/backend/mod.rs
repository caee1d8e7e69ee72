//! Notification backend contract
//!
//! The lifecycle layer never talks to inotify/FSEvents/ReadDirectoryChangesW
//! directly. It only needs something that can:
//!
//! 1. `register` a path, yielding a handle
//! 2. `subscribe` a sink on that handle, which starts background delivery
//! 3. `unregister` the handle, waiting a bounded time for delivery to cease
//!
//! [`NotifyBackend`] implements this on top of the `notify` crate;
//! [`ManualBackend`] is an in-process backend driven by [`ManualBackend::emit`].

mod manual;
mod native;
mod worker;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::WatchError;
use crate::event::RawEvent;

pub use manual::ManualBackend;
pub use native::NotifyBackend;

/// Receives raw events on the backend's delivery worker, one at a time
pub type EventSink = Arc<dyn Fn(RawEvent) + Send + Sync>;

/// Source of filesystem notifications
pub trait NotificationBackend: Send + Sync {
    /// Start observing `path`
    fn register(&self, path: &Path, recursive: bool) -> Result<Box<dyn BackendHandle>, WatchError>;
}

/// A single registration with a backend
pub trait BackendHandle: Send {
    /// Bind the sink and begin delivering events to it
    fn subscribe(&mut self, sink: EventSink) -> Result<(), WatchError>;

    /// Stop observing and wait up to `timeout` for delivery to cease
    ///
    /// Returns `false` if the delivery worker was still busy when the timeout
    /// expired. The worker is detached in that case and exits on its own once
    /// the in-flight event has been handled.
    fn unregister(self: Box<Self>, timeout: Duration) -> bool;
}
