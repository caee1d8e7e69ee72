//! Typed file system watching
//!
//! This crate wraps OS change notification behind a small lifecycle:
//! - Validated configuration (the watch path must be an existing directory)
//! - One optional callback per event kind (created/modified/deleted/moved)
//! - Callback failures are logged, never fatal to the watcher
//! - Start/stop with bounded shutdown, plus scoped acquisition
//!
//! ```no_run
//! use std::time::Duration;
//! use watchdog::{create_watch, Callbacks};
//!
//! # fn main() -> anyhow::Result<()> {
//! let callbacks = Callbacks::new().on_created(|event| {
//!     println!("created {}", event.path.display());
//!     Ok(())
//! });
//!
//! let mut watchdog = create_watch(".", callbacks, true)?;
//! watchdog.scoped(|_| -> anyhow::Result<()> {
//!     std::thread::sleep(Duration::from_secs(10));
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod factory;
pub mod filter;
pub mod lifecycle;

pub use backend::{BackendHandle, EventSink, ManualBackend, NotificationBackend, NotifyBackend};
pub use config::{Callback, Callbacks, WatchConfig, WatchOptions};
pub use dispatch::{DispatchStats, EventDispatcher};
pub use error::{CallbackError, WatchError};
pub use event::{EventKind, RawEvent, WatchEvent};
pub use factory::{create_watch, WatchdogBuilder};
pub use filter::PathFilter;
pub use lifecycle::{ScopedWatch, WatchState, Watchdog, DEFAULT_STOP_TIMEOUT};
