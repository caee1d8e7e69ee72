//! Watchdog lifecycle
//!
//! ```text
//! Configured --start--> Running --stop--> Stopped --start--> Running ...
//!      \                   |                  |
//!       `-----------------dispose-------------'--> Disposed
//! ```
//!
//! Each start registers a fresh backend handle; the handle is released by
//! `stop`, `dispose`, a [`ScopedWatch`] going out of scope, or `Drop`.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::{BackendHandle, EventSink, NotificationBackend};
use crate::config::WatchConfig;
use crate::dispatch::{DispatchStats, EventDispatcher};
use crate::error::WatchError;

/// Stop timeout used by `dispose`, scoped exit and `Drop`
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of a [`Watchdog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Configured,
    Running,
    Stopped,
    Disposed,
}

/// File system watchdog bound to one directory
pub struct Watchdog {
    config: WatchConfig,
    dispatcher: Arc<EventDispatcher>,
    backend: Arc<dyn NotificationBackend>,
    /// Present exactly while running
    handle: Option<Box<dyn BackendHandle>>,
    state: WatchState,
    stop_timeout: Duration,
}

impl Watchdog {
    /// Create an unstarted watchdog
    pub fn new(
        config: WatchConfig,
        dispatcher: EventDispatcher,
        backend: Arc<dyn NotificationBackend>,
    ) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
            backend,
            handle: None,
            state: WatchState::Configured,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Timeout for implicit stops (scoped exit, dispose, drop)
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Start watching for events
    ///
    /// Returns as soon as the path is registered with the backend; events
    /// are delivered to the callbacks on a background worker from then on.
    pub fn start(&mut self) -> Result<(), WatchError> {
        match self.state {
            WatchState::Running => return Err(WatchError::AlreadyRunning),
            WatchState::Disposed => return Err(WatchError::Disposed),
            WatchState::Configured | WatchState::Stopped => {}
        }

        let path = self.config.path();
        let mut handle = self.backend.register(path, self.config.recursive())?;

        let dispatcher = Arc::clone(&self.dispatcher);
        let sink: EventSink = Arc::new(move |event| dispatcher.dispatch(event));

        if let Err(e) = handle.subscribe(sink) {
            if !handle.unregister(self.stop_timeout) {
                warn!("Backend for {} did not release after failed subscribe", path.display());
            }
            return Err(e);
        }

        self.handle = Some(handle);
        self.state = WatchState::Running;
        debug!("Watching {} (recursive: {})", path.display(), self.config.recursive());
        Ok(())
    }

    /// Stop watching
    ///
    /// No-op unless running. Waits up to `timeout` for the delivery worker
    /// to finish; a callback that is still executing when the timeout expires
    /// is not interrupted and completes in the background. The watchdog is
    /// `Stopped` afterwards either way, and a later `start()` registers a
    /// fresh handle.
    pub fn stop(&mut self, timeout: Duration) -> Result<(), WatchError> {
        if self.state != WatchState::Running {
            return Ok(());
        }

        let handle = self.handle.take();
        self.state = WatchState::Stopped;

        if let Some(handle) = handle {
            if !handle.unregister(timeout) {
                warn!(
                    "Watchdog for {} did not stop within {:?}",
                    self.config.path().display(),
                    timeout
                );
                return Err(WatchError::StopTimeout { timeout });
            }
        }

        debug!("Stopped watching {}", self.config.path().display());
        Ok(())
    }

    /// Stop (if running) and refuse any further `start()`
    pub fn dispose(&mut self) -> Result<(), WatchError> {
        let result = self.stop(self.stop_timeout);
        self.state = WatchState::Disposed;
        result
    }

    /// Start and return a guard that stops the watchdog when dropped
    pub fn enter(&mut self) -> Result<ScopedWatch<'_>, WatchError> {
        self.start()?;
        let timeout = self.stop_timeout;
        Ok(ScopedWatch {
            watchdog: self,
            timeout,
        })
    }

    /// Run `f` while the watchdog is running
    ///
    /// The watchdog is stopped on every exit path, including panics. If `f`
    /// fails its error is returned (a stop failure is only logged then);
    /// otherwise a stop failure is returned.
    pub fn scoped<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&ScopedWatch<'_>) -> Result<T, E>,
        E: From<WatchError>,
    {
        let guard = self.enter()?;
        let result = f(&guard);
        let stopped = guard.exit();

        match (result, stopped) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(stop_err)) => Err(stop_err.into()),
            (Err(e), stopped) => {
                if let Err(stop_err) = stopped {
                    warn!("Failed to stop watchdog after scoped error: {}", stop_err);
                }
                Err(e)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == WatchState::Running
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if let Err(e) = self.stop(self.stop_timeout) {
            warn!("Failed to stop watchdog on drop: {}", e);
        }
    }
}

/// A running watchdog that stops when this guard goes out of scope
pub struct ScopedWatch<'a> {
    watchdog: &'a mut Watchdog,
    timeout: Duration,
}

impl ScopedWatch<'_> {
    /// Leave the scope, reporting the result of the stop
    pub fn exit(mut self) -> Result<(), WatchError> {
        // Drop runs afterwards but finds the watchdog already stopped.
        let timeout = self.timeout;
        self.watchdog.stop(timeout)
    }
}

impl Deref for ScopedWatch<'_> {
    type Target = Watchdog;

    fn deref(&self) -> &Watchdog {
        &*self.watchdog
    }
}

impl Drop for ScopedWatch<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.watchdog.stop(self.timeout) {
            warn!("Failed to stop watchdog on scope exit: {}", e);
        }
    }
}
