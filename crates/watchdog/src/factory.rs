//! Convenience constructors composing config, dispatcher and lifecycle

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{NotificationBackend, NotifyBackend};
use crate::config::{Callbacks, WatchConfig, WatchOptions};
use crate::dispatch::EventDispatcher;
use crate::error::WatchError;
use crate::event::WatchEvent;
use crate::lifecycle::{Watchdog, DEFAULT_STOP_TIMEOUT};

/// Create an unstarted watchdog on the platform's native backend
///
/// Fails with [`WatchError::Config`] if `path` is not an existing directory.
pub fn create_watch(
    path: impl AsRef<Path>,
    callbacks: Callbacks,
    recursive: bool,
) -> Result<Watchdog, WatchError> {
    let config = WatchConfig::new(path, recursive, callbacks)?;
    let dispatcher = EventDispatcher::from_config(&config);
    Ok(Watchdog::new(config, dispatcher, Arc::new(NotifyBackend::new())))
}

/// Builder for a [`Watchdog`]
pub struct WatchdogBuilder {
    path: PathBuf,
    options: WatchOptions,
    callbacks: Callbacks,
    backend: Option<Arc<dyn NotificationBackend>>,
    stop_timeout: Duration,
}

impl WatchdogBuilder {
    /// Create a new builder with defaults (recursive, no patterns)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: WatchOptions::default(),
            callbacks: Callbacks::new(),
            backend: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn on_created<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_created(f);
        self
    }

    pub fn on_modified<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_modified(f);
        self
    }

    pub fn on_deleted<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_deleted(f);
        self
    }

    pub fn on_moved<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_moved(f);
        self
    }

    pub fn on_any<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_any(f);
        self
    }

    /// Replace all callbacks at once
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Replace all options at once
    pub fn options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.options.recursive = recursive;
        self
    }

    /// Add an inclusion pattern
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.options.patterns.push(pattern.into());
        self
    }

    pub fn ignore_directories(mut self, ignore: bool) -> Self {
        self.options.ignore_directories = ignore;
        self
    }

    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.options.case_sensitive = sensitive;
        self
    }

    /// Timeout for implicit stops (scoped exit, dispose, drop)
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Use a specific backend instead of [`NotifyBackend`]
    pub fn backend(mut self, backend: Arc<dyn NotificationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Validate the configuration and build an unstarted watchdog
    pub fn build(self) -> Result<Watchdog, WatchError> {
        let config = WatchConfig::with_options(&self.path, self.options, self.callbacks)?;
        let dispatcher = EventDispatcher::from_config(&config);
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(NotifyBackend::new()));

        Ok(Watchdog::new(config, dispatcher, backend).with_stop_timeout(self.stop_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ManualBackend;
    use crate::event::{EventKind, RawEvent};
    use crate::lifecycle::WatchState;
    use anyhow::Result;
    use crossbeam_channel::unbounded;
    use tempfile::TempDir;

    #[test]
    fn test_create_watch_is_unstarted() -> Result<()> {
        let dir = TempDir::new()?;
        let watchdog = create_watch(dir.path(), Callbacks::new().on_created(|_| Ok(())), false)?;

        assert_eq!(watchdog.state(), WatchState::Configured);
        assert!(!watchdog.config().recursive());
        assert_eq!(watchdog.config().callbacks().registered_kinds(), vec![EventKind::Created]);
        Ok(())
    }

    #[test]
    fn test_create_watch_propagates_config_error() {
        let dir = TempDir::new().unwrap();
        let result = create_watch(dir.path().join("missing"), Callbacks::new(), true);
        assert!(matches!(result, Err(WatchError::Config { .. })));
    }

    #[test]
    fn test_builder_wires_everything() -> Result<()> {
        let dir = TempDir::new()?;
        let backend = ManualBackend::new();
        let (tx, rx) = unbounded();

        let mut watchdog = WatchdogBuilder::new(dir.path())
            .recursive(false)
            .pattern("*.gcode")
            .ignore_directories(true)
            .stop_timeout(Duration::from_secs(1))
            .on_moved(move |event| {
                tx.send(event.clone())?;
                Ok(())
            })
            .backend(Arc::new(backend.clone()))
            .build()?;

        assert_eq!(watchdog.stop_timeout(), Duration::from_secs(1));
        assert_eq!(watchdog.config().options().patterns, vec!["*.gcode"]);

        watchdog.start()?;
        assert_eq!(backend.registrations(), vec![(dir.path().to_path_buf(), false)]);

        let root = dir.path();
        backend.emit(RawEvent::moved(root.join("a.stl"), root.join("b.stl"), false));
        backend.emit(RawEvent::moved(root.join("part.tmp"), root.join("part.gcode"), false));

        let event = rx.recv_timeout(Duration::from_secs(2))?;
        assert_eq!(event.path, root.join("part.tmp"));
        assert_eq!(event.dest_path, Some(root.join("part.gcode")));

        watchdog.stop(Duration::from_secs(2))?;
        assert_eq!(watchdog.stats().filtered, 1);
        Ok(())
    }

    #[test]
    fn test_builder_rejects_bad_pattern() {
        let dir = TempDir::new().unwrap();
        let result = WatchdogBuilder::new(dir.path()).pattern("a{b").build();
        assert!(matches!(result, Err(WatchError::Config { .. })));
    }
}
