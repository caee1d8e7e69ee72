//! In-process backend fed by hand
//!
//! Useful wherever events need to be injected deterministically, e.g. to
//! test callbacks without touching the filesystem.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::worker::{Delivery, DeliveryWorker};
use super::{BackendHandle, EventSink, NotificationBackend};
use crate::error::WatchError;
use crate::event::RawEvent;

/// Backend whose events come from [`ManualBackend::emit`]
///
/// Clones share state, so a test can keep one clone and hand the other to a
/// watchdog.
#[derive(Clone, Default)]
pub struct ManualBackend {
    state: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    /// Sender of the current registration
    active: Option<Sender<RawEvent>>,
    /// Every (path, recursive) ever registered
    registrations: Vec<(PathBuf, bool)>,
    unregistrations: usize,
    /// Error message for the next `register` call
    fail_next: Option<String>,
}

impl ManualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the current registration
    ///
    /// Returns `false` if nothing is registered.
    pub fn emit(&self, event: RawEvent) -> bool {
        let state = self.state.lock();
        match state.active {
            Some(ref tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Make the next `register` call fail with `reason`
    pub fn fail_next_register(&self, reason: impl Into<String>) {
        self.state.lock().fail_next = Some(reason.into());
    }

    pub fn is_registered(&self) -> bool {
        self.state.lock().active.is_some()
    }

    pub fn registrations(&self) -> Vec<(PathBuf, bool)> {
        self.state.lock().registrations.clone()
    }

    pub fn unregistrations(&self) -> usize {
        self.state.lock().unregistrations
    }
}

impl NotificationBackend for ManualBackend {
    fn register(&self, path: &Path, recursive: bool) -> Result<Box<dyn BackendHandle>, WatchError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next.take() {
            return Err(WatchError::Backend { reason });
        }

        let (tx, rx) = unbounded();
        state.active = Some(tx);
        state.registrations.push((path.to_path_buf(), recursive));

        Ok(Box::new(ManualHandle {
            state: self.state.clone(),
            rx: Some(rx),
            worker: None,
        }))
    }
}

struct ManualHandle {
    state: Arc<Mutex<ManualState>>,
    rx: Option<Receiver<RawEvent>>,
    worker: Option<DeliveryWorker>,
}

impl BackendHandle for ManualHandle {
    fn subscribe(&mut self, sink: EventSink) -> Result<(), WatchError> {
        let rx = self.rx.take().ok_or_else(|| WatchError::Backend {
            reason: "handle already has a subscriber".to_string(),
        })?;

        let worker = DeliveryWorker::spawn("watchdog-manual", rx, Duration::from_secs(3600), move |event| {
            if let Delivery::Item(event) = event {
                sink(event);
            }
        })?;

        self.worker = Some(worker);
        Ok(())
    }

    fn unregister(mut self: Box<Self>, timeout: Duration) -> bool {
        {
            let mut state = self.state.lock();
            state.active = None;
            state.unregistrations += 1;
        }

        match self.worker.take() {
            Some(worker) => worker.shutdown(timeout),
            None => true,
        }
    }
}
