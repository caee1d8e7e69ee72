//! Routes raw backend events to user callbacks
//!
//! A failing callback (returned `Err` or panic) is logged and counted; it
//! never unwinds into the delivery worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

use crate::config::{Callback, Callbacks, WatchConfig};
use crate::error::CallbackError;
use crate::event::{RawEvent, WatchEvent};
use crate::filter::PathFilter;

/// Snapshot of dispatcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Callback invocations that returned `Ok`
    pub delivered: u64,
    /// Events with no callback registered for their kind
    pub skipped: u64,
    /// Events rejected by the path filter
    pub filtered: u64,
    /// Callback invocations that failed
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    skipped: AtomicU64,
    filtered: AtomicU64,
    failed: AtomicU64,
}

/// Event dispatcher for a single watch
pub struct EventDispatcher {
    callbacks: Callbacks,
    filter: PathFilter,
    counters: Counters,
}

impl EventDispatcher {
    pub fn new(callbacks: Callbacks, filter: PathFilter) -> Self {
        Self {
            callbacks,
            filter,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(config.callbacks().clone(), config.filter().clone())
    }

    /// Dispatch one event to its callback(s)
    ///
    /// Returns once every callback for this event has returned or failed.
    pub fn dispatch(&self, raw: RawEvent) {
        if !self.filter.allows(&raw) {
            trace!("Filtered {} event for {}", raw.kind, raw.src_path.display());
            self.counters.filtered.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let event = WatchEvent::from(raw);
        trace!("Dispatching {} event for {}", event.kind, event.path.display());

        match self.callbacks.for_kind(event.kind) {
            Some(callback) => self.invoke(callback, &event),
            None => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Some(ref callback) = self.callbacks.on_any {
            self.invoke(callback, &event);
        }
    }

    fn invoke(&self, callback: &Callback, event: &WatchEvent) {
        match run_isolated(callback, event) {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!("{}", err);
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            filtered: self.counters.filtered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

/// Run a callback, converting both `Err` and panics into [`CallbackError`]
fn run_isolated(callback: &Callback, event: &WatchEvent) -> Result<(), CallbackError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(event)));

    let reason = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => format!("{:#}", e),
        Err(payload) => panic_message(payload.as_ref()),
    };

    Err(CallbackError {
        kind: event.kind,
        path: event.path.clone(),
        reason,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}
