//! Background delivery thread shared by the backends

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::WatchError;

/// What the delivery handler is woken up for
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Delivery<T> {
    Item(T),
    /// The channel stayed quiet for the idle interval
    Idle,
    /// Last call before the thread exits; skipped when shutdown gave up
    Closing,
}

/// Owns one delivery thread draining a channel into a handler.
pub(crate) struct DeliveryWorker {
    name: String,
    /// Dropping this disconnects the stop channel
    stop_tx: Option<Sender<()>>,
    /// Set when shutdown timed out and the thread was left behind
    abandoned: Arc<AtomicBool>,
    /// Disconnected when the thread exits (including by panic)
    done_rx: Receiver<()>,
    thread: Option<JoinHandle<()>>,
}

impl DeliveryWorker {
    pub(crate) fn spawn<T, F>(
        name: &str,
        events: Receiver<T>,
        idle: Duration,
        mut handle: F,
    ) -> Result<Self, WatchError>
    where
        T: Send + 'static,
        F: FnMut(Delivery<T>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let (done_tx, done_rx) = bounded::<()>(0);
        let abandoned = Arc::new(AtomicBool::new(false));
        let left_behind = abandoned.clone();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _done = done_tx;

                loop {
                    // Stop wins over pending events.
                    if !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
                        break;
                    }

                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(events) -> msg => match msg {
                            Ok(item) => handle(Delivery::Item(item)),
                            Err(_) => break,
                        },
                        default(idle) => handle(Delivery::Idle),
                    }
                }

                if !left_behind.load(Ordering::SeqCst) {
                    handle(Delivery::Closing);
                }
            })
            .map_err(|e| WatchError::Backend {
                reason: format!("failed to spawn delivery worker: {}", e),
            })?;

        debug!("Spawned delivery worker {}", name);

        Ok(Self {
            name: name.to_string(),
            stop_tx: Some(stop_tx),
            abandoned,
            done_rx,
            thread: Some(thread),
        })
    }

    /// Ask the thread to exit and wait up to `timeout` for it
    pub(crate) fn shutdown(mut self, timeout: Duration) -> bool {
        drop(self.stop_tx.take());

        match self.done_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                self.abandoned.store(true, Ordering::SeqCst);
                warn!(
                    "Delivery worker {} still busy after {:?}, detaching",
                    self.name, timeout
                );
                false
            }
            _ => {
                if let Some(thread) = self.thread.take() {
                    if thread.join().is_err() {
                        warn!("Delivery worker {} panicked", self.name);
                    }
                }
                debug!("Delivery worker {} stopped", self.name);
                true
            }
        }
    }
}
