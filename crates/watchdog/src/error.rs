//! Error types for the watchdog.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::event::EventKind;

/// Errors surfaced to the caller by configuration and lifecycle operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid watch configuration for {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Watchdog is already running")]
    AlreadyRunning,

    #[error("Watchdog did not stop within {timeout:?}")]
    StopTimeout { timeout: Duration },

    #[error("Watchdog has been disposed")]
    Disposed,

    #[error("Notification backend error: {reason}")]
    Backend { reason: String },
}

impl WatchError {
    pub(crate) fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        WatchError::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::Backend {
            reason: e.to_string(),
        }
    }
}

/// A user callback failed while handling an event.
///
/// Never returned to the caller; the dispatcher logs it and moves on.
#[derive(Error, Debug, Clone)]
#[error("{kind} callback failed for {path}: {reason}")]
pub struct CallbackError {
    pub kind: EventKind,
    pub path: PathBuf,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = WatchError::config("/nope", "path does not exist");
        assert_eq!(
            err.to_string(),
            "Invalid watch configuration for /nope: path does not exist"
        );

        let err = WatchError::StopTimeout {
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Watchdog did not stop within 250ms");

        let err = CallbackError {
            kind: EventKind::Moved,
            path: PathBuf::from("a.txt"),
            reason: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "moved callback failed for a.txt: boom");
    }

    #[test]
    fn test_notify_error_maps_to_backend() {
        let err: WatchError = notify::Error::generic("inotify limit reached").into();
        assert!(matches!(err, WatchError::Backend { ref reason } if reason.contains("inotify limit")));
    }
}
