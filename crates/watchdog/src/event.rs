//! Event types shared by backends, the dispatcher and user callbacks

use std::fmt;
use std::path::{Path, PathBuf};

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// File or directory created
    Created,
    /// File or directory contents/metadata changed
    Modified,
    /// File or directory deleted
    Deleted,
    /// File or directory renamed/moved
    Moved,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Created,
        EventKind::Modified,
        EventKind::Deleted,
        EventKind::Moved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Modified => "modified",
            EventKind::Deleted => "deleted",
            EventKind::Moved => "moved",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event record as delivered by a notification backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub src_path: PathBuf,
    /// Only set for [`EventKind::Moved`]
    pub dest_path: Option<PathBuf>,
    pub is_directory: bool,
}

impl RawEvent {
    pub fn created(path: impl Into<PathBuf>, is_directory: bool) -> Self {
        Self::simple(EventKind::Created, path.into(), is_directory)
    }

    pub fn modified(path: impl Into<PathBuf>, is_directory: bool) -> Self {
        Self::simple(EventKind::Modified, path.into(), is_directory)
    }

    pub fn deleted(path: impl Into<PathBuf>, is_directory: bool) -> Self {
        Self::simple(EventKind::Deleted, path.into(), is_directory)
    }

    pub fn moved(from: impl Into<PathBuf>, to: impl Into<PathBuf>, is_directory: bool) -> Self {
        Self {
            kind: EventKind::Moved,
            src_path: from.into(),
            dest_path: Some(to.into()),
            is_directory,
        }
    }

    fn simple(kind: EventKind, src_path: PathBuf, is_directory: bool) -> Self {
        Self {
            kind,
            src_path,
            dest_path: None,
            is_directory,
        }
    }
}

/// Typed event handed to user callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Type of change
    pub kind: EventKind,
    /// Path that changed (source path for moves)
    pub path: PathBuf,
    /// Destination path, set for moves only
    pub dest_path: Option<PathBuf>,
    /// Whether the path refers to a directory
    pub is_directory: bool,
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dest_path(&self) -> Option<&Path> {
        self.dest_path.as_deref()
    }
}

impl From<RawEvent> for WatchEvent {
    fn from(raw: RawEvent) -> Self {
        // Non-move events never carry a destination, whatever the backend sent.
        let dest_path = match raw.kind {
            EventKind::Moved => raw.dest_path,
            _ => None,
        };

        Self {
            kind: raw.kind,
            path: raw.src_path,
            dest_path,
            is_directory: raw.is_directory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_event_keeps_both_paths() {
        let event = WatchEvent::from(RawEvent::moved("/w/a.txt", "/w/b.txt", false));
        assert_eq!(event.kind, EventKind::Moved);
        assert_eq!(event.path(), Path::new("/w/a.txt"));
        assert_eq!(event.dest_path(), Some(Path::new("/w/b.txt")));
        assert!(!event.is_directory);
    }

    #[test]
    fn test_dest_path_dropped_for_non_moves() {
        let raw = RawEvent {
            kind: EventKind::Created,
            src_path: PathBuf::from("/w/new"),
            dest_path: Some(PathBuf::from("/w/bogus")),
            is_directory: true,
        };
        let event = WatchEvent::from(raw);
        assert_eq!(event.dest_path, None);
        assert!(event.is_directory);
    }

    #[test]
    fn test_kind_display() {
        let names: Vec<String> = EventKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["created", "modified", "deleted", "moved"]);
    }
}
