//! `notify`-based backend (inotify, FSEvents, kqueue, ReadDirectoryChangesW)

use crossbeam_channel::{unbounded, Receiver};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind as NotifyKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error};
use walkdir::WalkDir;

use super::worker::{Delivery, DeliveryWorker};
use super::{BackendHandle, EventSink, NotificationBackend};
use crate::config::absolute_path;
use crate::error::WatchError;
use crate::event::RawEvent;

/// How long a rename source waits for its destination before it is
/// reported as a deletion (the file left the watched tree).
const RENAME_WINDOW: Duration = Duration::from_millis(100);

/// Backend using the platform's recommended `notify` watcher
#[derive(Debug, Clone, Default)]
pub struct NotifyBackend {
    config: Config,
}

impl NotifyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom `notify` configuration (poll interval, compare contents, ...)
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }
}

impl NotificationBackend for NotifyBackend {
    fn register(&self, path: &Path, recursive: bool) -> Result<Box<dyn BackendHandle>, WatchError> {
        let (raw_tx, raw_rx) = unbounded::<notify::Result<Event>>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = raw_tx.send(res);
            },
            self.config.clone(),
        )?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        watcher.watch(path, mode).map_err(|e| WatchError::Backend {
            reason: format!("cannot watch {}: {}", path.display(), e),
        })?;

        let translator = EventTranslator::seeded(&absolute_path(path)?, recursive);
        debug!(
            "Registered {} (recursive: {}, {} known directories)",
            path.display(),
            recursive,
            translator.known_dirs.len()
        );

        Ok(Box::new(NotifyHandle {
            path: path.to_path_buf(),
            watcher: Some(watcher),
            raw_rx: Some(raw_rx),
            translator: Some(translator),
            worker: None,
        }))
    }
}

struct NotifyHandle {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    raw_rx: Option<Receiver<notify::Result<Event>>>,
    translator: Option<EventTranslator>,
    worker: Option<DeliveryWorker>,
}

impl BackendHandle for NotifyHandle {
    fn subscribe(&mut self, sink: EventSink) -> Result<(), WatchError> {
        let raw_rx = self.raw_rx.take().ok_or_else(|| WatchError::Backend {
            reason: format!("{} already has a subscriber", self.path.display()),
        })?;

        let mut translator = self.translator.take().unwrap_or_default();
        let worker = DeliveryWorker::spawn("watchdog-notify", raw_rx, RENAME_WINDOW, move |msg| {
            let events = match msg {
                Delivery::Item(Ok(event)) => translator.push(event, Instant::now()),
                Delivery::Item(Err(e)) => {
                    error!("File system event error: {}", e);
                    return;
                }
                Delivery::Idle => translator.flush_expired(Instant::now()),
                Delivery::Closing => translator.flush_pending(),
            };

            for event in events {
                sink(event);
            }
        })?;

        self.worker = Some(worker);
        Ok(())
    }

    fn unregister(mut self: Box<Self>, timeout: Duration) -> bool {
        // Dropping the watcher stops the OS watch and disconnects the raw
        // channel, so an idle worker exits even before it sees the stop.
        drop(self.watcher.take());
        debug!("Unregistered {}", self.path.display());

        match self.worker.take() {
            Some(worker) => worker.shutdown(timeout),
            None => true,
        }
    }
}

/// Rename source waiting for its destination
#[derive(Debug)]
struct PendingRename {
    tracker: Option<usize>,
    path: PathBuf,
    is_dir: bool,
    seen_at: Instant,
}

/// Turns `notify` events into [`RawEvent`]s
///
/// Only create/remove/modify/rename survive; access and unknown events are
/// dropped. inotify reports a rename as `From`, `To` and then `Both`, all
/// with the same tracker; the `From`/`To` pair produces the move and the
/// trailing `Both` is swallowed. Backends that only send `Both` still get a
/// move, and a `From` whose `To` never arrives becomes a deletion.
///
/// Rename sources and removals no longer exist on disk, so directories are
/// remembered from the initial scan and from later create/move events.
#[derive(Debug, Default)]
struct EventTranslator {
    pending: Option<PendingRename>,
    /// Tracker of the last move produced from a `From`/`To` pair
    paired: Option<usize>,
    known_dirs: HashSet<PathBuf>,
}

impl EventTranslator {
    /// Translator that already knows the directories under `root`
    fn seeded(root: &Path, recursive: bool) -> Self {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let known_dirs = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect();

        Self {
            known_dirs,
            ..Self::default()
        }
    }

    fn push(&mut self, event: Event, now: Instant) -> Vec<RawEvent> {
        let mut out = self.flush_expired(now);
        let tracker = event.attrs.tracker();

        match event.kind {
            NotifyKind::Create(kind) => {
                for path in event.paths {
                    let is_dir = kind == CreateKind::Folder || path.is_dir();
                    if is_dir {
                        self.known_dirs.insert(path.clone());
                    }
                    out.push(RawEvent::created(path, is_dir));
                }
            }
            NotifyKind::Remove(kind) => {
                for path in event.paths {
                    let was_dir = self.forget(&path);
                    out.push(RawEvent::deleted(path, was_dir || kind == RemoveKind::Folder));
                }
            }
            NotifyKind::Modify(ModifyKind::Name(mode)) => {
                self.rename(mode, tracker, event.paths, now, &mut out);
            }
            NotifyKind::Modify(_) => {
                for path in event.paths {
                    let is_dir = path.is_dir();
                    out.push(RawEvent::modified(path, is_dir));
                }
            }
            NotifyKind::Access(_) | NotifyKind::Any | NotifyKind::Other => {}
        }

        out
    }

    fn rename(
        &mut self,
        mode: RenameMode,
        tracker: Option<usize>,
        paths: Vec<PathBuf>,
        now: Instant,
        out: &mut Vec<RawEvent>,
    ) {
        match mode {
            RenameMode::From => {
                for path in paths {
                    out.extend(self.flush_pending());
                    let is_dir = self.known_dirs.contains(&path);
                    self.pending = Some(PendingRename {
                        tracker,
                        path,
                        is_dir,
                        seen_at: now,
                    });
                }
            }
            RenameMode::To => {
                for path in paths {
                    match self.pending.take() {
                        Some(from) if from.tracker == tracker => {
                            let is_dir = from.is_dir || path.is_dir();
                            self.relocate(&from.path, &path, is_dir);
                            out.push(RawEvent::moved(from.path, path, is_dir));
                            self.paired = tracker;
                        }
                        unrelated => {
                            if let Some(from) = unrelated {
                                self.forget(&from.path);
                                out.push(RawEvent::deleted(from.path, from.is_dir));
                            }
                            let is_dir = path.is_dir();
                            if is_dir {
                                self.known_dirs.insert(path.clone());
                            }
                            out.push(RawEvent::created(path, is_dir));
                        }
                    }
                }
            }
            RenameMode::Both => {
                if tracker.is_some() && self.paired == tracker {
                    self.paired = None;
                    return;
                }
                let mut paths = paths.into_iter();
                if let (Some(from), Some(to)) = (paths.next(), paths.next()) {
                    let is_dir = self.known_dirs.contains(&from) || to.is_dir();
                    self.relocate(&from, &to, is_dir);
                    out.push(RawEvent::moved(from, to, is_dir));
                }
            }
            // FSEvents style: one event per path, no pairing information.
            RenameMode::Any | RenameMode::Other => {
                for path in paths {
                    if path.exists() {
                        let is_dir = path.is_dir();
                        if is_dir {
                            self.known_dirs.insert(path.clone());
                        }
                        out.push(RawEvent::created(path, is_dir));
                    } else {
                        let was_dir = self.forget(&path);
                        out.push(RawEvent::deleted(path, was_dir));
                    }
                }
            }
        }
    }

    /// Report a rename source that waited too long as deleted
    fn flush_expired(&mut self, now: Instant) -> Vec<RawEvent> {
        let expired = self
            .pending
            .as_ref()
            .map_or(false, |p| now.saturating_duration_since(p.seen_at) >= RENAME_WINDOW);
        if !expired {
            return Vec::new();
        }

        self.flush_pending()
    }

    /// Report any waiting rename source as deleted, expired or not
    fn flush_pending(&mut self) -> Vec<RawEvent> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };

        self.forget(&pending.path);
        vec![RawEvent::deleted(pending.path, pending.is_dir)]
    }

    /// Drop `path` and everything below it from the known directories.
    /// Returns whether `path` itself was a known directory.
    fn forget(&mut self, path: &Path) -> bool {
        let was_dir = self.known_dirs.contains(path);
        self.known_dirs.retain(|dir| !dir.starts_with(path));
        was_dir
    }

    /// Re-key known directories after `from` moved to `to`
    fn relocate(&mut self, from: &Path, to: &Path, is_dir: bool) {
        if !is_dir {
            return;
        }

        let moved: Vec<PathBuf> = self
            .known_dirs
            .iter()
            .filter(|dir| dir.starts_with(from))
            .cloned()
            .collect();

        for dir in moved {
            self.known_dirs.remove(&dir);
            if let Ok(rest) = dir.strip_prefix(from) {
                self.known_dirs.insert(to.join(rest));
            }
        }
        self.known_dirs.insert(to.to_path_buf());
    }
}
