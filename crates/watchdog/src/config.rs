//! Watch configuration
//!
//! [`WatchConfig`] is validated once, when it is built. A path that does not
//! exist or is not a directory never makes it to `start()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::WatchError;
use crate::event::{EventKind, WatchEvent};
use crate::filter::PathFilter;

/// User callback invoked on the delivery worker for each matching event.
///
/// Returning `Err` (or panicking) is reported and otherwise ignored.
pub type Callback = Arc<dyn Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync>;

/// One optional callback per event kind, plus a catch-all
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_created: Option<Callback>,
    pub on_modified: Option<Callback>,
    pub on_deleted: Option<Callback>,
    pub on_moved: Option<Callback>,
    /// Runs for every event that passes the filter
    pub on_any: Option<Callback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_created<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_created = Some(Arc::new(f));
        self
    }

    pub fn on_modified<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_modified = Some(Arc::new(f));
        self
    }

    pub fn on_deleted<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_deleted = Some(Arc::new(f));
        self
    }

    pub fn on_moved<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_moved = Some(Arc::new(f));
        self
    }

    pub fn on_any<F>(mut self, f: F) -> Self
    where
        F: Fn(&WatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_any = Some(Arc::new(f));
        self
    }

    /// Callback registered for `kind`, if any
    pub fn for_kind(&self, kind: EventKind) -> Option<&Callback> {
        match kind {
            EventKind::Created => self.on_created.as_ref(),
            EventKind::Modified => self.on_modified.as_ref(),
            EventKind::Deleted => self.on_deleted.as_ref(),
            EventKind::Moved => self.on_moved.as_ref(),
        }
    }

    /// Kinds with a registered callback
    pub fn registered_kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.for_kind(*kind).is_some())
            .collect()
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_created", &self.on_created.is_some())
            .field("on_modified", &self.on_modified.is_some())
            .field("on_deleted", &self.on_deleted.is_some())
            .field("on_moved", &self.on_moved.is_some())
            .field("on_any", &self.on_any.is_some())
            .finish()
    }
}

/// Serializable watch settings (everything except the path and callbacks)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Watch subdirectories too (default: true)
    pub recursive: bool,

    /// Inclusion globs; empty means every path
    pub patterns: Vec<String>,

    /// Drop events about directories (default: false)
    pub ignore_directories: bool,

    /// Case-sensitive pattern matching (default: true)
    pub case_sensitive: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            patterns: vec![],
            ignore_directories: false,
            case_sensitive: true,
        }
    }
}

/// Validated, immutable watch configuration
#[derive(Debug, Clone)]
pub struct WatchConfig {
    path: PathBuf,
    options: WatchOptions,
    callbacks: Callbacks,
    filter: PathFilter,
}

impl WatchConfig {
    /// Build a config watching every path under `path`
    pub fn new(
        path: impl AsRef<Path>,
        recursive: bool,
        callbacks: Callbacks,
    ) -> Result<Self, WatchError> {
        let options = WatchOptions {
            recursive,
            ..WatchOptions::default()
        };
        Self::with_options(path, options, callbacks)
    }

    /// Build a config from full options
    ///
    /// Fails with [`WatchError::Config`] if the path is missing, is not a
    /// directory, or a pattern does not compile.
    pub fn with_options(
        path: impl AsRef<Path>,
        options: WatchOptions,
        callbacks: Callbacks,
    ) -> Result<Self, WatchError> {
        let path = path.as_ref();
        validate_watch_path(path)?;

        let filter = PathFilter::compile(path, &options)?;

        Ok(Self {
            path: path.to_path_buf(),
            options,
            callbacks,
            filter,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn recursive(&self) -> bool {
        self.options.recursive
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }
}

fn validate_watch_path(path: &Path) -> Result<(), WatchError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        let reason = if e.kind() == std::io::ErrorKind::NotFound {
            "path does not exist".to_string()
        } else {
            format!("cannot read path: {}", e)
        };
        WatchError::config(path, reason)
    })?;

    if !metadata.is_dir() {
        return Err(WatchError::config(path, "path is not a directory"));
    }

    Ok(())
}

/// Anchor a relative path at the working directory, the way the OS watchers
/// report it
pub(crate) fn absolute_path(path: &Path) -> Result<PathBuf, WatchError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| WatchError::config(path, format!("cannot resolve working directory: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_valid_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = WatchConfig::new(temp_dir.path(), false, Callbacks::new())?;

        assert_eq!(config.path(), temp_dir.path());
        assert!(!config.recursive());
        assert!(config.callbacks().registered_kinds().is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_path_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let err = WatchConfig::new(&missing, true, Callbacks::new()).unwrap_err();
        match err {
            WatchError::Config { path, reason } => {
                assert_eq!(path, missing);
                assert_eq!(reason, "path does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_file_path_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, b"hello")?;

        let err = WatchConfig::new(&file, true, Callbacks::new()).unwrap_err();
        assert!(matches!(err, WatchError::Config { ref reason, .. } if reason == "path is not a directory"));
        Ok(())
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let options = WatchOptions {
            patterns: vec!["src/{a,b".to_string()],
            ..WatchOptions::default()
        };

        let err = WatchConfig::with_options(temp_dir.path(), options, Callbacks::new()).unwrap_err();
        assert!(matches!(err, WatchError::Config { ref reason, .. } if reason.contains("invalid pattern")));
    }

    #[test]
    fn test_callbacks_by_kind() {
        let callbacks = Callbacks::new()
            .on_created(|_| Ok(()))
            .on_moved(|_| Ok(()));

        assert!(callbacks.for_kind(EventKind::Created).is_some());
        assert!(callbacks.for_kind(EventKind::Modified).is_none());
        assert!(callbacks.for_kind(EventKind::Deleted).is_none());
        assert!(callbacks.for_kind(EventKind::Moved).is_some());
        assert_eq!(
            callbacks.registered_kinds(),
            vec![EventKind::Created, EventKind::Moved]
        );
        assert_eq!(
            format!("{:?}", callbacks),
            "Callbacks { on_created: true, on_modified: false, on_deleted: false, on_moved: true, on_any: false }"
        );
    }

    #[test]
    fn test_options_from_toml() -> Result<()> {
        let options: WatchOptions = toml::from_str(
            r#"
            patterns = ["*.gcode", "*.3mf"]
            case_sensitive = false
            "#,
        )?;

        assert!(options.recursive);
        assert!(!options.ignore_directories);
        assert!(!options.case_sensitive);
        assert_eq!(options.patterns, vec!["*.gcode", "*.3mf"]);

        let empty: WatchOptions = toml::from_str("")?;
        assert_eq!(empty, WatchOptions::default());
        Ok(())
    }
}
