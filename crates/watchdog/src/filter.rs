//! Inclusion filtering for watch events
//!
//! Patterns use gitignore glob syntax, but with inverted meaning: a path is
//! *included* when it matches at least one pattern. No patterns means every
//! path is included. A `!pattern` line carves an exception back out.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

use crate::config::{absolute_path, WatchOptions};
use crate::error::WatchError;
use crate::event::RawEvent;

/// Compiled event filter for a single watch root
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Absolute watch root, patterns are anchored here
    root: PathBuf,

    /// `root` with symlinks resolved, when that differs
    resolved_root: Option<PathBuf>,

    /// Compiled inclusion patterns (None = include everything)
    patterns: Option<Gitignore>,

    /// Drop events whose subject is a directory
    ignore_directories: bool,
}

impl PathFilter {
    /// Filter that lets every event through
    pub fn allow_all(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            resolved_root: None,
            patterns: None,
            ignore_directories: false,
        }
    }

    /// Compile the filter described by `options` for `root`
    ///
    /// A relative `root` is anchored at the working directory, since
    /// backends report absolute paths.
    pub fn compile(root: &Path, options: &WatchOptions) -> Result<Self, WatchError> {
        let root = absolute_path(root)?;
        let root = root.as_path();
        let resolved_root = root.canonicalize().ok().filter(|resolved| resolved != root);

        let patterns = if options.patterns.is_empty() {
            None
        } else {
            let mut builder = GitignoreBuilder::new(root);
            builder
                .case_insensitive(!options.case_sensitive)
                .map_err(|e| WatchError::config(root, e.to_string()))?;

            for pattern in &options.patterns {
                builder.add_line(None, pattern).map_err(|e| {
                    WatchError::config(root, format!("invalid pattern '{}': {}", pattern, e))
                })?;
            }

            Some(builder.build().map_err(|e| WatchError::config(root, e.to_string()))?)
        };

        Ok(Self {
            root: root.to_path_buf(),
            resolved_root,
            patterns,
            ignore_directories: options.ignore_directories,
        })
    }

    /// Check whether an event should reach the callbacks
    ///
    /// Moves pass when either end of the move is included.
    pub fn allows(&self, event: &RawEvent) -> bool {
        if self.ignore_directories && event.is_directory {
            return false;
        }

        if self.includes(&event.src_path, event.is_directory) {
            return true;
        }

        match event.dest_path {
            Some(ref dest) => self.includes(dest, event.is_directory),
            None => false,
        }
    }

    /// Check a single path against the inclusion patterns
    pub fn includes(&self, path: &Path, is_dir: bool) -> bool {
        let Some(ref patterns) = self.patterns else {
            return true;
        };

        // Parent matching needs a root-relative path, otherwise fall back to
        // plain (basename) matching.
        let relative = path
            .strip_prefix(&self.root)
            .ok()
            .or_else(|| path.strip_prefix(self.resolved_root.as_ref()?).ok());

        let matched = match relative {
            Some(relative) if !relative.as_os_str().is_empty() => {
                patterns.matched_path_or_any_parents(relative, is_dir)
            }
            _ => patterns.matched(path, is_dir),
        };

        matched.is_ignore()
    }

    /// Number of compiled patterns
    pub fn pattern_count(&self) -> usize {
        self.patterns.as_ref().map(|p| p.num_ignores() as usize).unwrap_or(0)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
