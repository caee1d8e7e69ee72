//! Watch options from a TOML file plus command-line overrides

use anyhow::{Context, Result};
use std::path::Path;
use watchdog::WatchOptions;

/// Flags that override the file settings
#[derive(Debug, Default)]
pub struct Overrides {
    pub no_recursive: bool,
    pub patterns: Vec<String>,
    pub ignore_directories: bool,
    pub case_insensitive: bool,
}

/// Load options from `path`, or defaults when no file is given
pub fn load(path: Option<&Path>) -> Result<WatchOptions> {
    let Some(path) = path else {
        return Ok(WatchOptions::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Apply command-line overrides
///
/// Flags only ever tighten the file settings; patterns are appended.
pub fn apply(mut options: WatchOptions, overrides: &Overrides) -> WatchOptions {
    if overrides.no_recursive {
        options.recursive = false;
    }
    if overrides.ignore_directories {
        options.ignore_directories = true;
    }
    if overrides.case_insensitive {
        options.case_sensitive = false;
    }
    options.patterns.extend(overrides.patterns.iter().cloned());
    options
}
