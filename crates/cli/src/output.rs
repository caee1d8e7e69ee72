//! Event printing (colored text or NDJSON)

use owo_colors::OwoColorize;
use serde::Serialize;
use watchdog::{EventKind, WatchEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
}

/// NDJSON line for one event
#[derive(Debug, Serialize)]
struct EventRecord {
    event: &'static str,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dest_path: Option<String>,
    is_directory: bool,
}

impl From<&WatchEvent> for EventRecord {
    fn from(event: &WatchEvent) -> Self {
        Self {
            event: event.kind.as_str(),
            path: event.path.display().to_string(),
            dest_path: event.dest_path.as_ref().map(|p| p.display().to_string()),
            is_directory: event.is_directory,
        }
    }
}

pub fn print_event(event: &WatchEvent, format: Format) -> anyhow::Result<()> {
    println!("{}", render(event, format)?);
    Ok(())
}

fn render(event: &WatchEvent, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string(&EventRecord::from(event))?),
        Format::Pretty => Ok(render_pretty(event)),
    }
}

fn render_pretty(event: &WatchEvent) -> String {
    let label = format!("[{}]", event.kind);
    let label = match event.kind {
        EventKind::Created => label.green().to_string(),
        EventKind::Modified => label.yellow().to_string(),
        EventKind::Deleted => label.red().to_string(),
        EventKind::Moved => label.cyan().to_string(),
    };

    let suffix = if event.is_directory { "/" } else { "" };
    let mut line = format!("{} {}{}", label, event.path.display(), suffix);

    if let Some(ref dest) = event.dest_path {
        line.push_str(&format!("\n  → Moved to: {}{}", dest.display(), suffix));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use watchdog::RawEvent;

    #[test]
    fn test_json_line() -> anyhow::Result<()> {
        let event = WatchEvent::from(RawEvent::created("/w/benchy.3mf", false));
        assert_eq!(
            render(&event, Format::Json)?,
            r#"{"event":"created","path":"/w/benchy.3mf","is_directory":false}"#
        );

        let event = WatchEvent::from(RawEvent::moved("/w/a", "/w/b", true));
        assert_eq!(
            render(&event, Format::Json)?,
            r#"{"event":"moved","path":"/w/a","dest_path":"/w/b","is_directory":true}"#
        );
        Ok(())
    }

    #[test]
    fn test_pretty_line() {
        let event = WatchEvent {
            kind: EventKind::Moved,
            path: PathBuf::from("/w/old"),
            dest_path: Some(PathBuf::from("/w/new")),
            is_directory: true,
        };

        let line = render_pretty(&event);
        assert!(line.contains("[moved]"));
        assert!(line.contains("/w/old/"));
        assert!(line.ends_with("Moved to: /w/new/"));
    }
}
