//! Watchdog CLI - wd command
//!
//! Watches a directory and prints every event until Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use watchdog::WatchdogBuilder;

mod output;
mod settings;

use output::Format;
use settings::Overrides;

/// Watchdog - print file system events for a directory
#[derive(Parser)]
#[command(name = "wd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to watch
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Only watch the top-level directory
    #[arg(long)]
    no_recursive: bool,

    /// Only report paths matching this glob (repeatable)
    #[arg(short, long = "pattern")]
    patterns: Vec<String>,

    /// Skip events about directories
    #[arg(long)]
    ignore_directories: bool,

    /// Match patterns case-insensitively
    #[arg(long)]
    case_insensitive: bool,

    /// TOML file with watch options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print events as NDJSON
    #[arg(long)]
    json: bool,

    /// How long to wait for the watcher to shut down (milliseconds)
    #[arg(long, default_value = "2000")]
    stop_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable with --json
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let base = settings::load(cli.config.as_deref())?;
    let options = settings::apply(
        base,
        &Overrides {
            no_recursive: cli.no_recursive,
            patterns: cli.patterns.clone(),
            ignore_directories: cli.ignore_directories,
            case_insensitive: cli.case_insensitive,
        },
    );
    tracing::debug!("Watch options: {:?}", options);
    let format = if cli.json { Format::Json } else { Format::Pretty };

    let mut watchdog = WatchdogBuilder::new(&cli.path)
        .options(options)
        .stop_timeout(Duration::from_millis(cli.stop_timeout_ms))
        .on_any(move |event| output::print_event(event, format))
        .build()
        .with_context(|| format!("Cannot watch {}", cli.path.display()))?;

    let guard = watchdog.enter().context("Failed to start watchdog")?;

    if format == Format::Pretty {
        println!(
            "{} {} {}",
            "Watching".bold(),
            cli.path.display(),
            "(Ctrl+C to stop)".dimmed()
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    guard.exit().context("Failed to stop watchdog")?;

    if format == Format::Pretty {
        println!("\n{}", "Watchdog stopped".dimmed());
    }

    Ok(())
}
