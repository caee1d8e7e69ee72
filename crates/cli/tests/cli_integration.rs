//! Process-level tests for the wd binary

use anyhow::{bail, Result};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// A run that should fail fast; anything slower is a watcher that started
const DEADLINE: Duration = Duration::from_secs(10);

fn wd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wd"))
}

/// Run `wd` to completion, killing it if it outlives the deadline
fn run(mut command: Command) -> Result<Output> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let started = Instant::now();
    while child.try_wait()?.is_none() {
        if started.elapsed() >= DEADLINE {
            child.kill()?;
            let output = child.wait_with_output()?;
            bail!(
                "wd still running after {:?}; stderr: {}",
                DEADLINE,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        thread::sleep(Duration::from_millis(20));
    }

    Ok(child.wait_with_output()?)
}

#[test]
fn test_missing_directory_fails_fast() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let missing = temp_dir.path().join("no-such-dir");

    let mut command = wd();
    command.arg(&missing);
    let output = run(command)?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot watch"), "stderr: {}", stderr);
    assert!(stderr.contains("path does not exist"), "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_invalid_pattern_fails_fast() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let mut command = wd();
    command.arg(temp_dir.path()).args(["--pattern", "models/{a,b"]);
    let output = run(command)?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid pattern"), "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_unreadable_config_fails_fast() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = temp_dir.path().join("watch.toml");

    let mut command = wd();
    command.arg(temp_dir.path()).arg("--config").arg(&config);
    let output = run(command)?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"), "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_help_lists_options() -> Result<()> {
    let mut command = wd();
    command.arg("--help");
    let output = run(command)?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--pattern", "--no-recursive", "--json", "--stop-timeout-ms"] {
        assert!(stdout.contains(flag), "missing {} in help", flag);
    }
    Ok(())
}
