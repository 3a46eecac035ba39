//! Where events come from: a line-oriented stream (stdin, a file) or the stdout of
//! a spawned agent command.

use baton_core::{Event, ProgressPrinter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("agent command is empty")]
    EmptyCommand,

    #[error("failed to open event file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read event stream: {0}")]
    Read(#[from] std::io::Error),
}

/// Turn one line of backend output into an event.
///
/// Blank lines are skipped. JSON objects are normalized with [`Event::from_record`];
/// anything else becomes a `text` event so plain output still streams through.
pub fn parse_event_line(line: &str) -> Option<Event> {
    if line.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(record) if record.is_object() => Event::from_record(record),
        Ok(_) => Some(Event::text(format!("{}\n", line))),
        Err(e) => {
            if line.trim_start().starts_with('{') {
                warn!("undecodable JSON event line ({}): {}", e, line);
            }
            Some(Event::text(format!("{}\n", line)))
        }
    }
}

/// Feed every line of `reader` to `printer`. Returns the number of events delivered.
///
/// Lines are decoded lossily: invalid UTF-8 is rendered with replacement
/// characters instead of ending the run.
pub async fn pump_events<R>(mut reader: R, printer: &ProgressPrinter) -> Result<usize, SourceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut delivered = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(trim_line_ending(&buf));
        match parse_event_line(&line) {
            Some(event) => {
                printer.on_event(&event);
                delivered += 1;
            }
            None => debug!("skipping blank line"),
        }
    }

    Ok(delivered)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Read events from a file.
pub async fn pump_file(path: &Path, printer: &ProgressPrinter) -> Result<usize, SourceError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    pump_events(BufReader::new(file), printer).await
}

/// Read events from this process's stdin.
pub async fn pump_stdin(printer: &ProgressPrinter) -> Result<usize, SourceError> {
    pump_events(BufReader::new(tokio::io::stdin()), printer).await
}

/// Spawn `command`, render its stdout as events, and wait for it to exit.
///
/// The child's stderr is inherited. The child is killed if this future is dropped,
/// which is how an interrupted run tears it down.
pub async fn run_command(command: &[String], printer: &ProgressPrinter) -> Result<ExitStatus, SourceError> {
    let (program, args) = command.split_first().ok_or(SourceError::EmptyCommand)?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| SourceError::Spawn {
            program: program.clone(),
            source,
        })?;

    if let Some(stdout) = child.stdout.take() {
        let delivered = pump_events(BufReader::new(stdout), printer).await?;
        debug!("{} delivered {} events", program, delivered);
    }

    let status = child.wait().await?;
    if !status.success() {
        warn!("{} exited with {}", program, status);
    }
    Ok(status)
}
