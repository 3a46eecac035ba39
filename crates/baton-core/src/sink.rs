//! Output streams the renderer writes to.
//!
//! The renderer never talks to `stdout`/`stderr` directly; it goes through a
//! [`TerminalSink`] so the same state machine drives a real terminal, a plain log,
//! or an in-memory capture in tests.

use crossterm::tty::IsTty;
use std::io::{self, Write};
use std::sync::Mutex;

/// Interface for terminal output.
///
/// Writes are best effort: a closed pipe or terminal must never abort a run, so
/// implementations swallow I/O errors.
pub trait TerminalSink: Send + Sync {
    /// Write to the primary (standard output) stream
    fn write_out(&self, text: &str);

    /// Write to the diagnostic (standard error) stream
    fn write_err(&self, text: &str);

    /// Flush both streams
    fn flush(&self);

    /// Whether the error stream is an interactive terminal that accepts cursor control
    fn is_interactive(&self) -> bool;
}

/// Sink backed by the process's standard streams.
pub struct ConsoleSink {
    interactive: bool,
}

impl ConsoleSink {
    /// Detect interactivity from whether stderr is a terminal.
    pub fn detect() -> Self {
        Self {
            interactive: io::stderr().is_tty(),
        }
    }

    /// Force interactive (`true`) or plain (`false`) rendering.
    pub fn with_interactive(interactive: bool) -> Self {
        Self { interactive }
    }
}

impl TerminalSink for ConsoleSink {
    fn write_out(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn write_err(&self, text: &str) {
        let mut err = io::stderr().lock();
        let _ = err.write_all(text.as_bytes());
        let _ = err.flush();
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Sink that records everything written, for tests and embedding.
pub struct MemorySink {
    interactive: bool,
    out: Mutex<String>,
    err: Mutex<String>,
}

impl MemorySink {
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            out: Mutex::new(String::new()),
            err: Mutex::new(String::new()),
        }
    }

    /// Everything written to the primary stream so far
    pub fn stdout(&self) -> String {
        self.out.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Everything written to the diagnostic stream so far
    pub fn stderr(&self) -> String {
        self.err.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TerminalSink for MemorySink {
    fn write_out(&self, text: &str) {
        self.out.lock().unwrap_or_else(|e| e.into_inner()).push_str(text);
    }

    fn write_err(&self, text: &str) {
        self.err.lock().unwrap_or_else(|e| e.into_inner()).push_str(text);
    }

    fn flush(&self) {}

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// A no-op sink for when output is not needed
pub struct NullSink;

impl TerminalSink for NullSink {
    fn write_out(&self, _text: &str) {}
    fn write_err(&self, _text: &str) {}
    fn flush(&self) {}
    fn is_interactive(&self) -> bool {
        false
    }
}
