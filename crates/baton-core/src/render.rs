//! Render state and the line renderer.
//!
//! Two kinds of output share one terminal:
//! - the **status line**: ephemeral, redrawn in place with `\r\x1b[K`, never followed
//!   by a line break, and only ever drawn on an interactive terminal;
//! - **content lines**: permanent, always terminated by a line break.
//!
//! An *item line* is a content line written in two halves (`▶ summary ` at start,
//! `✓ (elapsed)` at completion). While one is open the status line must not be
//! drawn, otherwise the spinner would overwrite the unterminated half.
//!
//! Every method here expects the caller to hold the printer's state lock.

use crate::event::RunStatus;
use crate::payload::{format_elapsed, ELLIPSIS};
use crate::sink::TerminalSink;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use std::collections::VecDeque;
use std::time::Instant;
use unicode_width::UnicodeWidthChar;

/// Clear the current terminal line and return to column 0.
pub const CLEAR_LINE: &str = "\r\x1b[K";

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Number of recent activities remembered.
pub const ACTIVITY_HISTORY: usize = 10;

pub const TURN_STARTED_MARKER: &str = "──── turn started ────";
pub const TURN_COMPLETED_MARKER: &str = "──── turn completed ────";

/// Completion mark appended to an item line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Success,
    Failure,
}

impl Mark {
    pub fn glyph(self) -> &'static str {
        match self {
            Mark::Success => "✓",
            Mark::Failure => "✗",
        }
    }
}

/// Mutable state of one run.
#[derive(Debug)]
pub struct RenderState {
    pub label: String,
    pub status: String,
    pub activity: String,
    pub spinner_frame: usize,
    pub token_count: usize,
    pub event_count: usize,
    pub running: bool,
    pub item_line_open: bool,
    pub current_line: String,
    pub has_printed_content: bool,
    pub recent_activities: VecDeque<String>,
    pub started_at: Instant,
    interactive: bool,
    status_width: usize,
}

impl RenderState {
    pub fn new(interactive: bool, status_width: usize) -> Self {
        Self {
            label: String::new(),
            status: String::new(),
            activity: String::new(),
            spinner_frame: 0,
            token_count: 0,
            event_count: 0,
            running: false,
            item_line_open: false,
            current_line: String::new(),
            has_printed_content: false,
            recent_activities: VecDeque::with_capacity(ACTIVITY_HISTORY),
            started_at: Instant::now(),
            interactive,
            status_width,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Reset everything for a new run labelled `label`.
    pub fn begin(&mut self, label: &str) {
        *self = Self::new(self.interactive, self.status_width);
        self.label = label.to_string();
        self.status = "starting...".to_string();
        self.running = true;
    }

    pub fn elapsed(&self) -> String {
        format_elapsed(self.started_at.elapsed())
    }

    /// Record an activity, remembering it unless it repeats the previous one.
    pub fn record_activity(&mut self, activity: &str) {
        self.activity = activity.to_string();
        if activity.is_empty() || self.recent_activities.back().map(String::as_str) == Some(activity) {
            return;
        }
        if self.recent_activities.len() == ACTIVITY_HISTORY {
            self.recent_activities.pop_front();
        }
        self.recent_activities.push_back(activity.to_string());
    }

    /// The status line text, fitted to the configured width.
    pub fn status_line(&self) -> String {
        let spinner = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
        let mut parts = vec![format!("{} {}", spinner, self.label)];
        if !self.activity.is_empty() {
            parts.push(self.activity.clone());
        } else if !self.status.is_empty() {
            parts.push(self.status.clone());
        }
        parts.push(format!("[{}]", self.elapsed()));
        if self.token_count > 0 {
            parts.push(format!("{} tok", self.token_count));
        }
        if self.event_count > 0 {
            parts.push(format!("{} ev", self.event_count));
        }
        fit_width(&parts.join(" "), self.status_width)
    }

    /// Redraw the status line in place. No-op off-terminal or while an item line is open.
    pub fn draw_status(&self, sink: &dyn TerminalSink) {
        if !self.interactive || self.item_line_open {
            return;
        }
        sink.write_err(&format!("{}{}", CLEAR_LINE, self.status_line()));
        sink.flush();
    }

    fn redraw_if_running(&self, sink: &dyn TerminalSink) {
        if self.running {
            self.draw_status(sink);
        }
    }

    /// Terminate an open item line with a bare line break.
    pub fn close_item_line(&mut self, sink: &dyn TerminalSink) {
        if self.item_line_open {
            sink.write_err("\n");
            sink.flush();
            self.item_line_open = false;
        }
    }

    /// Write a permanent content line above the status line.
    ///
    /// An open item line is only terminated when the content shares its stream:
    /// plain-mode stdout lines leave a stderr item line waiting for its mark.
    pub fn flush_line(&mut self, sink: &dyn TerminalSink, text: &str, is_error: bool) {
        if self.interactive || is_error {
            self.close_item_line(sink);
        }
        let terminator = if text.ends_with('\n') { "" } else { "\n" };

        if self.interactive {
            sink.write_err(&format!("{}{}{}", CLEAR_LINE, text, terminator));
            sink.flush();
            self.has_printed_content = true;
            self.redraw_if_running(sink);
        } else {
            let line = format!("{}{}", text, terminator);
            if is_error {
                sink.write_err(&line);
            } else {
                sink.write_out(&line);
            }
            sink.flush();
        }
    }

    /// Accumulate streamed text, flushing every completed non-empty line.
    pub fn push_stream(&mut self, sink: &dyn TerminalSink, fragment: &str) {
        self.current_line.push_str(fragment);
        self.token_count += fragment.split_whitespace().count();

        while let Some(newline) = self.current_line.find('\n') {
            let line: String = self.current_line.drain(..=newline).collect();
            let line = &line[..line.len() - 1];
            if !line.is_empty() {
                self.flush_line(sink, line, false);
            }
        }
    }

    /// Flush whatever partial line is still buffered.
    pub fn flush_partial(&mut self, sink: &dyn TerminalSink) {
        if !self.current_line.is_empty() {
            let rest = std::mem::take(&mut self.current_line);
            self.flush_line(sink, &rest, false);
        }
    }

    fn write_item_text(&self, sink: &dyn TerminalSink, text: &str) {
        if self.interactive {
            sink.write_err(&format!("{}{}", CLEAR_LINE, text));
        } else {
            sink.write_err(text);
        }
        sink.flush();
    }

    /// Start an item line: `[elapsed] ▶ summary ` without a line break.
    pub fn open_item(&mut self, sink: &dyn TerminalSink, summary: &str) {
        self.close_item_line(sink);
        self.write_item_text(sink, &format!("[{}] ▶ {} ", self.elapsed(), summary));
        self.item_line_open = true;
        self.has_printed_content = true;
    }

    /// Complete the open item line, or print a standalone completed line if none is open.
    pub fn complete_item(&mut self, sink: &dyn TerminalSink, summary: &str) {
        if self.item_line_open {
            self.finish_item_line(sink, Mark::Success);
        } else {
            self.write_item_text(sink, &format!("[{}] ✓ {}\n", self.elapsed(), summary));
            self.has_printed_content = true;
            self.redraw_if_running(sink);
        }
    }

    /// Complete the open item line with `mark`. Does nothing when no line is open.
    pub fn finish_item_line(&mut self, sink: &dyn TerminalSink, mark: Mark) {
        if !self.item_line_open {
            return;
        }
        sink.write_err(&format!("{} ({})\n", mark.glyph(), self.elapsed()));
        sink.flush();
        self.item_line_open = false;
        self.redraw_if_running(sink);
    }

    /// Write a decorated turn boundary line.
    pub fn turn_marker(&mut self, sink: &dyn TerminalSink, started: bool) {
        self.close_item_line(sink);
        let marker = if started {
            TURN_STARTED_MARKER
        } else {
            TURN_COMPLETED_MARKER
        };
        self.write_item_text(sink, &format!("[{}] {}\n", self.elapsed(), marker));
        self.has_printed_content = true;
        self.redraw_if_running(sink);
    }

    /// A timestamped one-line log entry (plain output only).
    pub fn brief(&self, sink: &dyn TerminalSink, text: &str) {
        sink.write_err(&format!("[{}] {}\n", self.elapsed(), text));
        sink.flush();
    }

    /// Clear the status line before the summary.
    pub fn clear_status(&self, sink: &dyn TerminalSink) {
        if self.interactive {
            sink.write_err(CLEAR_LINE);
            sink.flush();
        }
    }

    /// The final `icon label status (secs)` line.
    pub fn final_summary(&self, sink: &dyn TerminalSink, status: &RunStatus, elapsed_ms: u64) {
        let icon = if self.interactive {
            let color = match status {
                RunStatus::Success => Color::Green,
                RunStatus::Error => Color::Red,
                RunStatus::Other(_) => Color::Yellow,
            };
            format!("{}{}{}", SetForegroundColor(color), status.icon(), ResetColor)
        } else {
            status.icon().to_string()
        };
        let message = format!(
            "{} {} {} ({:.1}s)",
            icon,
            self.label,
            status,
            elapsed_ms as f64 / 1000.0
        );

        if self.has_printed_content || !self.interactive {
            sink.write_err(&format!("{}\n", message));
        } else {
            sink.write_err(&format!("\n{}\n", message));
        }
        sink.flush();
    }
}

/// Fit `line` into `width` terminal columns, ending in [`ELLIPSIS`] when cut.
pub fn fit_width(line: &str, width: usize) -> String {
    let total: usize = line.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return line.to_string();
    }

    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut used = 0;
    let mut fitted = String::new();
    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        fitted.push(c);
    }
    fitted.push_str(ELLIPSIS);
    fitted
}
