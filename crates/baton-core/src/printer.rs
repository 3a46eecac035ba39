//! The progress printer: event dispatch plus the spinner ticker.

use crate::activity::extract_activity;
use crate::event::{Event, EventKind, RunStatus};
use crate::payload::{basename, command_text, display_value, truncate, ValueExt};
use crate::render::{Mark, RenderState};
use crate::sink::TerminalSink;
use crate::summary::{summarize_item, summarize_tool_use};
use baton_config::ProgressConfig;
use serde_json::Value;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// How long `done` waits for the ticker thread to exit.
const TICKER_JOIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Width of the name shown in brief plain-mode log lines.
const BRIEF_NAME_WIDTH: usize = 30;

/// Kinds never echoed as brief log lines: text deltas are streamed, and the
/// structural kinds already render their own lines.
const BRIEF_SKIP_KINDS: &[&str] = &[
    "message",
    "content_block_delta",
    "message_delta",
    "item.started",
    "item.completed",
    "turn.started",
    "turn.completed",
    "assistant",
    "user",
];

/// Printer tuning.
#[derive(Debug, Clone)]
pub struct PrinterOptions {
    /// Echo streamed assistant text as content lines
    pub stream_tokens: bool,
    /// Spinner redraw period
    pub spinner_interval: Duration,
    /// Status line width in terminal columns
    pub status_width: usize,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self {
            stream_tokens: true,
            spinner_interval: Duration::from_millis(100),
            status_width: 80,
        }
    }
}

impl From<&ProgressConfig> for PrinterOptions {
    fn from(config: &ProgressConfig) -> Self {
        Self {
            stream_tokens: config.stream_tokens,
            spinner_interval: Duration::from_millis(config.spinner_interval_ms),
            status_width: config.status_width,
        }
    }
}

struct Shared {
    state: Mutex<RenderState>,
    sink: Arc<dyn TerminalSink>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RenderState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Background thread that advances the spinner.
struct Ticker {
    stop_tx: mpsc::Sender<()>,
    exited_rx: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(shared: Arc<Shared>, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (exited_tx, exited_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("baton-spinner".to_string())
            .spawn(move || {
                loop {
                    {
                        let mut state = shared.lock();
                        if !state.running {
                            break;
                        }
                        state.spinner_frame = state.spinner_frame.wrapping_add(1);
                        state.draw_status(shared.sink.as_ref());
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                let _ = exited_tx.send(());
            })?;

        Ok(Self {
            stop_tx,
            exited_rx,
            handle,
        })
    }

    /// Signal the thread and wait a bounded time for it to finish.
    fn stop(self) {
        let _ = self.stop_tx.send(());
        match self.exited_rx.recv_timeout(TICKER_JOIN_TIMEOUT) {
            Err(RecvTimeoutError::Timeout) => {
                debug!("spinner thread did not exit within {:?}, detaching", TICKER_JOIN_TIMEOUT);
            }
            _ => {
                let _ = self.handle.join();
            }
        }
    }
}

/// Live progress view for a single agent run.
///
/// Lifecycle: [`start`](Self::start), any number of [`on_event`](Self::on_event),
/// then [`done`](Self::done). All state sits behind one mutex shared with the
/// spinner thread, so events and redraws never interleave mid-write.
pub struct ProgressPrinter {
    shared: Arc<Shared>,
    options: PrinterOptions,
    ticker: Mutex<Option<Ticker>>,
}

impl ProgressPrinter {
    pub fn new(sink: Arc<dyn TerminalSink>, options: PrinterOptions) -> Self {
        let state = RenderState::new(sink.is_interactive(), options.status_width);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                sink,
            }),
            options,
            ticker: Mutex::new(None),
        }
    }

    fn sink(&self) -> &dyn TerminalSink {
        self.shared.sink.as_ref()
    }

    pub fn is_interactive(&self) -> bool {
        self.shared.sink.is_interactive()
    }

    /// Begin a run labelled `label`.
    pub fn start(&self, label: &str) {
        self.stop_ticker();
        {
            let mut state = self.shared.lock();
            state.begin(label);
            if state.is_interactive() {
                state.draw_status(self.sink());
            } else {
                self.sink().write_err(&format!("[agent] {}\n", label));
                self.sink().flush();
            }
        }

        if self.is_interactive() {
            match Ticker::spawn(Arc::clone(&self.shared), self.options.spinner_interval) {
                Ok(ticker) => *self.ticker.lock().unwrap_or_else(|e| e.into_inner()) = Some(ticker),
                Err(e) => warn!("could not start spinner thread: {}", e),
            }
        }
    }

    /// Replace the fallback status phrase.
    pub fn set_status(&self, status: &str) {
        let mut state = self.shared.lock();
        self.apply_status(&mut state, status);
    }

    /// Replace the detailed activity phrase (shown in preference to the status).
    pub fn set_activity(&self, activity: &str) {
        let mut state = self.shared.lock();
        self.apply_activity(&mut state, activity);
    }

    fn apply_status(&self, state: &mut RenderState, status: &str) {
        state.status = status.to_string();
        if state.running {
            state.draw_status(self.sink());
        }
    }

    fn apply_activity(&self, state: &mut RenderState, activity: &str) {
        state.record_activity(activity);
        if state.running {
            state.draw_status(self.sink());
        }
    }

    /// Feed one event. Never fails; unrecognized or malformed events render nothing.
    pub fn on_event(&self, event: &Event) {
        let mut state = self.shared.lock();
        let state = &mut *state;
        let sink = self.sink();
        let payload = &event.payload;
        let is_object = payload.is_object();
        let kind = event.classify();

        state.event_count += 1;

        let activity = if is_object { extract_activity(payload) } else { None };
        if let Some(activity) = &activity {
            self.apply_activity(state, activity);
        }

        match kind {
            EventKind::ItemStarted if is_object => {
                let summary = item_summary(payload);
                state.open_item(sink, &summary);
            }
            EventKind::ItemCompleted if is_object => {
                let summary = item_summary(payload);
                state.complete_item(sink, &summary);
            }
            EventKind::TurnStarted => state.turn_marker(sink, true),
            EventKind::TurnCompleted => state.turn_marker(sink, false),
            EventKind::Assistant if is_object => {
                for block in content_blocks(payload).filter(|b| b.text("type") == Some("tool_use")) {
                    state.open_item(sink, &summarize_tool_use(block));
                }
            }
            EventKind::User if is_object => {
                let blocks: Vec<&Value> = content_blocks(payload).collect();
                if blocks.iter().any(|b| b.text("type") == Some("tool_result")) {
                    let failed = blocks.iter().any(|b| b.flag("is_error"));
                    let mark = if failed { Mark::Failure } else { Mark::Success };
                    state.finish_item_line(sink, mark);
                }
            }
            _ if !state.is_interactive() && !event.kind.is_empty() => {
                self.log_brief(state, &event.kind, payload, activity.as_deref());
            }
            _ => {}
        }

        if kind == EventKind::Error {
            let message = error_message(payload);
            state.flush_line(sink, &format!("[error] {}", message), true);
            self.apply_status(state, "error");
            self.apply_activity(state, "");
        } else if self.options.stream_tokens && is_object {
            if let Some(text) = stream_text(payload) {
                state.push_stream(sink, text);
                if state.activity.is_empty() {
                    self.apply_status(state, "streaming...");
                }
            }
        }

        if state.activity.is_empty() {
            let fallback = match kind {
                EventKind::ThreadStarted | EventKind::TurnStarted => Some("processing..."),
                EventKind::TurnCompleted => Some("turn completed"),
                EventKind::ItemCompleted => Some("item completed"),
                _ => None,
            };
            if let Some(status) = fallback {
                self.apply_status(state, status);
            }
        }
    }

    /// Plain-mode one-liners for kinds with no dedicated rendering.
    fn log_brief(&self, state: &RenderState, kind: &str, payload: &Value, activity: Option<&str>) {
        if BRIEF_SKIP_KINDS.contains(&kind) {
            return;
        }
        // an item line is waiting for its completion mark
        if state.item_line_open {
            debug!(kind, "brief log suppressed while an item line is open");
            return;
        }

        if let Some(activity) = activity {
            state.brief(self.sink(), activity);
            return;
        }

        match kind {
            "exec.spawn" | "tool_call" | "function_call" => {
                let name = payload
                    .first_present(&["name", "command", "tool"])
                    .and_then(|v| command_text(v, 2))
                    .unwrap_or_default();
                state.brief(self.sink(), &format!("{}: {}", kind, truncate(&name, BRIEF_NAME_WIDTH)));
            }
            k if k.starts_with("file.") || matches!(k, "read_file" | "write_file" | "apply_patch") => {
                let name = payload.first_text(&["path", "file"]).map(basename).unwrap_or("");
                state.brief(self.sink(), &format!("{}: {}", kind, name));
            }
            _ => debug!(kind, "event not rendered"),
        }
    }

    /// Finish the run: stop the spinner, close open lines, print the summary.
    ///
    /// Synchronous: waits up to 200 ms for the spinner thread, which is woken
    /// through its stop channel rather than left to finish its sleep.
    pub fn done(&self, status: impl Into<RunStatus>, elapsed_ms: u64) {
        let status = status.into();
        self.shared.lock().running = false;
        self.stop_ticker();

        let mut state = self.shared.lock();
        let sink = self.sink();
        state.close_item_line(sink);
        state.flush_partial(sink);
        state.clear_status(sink);
        state.final_summary(sink, &status, elapsed_ms);
    }

    fn stop_ticker(&self) {
        let ticker = self.ticker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(ticker) = ticker {
            ticker.stop();
        }
    }

    pub fn status(&self) -> String {
        self.shared.lock().status.clone()
    }

    pub fn activity(&self) -> String {
        self.shared.lock().activity.clone()
    }

    pub fn token_count(&self) -> usize {
        self.shared.lock().token_count
    }

    pub fn event_count(&self) -> usize {
        self.shared.lock().event_count
    }

    /// Most recent distinct activities, oldest first.
    pub fn recent_activities(&self) -> Vec<String> {
        self.shared.lock().recent_activities.iter().cloned().collect()
    }
}

impl Drop for ProgressPrinter {
    fn drop(&mut self) {
        self.shared.lock().running = false;
        self.stop_ticker();
    }
}

fn item_summary(payload: &Value) -> String {
    match payload.get("item") {
        Some(item) if item.is_object() => summarize_item(item),
        _ => "item".to_string(),
    }
}

/// `payload.message.content[]` blocks of a backend-B message.
fn content_blocks(payload: &Value) -> impl Iterator<Item = &Value> {
    payload
        .get("message")
        .and_then(|m| m.array("content"))
        .into_iter()
        .flatten()
        .filter(|b| b.is_object())
}

fn error_message(payload: &Value) -> String {
    if let Some(message) = payload.text("message") {
        return message.to_string();
    }
    match payload.get("error") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(error) if error.is_object() => error
            .text("message")
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        _ => display_value(payload),
    }
}

/// A streamed text fragment: `text`, or the `delta.text` of a backend-B text delta.
fn stream_text(payload: &Value) -> Option<&str> {
    payload.text("text").or_else(|| {
        let delta = payload.get("delta")?;
        match delta.text("type") {
            Some("text_delta") | None => delta.text("text"),
            Some(_) => None,
        }
    })
}
