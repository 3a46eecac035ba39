//! End-to-end rendering tests for ProgressPrinter.
//!
//! These drive full runs (start → events → done) against an in-memory sink and
//! assert on the text that would reach the terminal.

use baton_core::render::CLEAR_LINE;
use baton_core::{Event, MemorySink, PrinterOptions, ProgressPrinter, RunStatus};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn printer(interactive: bool) -> (Arc<MemorySink>, ProgressPrinter) {
    let sink = Arc::new(MemorySink::new(interactive));
    let options = PrinterOptions {
        spinner_interval: Duration::from_millis(5),
        ..PrinterOptions::default()
    };
    let printer = ProgressPrinter::new(sink.clone(), options);
    (sink, printer)
}

fn item_event(kind: &str, item: serde_json::Value) -> Event {
    Event::new(kind, json!({ "item": item }))
}

// =============================================================================
// Backend A (item / turn events)
// =============================================================================

#[test]
fn test_read_file_scenario_plain() {
    let (sink, printer) = printer(false);
    printer.start("build");
    printer.on_event(&item_event(
        "item.started",
        json!({"type": "tool_call", "name": "read_file", "arguments": {"path": "/a/b/main.go"}}),
    ));
    printer.on_event(&item_event(
        "item.completed",
        json!({"type": "tool_call", "name": "read_file"}),
    ));
    printer.done("success", 1500);

    let err = sink.stderr();
    let lines: Vec<&str> = err.lines().collect();
    assert_eq!(lines[0], "[agent] build");
    assert!(lines[1].contains("▶ read_file(/a/b/main.go)"), "got {:?}", lines[1]);
    assert!(lines[1].contains("✓ ("), "completion should share the item line");
    assert_eq!(lines.len(), 3);
    assert!(lines[2].ends_with("success (1.5s)"));
    assert_eq!(lines[2], "✓ build success (1.5s)");
}

#[test]
fn test_unmatched_completion_prints_one_standalone_line() {
    let (sink, printer) = printer(false);
    printer.start("build");
    printer.on_event(&item_event("item.completed", json!({"type": "reasoning", "text": "Checked tests."})));
    printer.done("success", 10);

    let err = sink.stderr();
    let completed: Vec<&str> = err.lines().filter(|l| l.contains("✓ thinking")).collect();
    assert_eq!(completed.len(), 1);
    assert!(completed[0].ends_with("✓ thinking: Checked tests"));
}

#[test]
fn test_turn_markers_close_open_item() {
    let (sink, printer) = printer(false);
    printer.start("build");
    printer.on_event(&Event::new("turn.started", json!({"type": "turn.started"})));
    printer.on_event(&item_event("item.started", json!({"type": "command_execution", "command": "bash -lc 'ls'"})));
    printer.on_event(&Event::new("turn.completed", json!({"type": "turn.completed"})));
    printer.done("success", 10);

    let err = sink.stderr();
    let lines: Vec<&str> = err.lines().collect();
    assert!(lines[1].ends_with("──── turn started ────"));
    assert!(lines[2].ends_with("▶ $ ls "));
    assert!(lines[3].ends_with("──── turn completed ────"));
    assert_eq!(printer.status(), "starting...");
    assert_eq!(printer.activity(), "turn done");
}

#[test]
fn test_fallback_status_without_activity() {
    let (_sink, printer) = printer(false);
    printer.start("build");
    printer.on_event(&Event::new("thread.started", json!({})));
    assert_eq!(printer.status(), "processing...");
    printer.on_event(&Event::new("turn.completed", json!({})));
    assert_eq!(printer.status(), "turn completed");
    printer.on_event(&Event::new("item.completed", json!({})));
    assert_eq!(printer.status(), "item completed");
    assert_eq!(printer.activity(), "");
}

// =============================================================================
// Backend B (assistant / user messages)
// =============================================================================

#[test]
fn test_tool_use_and_result_pair() {
    let (sink, printer) = printer(false);
    printer.start("fix");
    printer.on_event(&Event::new(
        "assistant",
        json!({"message": {"content": [
            {"type": "text", "text": "Let me look"},
            {"type": "tool_use", "name": "Bash", "input": {"command": "cargo test"}}
        ]}}),
    ));
    printer.on_event(&Event::new(
        "user",
        json!({"message": {"content": [{"type": "tool_result", "content": "ok"}]}}),
    ));
    printer.on_event(&Event::new(
        "assistant",
        json!({"message": {"content": [{"type": "tool_use", "name": "Read", "input": {"file_path": "/x/lib.rs"}}]}}),
    ));
    printer.on_event(&Event::new(
        "user",
        json!({"message": {"content": [{"type": "tool_result", "is_error": true}]}}),
    ));
    printer.done("success", 10);

    let err = sink.stderr();
    let lines: Vec<&str> = err.lines().collect();
    assert!(lines[1].contains("▶ Bash: cargo test ✓ ("));
    assert!(lines[2].contains("▶ Read: /x/lib.rs ✗ ("));
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_tool_result_without_open_line_prints_nothing() {
    let (sink, printer) = printer(false);
    printer.start("fix");
    let before = sink.stderr();
    printer.on_event(&Event::new(
        "user",
        json!({"message": {"content": [{"type": "tool_result"}]}}),
    ));
    assert_eq!(sink.stderr(), before);
}

// =============================================================================
// Streaming and errors
// =============================================================================

#[test]
fn test_streaming_flushes_complete_lines() {
    let (sink, printer) = printer(false);
    printer.start("chat");
    printer.on_event(&Event::text("hello "));
    assert_eq!(printer.status(), "streaming...");
    printer.on_event(&Event::text("world\n"));
    assert_eq!(sink.stdout(), "hello world\n");
    assert_eq!(printer.token_count(), 2);
}

#[test]
fn test_plain_stream_line_keeps_item_line_combined() {
    let (sink, printer) = printer(false);
    printer.start("build");
    printer.on_event(&item_event(
        "item.started",
        json!({"type": "tool_call", "name": "read_file", "arguments": {"path": "/a/b/main.go"}}),
    ));
    printer.on_event(&Event::text("progress note\n"));
    printer.on_event(&item_event(
        "item.completed",
        json!({"type": "tool_call", "name": "read_file"}),
    ));
    printer.done("success", 1500);

    assert_eq!(sink.stdout(), "progress note\n");
    let err = sink.stderr();
    let combined = err.lines().filter(|l| l.contains("▶ read_file(/a/b/main.go) ✓ (")).count();
    assert_eq!(combined, 1, "got {:?}", err);
    assert_eq!(err.lines().count(), 3);
}

#[test]
fn test_done_flushes_partial_line() {
    let (sink, printer) = printer(false);
    printer.start("chat");
    printer.on_event(&Event::text("no newline yet"));
    printer.done(RunStatus::Other("interrupted".into()), 700);
    assert_eq!(sink.stdout(), "no newline yet\n");
    assert!(sink.stderr().ends_with("◷ chat interrupted (0.7s)\n"));
}

#[test]
fn test_error_event_renders_and_sets_status() {
    let (sink, printer) = printer(false);
    printer.start("build");
    printer.on_event(&Event::new("error", json!({"message": "disk full"})));
    assert!(sink.stderr().lines().any(|l| l == "[error] disk full"));
    assert_eq!(printer.status(), "error");
    assert_eq!(printer.activity(), "");

    printer.on_event(&Event::new("noise", json!({})));
    assert_eq!(printer.status(), "error");
    printer.set_status("retrying");
    assert_eq!(printer.status(), "retrying");
}

// =============================================================================
// Plain-mode brief log
// =============================================================================

#[test]
fn test_brief_lines_for_important_events() {
    let (sink, printer) = printer(false);
    printer.start("build");
    printer.on_event(&Event::new("exec.spawn", json!({"type": "exec.spawn", "command": ["make", "all"]})));
    printer.on_event(&Event::new("file.read", json!({"path": "/src/app.py"})));
    printer.on_event(&Event::new("content_block_delta", json!({"type": "content_block_delta"})));
    printer.on_event(&Event::new("unknown.kind", json!({})));

    let err = sink.stderr();
    let lines: Vec<&str> = err.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with("] running: make all"));
    assert!(lines[2].ends_with("] file.read: app.py"));
}

#[test]
fn test_brief_lines_suppressed_inside_item_line() {
    let (sink, printer) = printer(false);
    printer.start("build");
    printer.on_event(&item_event("item.started", json!({"type": "reasoning"})));
    printer.on_event(&Event::new("exec.output", json!({"type": "exec.output"})));
    printer.on_event(&item_event("item.completed", json!({"type": "reasoning"})));

    let err = sink.stderr();
    assert_eq!(err.lines().count(), 2);
    assert!(err.lines().nth(1).unwrap().contains("▶ reasoning ✓ ("));
}

// =============================================================================
// Interactive terminal
// =============================================================================

#[test]
fn test_interactive_start_draws_status_line() {
    let (sink, printer) = printer(true);
    printer.start("build");
    printer.done("success", 0);
    let err = sink.stderr();
    assert!(err.starts_with(&format!("{}⠋ build starting... [", CLEAR_LINE)));
    assert!(err.ends_with("build success (0.0s)\n"));
    assert!(err.contains("\n\x1b"), "summary should start on a fresh line");
}

#[test]
fn test_ticker_silent_while_item_line_open() {
    let (sink, printer) = printer(true);
    printer.start("build");
    thread::sleep(Duration::from_millis(30));

    printer.on_event(&item_event("item.started", json!({"type": "exec", "command": "make"})));
    let opened_at = sink.stderr().len();
    thread::sleep(Duration::from_millis(50));
    let during = sink.stderr()[opened_at..].to_string();
    assert!(during.is_empty(), "status redrawn during open item: {:?}", during);

    printer.on_event(&item_event("item.completed", json!({"type": "exec"})));
    thread::sleep(Duration::from_millis(30));
    let after = sink.stderr()[opened_at..].to_string();
    assert!(after.starts_with("✓ ("));
    assert!(after.contains(CLEAR_LINE), "status line should resume after the item closes");

    printer.done("success", 110);
    assert!(sink.stderr().ends_with("build success (0.1s)\n"));
}

#[test]
fn test_no_redraw_after_done() {
    let (sink, printer) = printer(true);
    printer.start("build");
    thread::sleep(Duration::from_millis(20));
    printer.done("error", 20);
    let finished = sink.stderr();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(sink.stderr(), finished);
    assert!(finished.contains("✗"));
}

#[test]
fn test_done_wakes_a_sleeping_ticker() {
    let sink = Arc::new(MemorySink::new(true));
    let options = PrinterOptions {
        spinner_interval: Duration::from_secs(10),
        ..PrinterOptions::default()
    };
    let printer = ProgressPrinter::new(sink.clone(), options);
    printer.start("build");
    thread::sleep(Duration::from_millis(10));

    let started = Instant::now();
    printer.done("success", 10);
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(sink.stderr().ends_with("build success (0.0s)\n"));
}

#[test]
fn test_interactive_content_lines_go_to_stderr() {
    let (sink, printer) = printer(true);
    printer.start("chat");
    printer.on_event(&Event::text("line one\n"));
    printer.done("success", 5);
    assert_eq!(sink.stdout(), "");
    assert!(sink.stderr().contains(&format!("{}line one\n", CLEAR_LINE)));
}
