//! Event records and run outcomes.

use crate::payload::ValueExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// One record from an agent's execution stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Build an `error` event carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("error", json!({ "message": message.into() }))
    }

    /// A plain text fragment, as produced by backends that do not emit JSON.
    pub fn text(fragment: impl Into<String>) -> Self {
        Self::new("text", json!({ "text": fragment.into() }))
    }

    /// Normalize a raw backend record into an event.
    ///
    /// The kind comes from `kind`, `type` or `event`. Records that wrap their body in a
    /// `payload` object use it; otherwise the record itself is the payload, which is how
    /// Codex `--json` and Claude `stream-json` output arrives. Non-object records are
    /// rejected.
    pub fn from_record(record: Value) -> Option<Self> {
        if !record.is_object() {
            return None;
        }
        let kind = record
            .first_text(&["kind", "type", "event"])
            .unwrap_or("")
            .to_string();
        let nested = record.get("payload").filter(|p| p.is_object()).cloned();
        Some(Self {
            kind,
            payload: nested.unwrap_or(record),
        })
    }

    pub fn classify(&self) -> EventKind<'_> {
        EventKind::parse(&self.kind)
    }
}

/// Event kinds that drive rendering decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind<'a> {
    ThreadStarted,
    TurnStarted,
    TurnCompleted,
    ItemStarted,
    ItemCompleted,
    /// Backend-B assistant message (may carry `tool_use` blocks).
    Assistant,
    /// Backend-B user message (may carry `tool_result` blocks).
    User,
    Error,
    Other(&'a str),
}

impl<'a> EventKind<'a> {
    pub fn parse(kind: &'a str) -> Self {
        match kind {
            "thread.started" => EventKind::ThreadStarted,
            "turn.started" => EventKind::TurnStarted,
            "turn.completed" => EventKind::TurnCompleted,
            "item.started" => EventKind::ItemStarted,
            "item.completed" => EventKind::ItemCompleted,
            "assistant" => EventKind::Assistant,
            "user" => EventKind::User,
            "error" => EventKind::Error,
            other => EventKind::Other(other),
        }
    }

    pub fn as_str(&self) -> &'a str {
        match *self {
            EventKind::ThreadStarted => "thread.started",
            EventKind::TurnStarted => "turn.started",
            EventKind::TurnCompleted => "turn.completed",
            EventKind::ItemStarted => "item.started",
            EventKind::ItemCompleted => "item.completed",
            EventKind::Assistant => "assistant",
            EventKind::User => "user",
            EventKind::Error => "error",
            EventKind::Other(kind) => kind,
        }
    }
}

/// Final outcome of a run, shown in the summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Rendered with `✓`
    Success,
    /// Rendered with `✗`
    Error,
    /// Anything else (`interrupted`, `timeout`, ...), rendered with `◷`
    Other(String),
}

impl RunStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "success" => RunStatus::Success,
            "error" => RunStatus::Error,
            other => RunStatus::Other(other.to_string()),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RunStatus::Success => "✓",
            RunStatus::Error => "✗",
            RunStatus::Other(_) => "◷",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Error => "error",
            RunStatus::Other(s) => s,
        }
    }
}

impl From<&str> for RunStatus {
    fn from(s: &str) -> Self {
        RunStatus::parse(s)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record_uses_nested_payload() {
        let record = json!({"type": "item.started", "payload": {"item": {"type": "reasoning"}}});
        let event = Event::from_record(record).unwrap();
        assert_eq!(event.kind, "item.started");
        assert_eq!(event.payload, json!({"item": {"type": "reasoning"}}));
    }

    #[test]
    fn test_from_record_flat_record_is_its_own_payload() {
        let record = json!({"type": "turn.completed", "usage": {"input_tokens": 10}});
        let event = Event::from_record(record.clone()).unwrap();
        assert_eq!(event.classify(), EventKind::TurnCompleted);
        assert_eq!(event.payload, record);
    }

    #[test]
    fn test_from_record_kind_fallbacks() {
        let event = Event::from_record(json!({"event": "exec.spawn"})).unwrap();
        assert_eq!(event.kind, "exec.spawn");
        let event = Event::from_record(json!({"foo": 1})).unwrap();
        assert_eq!(event.kind, "");
        assert!(Event::from_record(json!([1, 2])).is_none());
    }

    #[test]
    fn test_event_kind_round_trip_names() {
        for name in ["thread.started", "turn.started", "item.completed", "assistant", "error"] {
            assert_eq!(EventKind::parse(name).as_str(), name);
        }
        assert_eq!(EventKind::parse("exec.output"), EventKind::Other("exec.output"));
    }

    #[test]
    fn test_run_status() {
        assert_eq!(RunStatus::parse("success").icon(), "✓");
        assert_eq!(RunStatus::parse("error").icon(), "✗");
        let timeout = RunStatus::from("timeout");
        assert_eq!(timeout.icon(), "◷");
        assert_eq!(timeout.to_string(), "timeout");
    }
}
