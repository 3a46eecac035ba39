//! One-line descriptions of agent work items.
//!
//! Each backend names the same ideas differently (`function_call` vs `tool_use`,
//! `arguments` vs `input`), so items are first classified into an [`ItemKind`] and
//! then summarized with kind-specific heuristics. Anything unrecognized falls back
//! to a bounded search for a command- or path-like field.

use crate::payload::{basename, command_text, display_value, join_values, truncate, ValueExt};
use serde_json::Value;

/// Default width of an item summary.
pub const DEFAULT_SUMMARY_WIDTH: usize = 60;

const TOOL_DETAIL_WIDTH: usize = 35;
const TEXT_WIDTH: usize = 50;
const SHELL_WIDTH: usize = 55;
const FALLBACK_WIDTH: usize = 45;
const TOOL_USE_DETAIL_WIDTH: usize = 45;

/// Argument keys that best describe a tool call, in priority order.
const TOOL_DETAIL_KEYS: &[&str] = &["path", "file", "command", "cmd", "query", "url", "pattern"];

/// Input keys for backend-B `tool_use` blocks.
const TOOL_USE_DETAIL_KEYS: &[&str] = &["command", "pattern", "file_path", "path", "glob", "description"];

/// Keys searched by the generic fallback.
const FALLBACK_KEYS: &[&str] = &["command", "cmd", "cmdline", "path", "file", "name", "input"];

/// Deepest nesting level inspected by the fallback search.
const FALLBACK_MAX_DEPTH: usize = 2;

/// Shell flag whose argument is the script actually being run.
const SHELL_SCRIPT_FLAG: &str = "-lc";

/// Work item categories, keyed by the item's `type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    ToolCall,
    Reasoning,
    Message,
    Exec,
    FileRead,
    FileWrite,
    Shell,
    Other,
}

impl ItemKind {
    pub fn parse(discriminator: &str) -> Self {
        match discriminator {
            "tool_call" | "function_call" | "tool_use" => ItemKind::ToolCall,
            "reasoning" | "thinking" => ItemKind::Reasoning,
            "agent_message" | "assistant_message" | "message" => ItemKind::Message,
            "exec" => ItemKind::Exec,
            "file_read" | "read_file" => ItemKind::FileRead,
            "file_write" | "write_file" | "patch" | "apply_patch" => ItemKind::FileWrite,
            "shell" | "bash" | "command" | "command_execution" | "local_shell_call" => ItemKind::Shell,
            _ => ItemKind::Other,
        }
    }
}

/// Summarize an item using [`DEFAULT_SUMMARY_WIDTH`].
pub fn summarize_item(item: &Value) -> String {
    summarize_item_with_width(item, DEFAULT_SUMMARY_WIDTH)
}

/// Summarize an item. Never fails; unknown shapes degrade to the type name or `item`.
pub fn summarize_item_with_width(item: &Value, max_len: usize) -> String {
    let item_type = item.text("type").unwrap_or("");

    match ItemKind::parse(item_type) {
        ItemKind::ToolCall => summarize_tool_call(item, max_len),
        ItemKind::Reasoning => summarize_reasoning(item),
        ItemKind::Message => summarize_message(item),
        ItemKind::Exec => match item.first_present(&["command", "cmd"]).and_then(|c| command_text(c, 4)) {
            Some(cmd) => format!("exec: {}", truncate(&cmd, TEXT_WIDTH)),
            None => "exec".to_string(),
        },
        ItemKind::FileRead => summarize_file("read", item_type, item),
        ItemKind::FileWrite => summarize_file("write", item_type, item),
        ItemKind::Shell => match shell_command(item) {
            Some(cmd) => format!("$ {}", truncate(&cmd, SHELL_WIDTH)),
            None => item_type.to_string(),
        },
        ItemKind::Other => summarize_fallback(item_type, item),
    }
}

/// Describe a backend-B `tool_use` block as `name: detail` (or just `name`).
pub fn summarize_tool_use(block: &Value) -> String {
    let name = block.text("name").unwrap_or("tool");
    let detail = block
        .get("input")
        .filter(|input| input.is_object())
        .and_then(|input| input.first_present(TOOL_USE_DETAIL_KEYS))
        .map(|value| truncate(&display_value(value), TOOL_USE_DETAIL_WIDTH));

    match detail {
        Some(detail) => format!("{}: {}", name, detail),
        None => name.to_string(),
    }
}

fn summarize_tool_call(item: &Value, max_len: usize) -> String {
    let name = item.first_text(&["name", "tool"]).unwrap_or("tool");
    let args = item
        .first_present(&["arguments", "input", "args"])
        .and_then(decode_arguments);

    let detail = args.and_then(|args| {
        let value = TOOL_DETAIL_KEYS
            .iter()
            .find_map(|key| args.get(*key).filter(|v| !v.is_null()))?;
        let text = match value {
            Value::Array(parts) => join_values(parts, 3),
            other => display_value(other),
        };
        Some(truncate(&text, TOOL_DETAIL_WIDTH))
    });

    match detail {
        Some(detail) if !detail.is_empty() => truncate(&format!("{}({})", name, detail), max_len),
        _ => name.to_string(),
    }
}

/// Arguments arrive either as an object or as a JSON-encoded object string.
fn decode_arguments(args: &Value) -> Option<Value> {
    match args {
        Value::Object(_) => Some(args.clone()),
        Value::String(raw) => serde_json::from_str::<Value>(raw).ok().filter(Value::is_object),
        _ => None,
    }
}

fn summarize_reasoning(item: &Value) -> String {
    if let Some(summary) = reasoning_summary(item) {
        return format!("thinking: {}", truncate(summary, TEXT_WIDTH));
    }

    match item.text("text") {
        Some(text) => {
            let first_line = text.split('\n').next().unwrap_or("");
            let mut sentence = first_line.split('.').next().unwrap_or("").trim().to_string();
            if sentence.starts_with("**") && sentence[2..].contains("**") {
                sentence = sentence.replace("**", "");
            }
            format!("thinking: {}", truncate(&sentence, TEXT_WIDTH))
        }
        None => "reasoning".to_string(),
    }
}

/// `summary` is a plain string on some backends and a list of `{text}` parts on others.
fn reasoning_summary(item: &Value) -> Option<&str> {
    item.text("summary").or_else(|| {
        item.array("summary")?
            .iter()
            .find_map(|part| part.text("text").or_else(|| part.as_str().filter(|s| !s.is_empty())))
    })
}

fn summarize_message(item: &Value) -> String {
    let text = item.text("text").or_else(|| {
        let first = item.array("content")?.first()?;
        match first {
            Value::Object(_) => first.text("text"),
            Value::String(s) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    });

    match text {
        Some(text) => {
            let first_line = text.split('\n').next().unwrap_or("").trim();
            format!("message: {}", truncate(first_line, TEXT_WIDTH))
        }
        None => "message".to_string(),
    }
}

fn summarize_file(verb: &str, item_type: &str, item: &Value) -> String {
    let name = item
        .first_text(&["path", "file"])
        .map(basename)
        .filter(|name| !name.is_empty());

    match name {
        Some(name) => format!("{}: {}", verb, name),
        None => item_type.to_string(),
    }
}

/// The command a shell item runs, unwrapped from `bash -lc "..."` when present.
fn shell_command(item: &Value) -> Option<String> {
    let raw = item.first_present(&["command", "cmd", "input"])?;

    if let Value::Array(parts) = raw {
        let script = parts
            .iter()
            .position(|part| part.as_str() == Some(SHELL_SCRIPT_FLAG))
            .and_then(|idx| parts.get(idx + 1))
            .map(display_value)
            .filter(|s| !s.is_empty());
        if let Some(script) = script {
            return Some(script);
        }
    }

    let cmd = command_text(raw, 3)?;
    Some(unwrap_shell_script(&cmd).unwrap_or(cmd))
}

/// Extract the quoted payload of `... -lc "payload"` (or single-quoted).
fn unwrap_shell_script(cmd: &str) -> Option<String> {
    let start = cmd.find(SHELL_SCRIPT_FLAG)?;
    let rest = cmd[start + SHELL_SCRIPT_FLAG.len()..].trim();
    if !rest.starts_with('"') && !rest.starts_with('\'') {
        return None;
    }
    let script = rest.trim_matches('"').trim_matches('\'');
    Some(script.to_string())
}

fn summarize_fallback(item_type: &str, item: &Value) -> String {
    match find_detail(item, 0) {
        Some(detail) if !item_type.is_empty() => format!("{}: {}", item_type, detail),
        Some(detail) => detail,
        None if !item_type.is_empty() => item_type.to_string(),
        None => "item".to_string(),
    }
}

/// Depth-first search for the first command/path-like field, at most
/// [`FALLBACK_MAX_DEPTH`] objects deep.
fn find_detail(value: &Value, depth: usize) -> Option<String> {
    if depth > FALLBACK_MAX_DEPTH {
        return None;
    }
    let map = value.as_object()?;

    for key in FALLBACK_KEYS {
        match map.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(truncate(s, FALLBACK_WIDTH)),
            Some(Value::Array(parts)) if !parts.is_empty() => {
                return Some(truncate(&join_values(parts, 3), FALLBACK_WIDTH))
            }
            _ => {}
        }
    }

    map.values()
        .filter(|v| v.is_object())
        .find_map(|v| find_detail(v, depth + 1))
}
