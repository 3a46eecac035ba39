//! Short "what is the agent doing right now" phrases for the status line.

use crate::payload::{basename, command_text, truncate, ValueExt};
use serde_json::Value;

/// Maximum length of a command echoed in `running: ...`.
const COMMAND_WIDTH: usize = 40;

/// Number of command tokens kept when the command arrives as a list.
const COMMAND_TOKENS: usize = 3;

/// Map one event payload to a short activity phrase.
///
/// The first matching rule wins. Payloads without a recognizable marker yield `None`.
pub fn extract_activity(payload: &Value) -> Option<String> {
    let etype = payload.first_text(&["type", "event"]).unwrap_or("");

    if let Some(activity) = classify_marker(etype, payload) {
        return Some(activity);
    }

    if let Some(item) = payload.get("item").filter(|v| v.is_object()) {
        if let Some(activity) = classify_item(item) {
            return Some(activity);
        }
    }

    classify_stream(etype, payload)
}

fn classify_marker(etype: &str, payload: &Value) -> Option<String> {
    let activity = match etype {
        "reasoning" | "thinking" | "thought" => "thinking...".to_string(),
        "tool_call" | "function_call" | "tool_use" => calling(payload.first_text(&["name", "tool"])),
        "exec.spawn" => {
            match payload
                .first_present(&["command", "cmd"])
                .and_then(|cmd| command_text(cmd, COMMAND_TOKENS))
            {
                Some(cmd) => format!("running: {}", truncate(&cmd, COMMAND_WIDTH)),
                None => "running command...".to_string(),
            }
        }
        "exec.output" => "command output...".to_string(),
        "file.write" | "file.create" | "write_file" => file_activity("writing", payload),
        "file.read" | "read_file" => file_activity("reading", payload),
        "patch.apply" | "edit" | "apply_patch" => file_activity("editing", payload),
        _ => return None,
    };
    Some(activity)
}

fn classify_item(item: &Value) -> Option<String> {
    match item.text("type").unwrap_or("") {
        "reasoning" => Some("thinking...".to_string()),
        "tool_call" | "function_call" => Some(calling(item.text("name"))),
        "agent_message" | "assistant_message" | "message" => Some("responding...".to_string()),
        _ => None,
    }
}

fn classify_stream(etype: &str, payload: &Value) -> Option<String> {
    let activity = match etype {
        "thread.started" => "started...".to_string(),
        "turn.started" => "processing...".to_string(),
        "turn.completed" => "turn done".to_string(),
        "item.started" => "working...".to_string(),
        "item.completed" => "item done".to_string(),
        "content_block_start" => {
            let block = payload.get("content_block");
            match block {
                Some(block) if block.text("type") == Some("tool_use") => calling(block.text("name")),
                _ => "generating...".to_string(),
            }
        }
        "content_block_delta" => "streaming...".to_string(),
        "message_start" => "responding...".to_string(),
        "message_delta" => {
            let reason = payload.get("delta").and_then(|d| d.text("stop_reason"))?;
            format!("stopped: {}", reason)
        }
        _ => return None,
    };
    Some(activity)
}

fn calling(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("calling {}...", name),
        None => "calling tool...".to_string(),
    }
}

fn file_activity(verb: &str, payload: &Value) -> String {
    match payload.first_text(&["path", "file"]) {
        Some(path) => format!("{} {}...", verb, basename(path)),
        None => format!("{} file...", verb),
    }
}
