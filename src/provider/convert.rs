//! Conversion from toolchat's history to rig-core messages.

use anyhow::{bail, Result};
use rig::message::{AssistantContent, Message as RigMessage, Text, ToolCall as RigToolCall, ToolFunction};
use rig::OneOrMany;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::constants::{ATTACHMENT_MAX_SIZE, BINARY_DETECTION_BYTES};
use crate::message::{Message, Role};

/// Splits history into the prompt (its last message) and the preceding chat.
///
/// Tool calls that no tool-role message answers are dropped: providers
/// require a result for every call, and a batch stops at its first denial.
pub(super) fn split_history(history: &[Message]) -> Result<(RigMessage, Vec<RigMessage>)> {
    let answered: HashSet<&str> = history
        .iter()
        .filter(|m| m.role == Role::Tool)
        .flat_map(|m| m.tool_calls())
        .map(|call| call.id.as_str())
        .collect();
    let mut converted: Vec<RigMessage> = history.iter().map(|m| to_rig(m, &answered)).collect();
    let Some(prompt) = converted.pop() else {
        bail!("Cannot submit an empty conversation");
    };
    Ok((prompt, converted))
}

/// Converts one message:
/// - **User** → user text with attachments inlined
/// - **Assistant** → text, plus a `ToolCall` item for each call in `answered`
/// - **Tool** → tool result keyed by the originating call id
pub(super) fn to_rig(msg: &Message, answered: &HashSet<&str>) -> RigMessage {
    match msg.role {
        Role::User => RigMessage::user(inline_attachments(&msg.text(), &msg.attachments)),
        Role::Assistant => {
            let calls: Vec<_> = msg
                .tool_calls()
                .filter(|call| answered.contains(call.id.as_str()))
                .collect();
            if calls.is_empty() {
                return RigMessage::assistant(msg.text());
            }
            let mut items = Vec::with_capacity(calls.len() + 1);
            let text = msg.text();
            if !text.is_empty() {
                items.push(AssistantContent::Text(Text { text }));
            }
            for call in calls {
                items.push(AssistantContent::ToolCall(RigToolCall::new(
                    call.id.clone(),
                    ToolFunction::new(call.name.clone(), call.parameters.clone()),
                )));
            }
            RigMessage::Assistant {
                id: None,
                content: OneOrMany::many(items)
                    .unwrap_or_else(|_| OneOrMany::one(AssistantContent::text(""))),
            }
        }
        Role::Tool => {
            let id = msg.tool_calls().next().map(|c| c.id.clone()).unwrap_or_default();
            RigMessage::tool_result(id, msg.text())
        }
    }
}

/// Appends each attachment's contents to `text` as a `<file>` block.
pub fn inline_attachments(text: &str, attachments: &[PathBuf]) -> String {
    let mut out = text.to_string();
    for path in attachments {
        out.push_str("\n\n");
        match read_attachment(path) {
            Ok(content) => out.push_str(&format!(
                "<file path=\"{}\">\n{}\n</file>",
                path.display(),
                content.trim_end()
            )),
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "attachment not inlined");
                out.push_str(&format!(
                    "<file path=\"{}\">[{}]</file>",
                    path.display(),
                    reason
                ));
            }
        }
    }
    out
}

fn read_attachment(path: &Path) -> Result<String, String> {
    let size = std::fs::metadata(path).map_err(|e| e.to_string())?.len();
    if size > ATTACHMENT_MAX_SIZE {
        return Err(format!("file too large to attach: {} bytes", size));
    }
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    if bytes[..bytes.len().min(BINARY_DETECTION_BYTES)].contains(&0) {
        return Err("binary file not attached".to_string());
    }
    String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string())
}
