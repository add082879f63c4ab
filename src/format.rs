//! Text formatting helpers for terminal output.

use colored::Colorize;
use serde_json::Value;

use crate::constants::ARG_DISPLAY_LIMIT;

/// Minimal markdown renderer for terminal output.
///
/// Not a full parser. Handles the patterns that show up most in model
/// output: `#` headings, bullet lists, **bold**, `inline code`, and fenced
/// code blocks.
pub fn render_markdown_lite(text: &str) -> String {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for line in text.lines() {
        if let Some(fence) = line.trim_start().strip_prefix("```") {
            in_code_block = !in_code_block;
            let lang = fence.trim();
            if in_code_block && !lang.is_empty() {
                lines.push(format!("  {}", lang.dimmed()));
            } else if !in_code_block {
                lines.push(String::new());
            }
            continue;
        }

        if in_code_block {
            lines.push(format!("  {}", line.dimmed()));
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            let heading = trimmed.trim_start_matches('#').trim();
            lines.push(heading.bold().underline().to_string());
        } else if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            let indent = &line[..line.len() - trimmed.len()];
            lines.push(format!("{}• {}", indent, render_inline(item)));
        } else {
            lines.push(render_inline(line));
        }
    }

    lines.join("\n")
}

/// Handle **bold** and `inline code` within a single line.
fn render_inline(line: &str) -> String {
    let mut result = String::new();
    let mut rest = line;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                result.push_str(&after[..end].bold().to_string());
                rest = &after[end + 2..];
                continue;
            }
        }
        if let Some(after) = rest.strip_prefix('`') {
            if let Some(end) = after.find('`') {
                result.push_str(&after[..end].cyan().to_string());
                rest = &after[end + 1..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            result.push(c);
        }
        rest = chars.as_str();
    }

    result
}

/// Shortens `text` to the argument display limit, ending in `...`.
pub fn truncate_for_display(text: &str) -> String {
    if text.chars().count() <= ARG_DISPLAY_LIMIT {
        return text.to_string();
    }
    let kept: String = text.chars().take(ARG_DISPLAY_LIMIT - 3).collect();
    format!("{}...", kept)
}

/// Renders one tool argument value for the consent prompt.
///
/// Strings are quoted; objects and arrays are shown as compact JSON. Both
/// are truncated when long.
pub fn format_argument(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", truncate_for_display(s)),
        Value::Array(_) | Value::Object(_) => truncate_for_display(&value.to_string()),
        other => other.to_string(),
    }
}

/// `(key, display value)` pairs for a tool call's parameters, in order.
pub fn format_arguments(params: &Value) -> Vec<(String, String)> {
    match params {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), format_argument(v)))
            .collect(),
        Value::Null => Vec::new(),
        other => vec![("input".to_string(), format_argument(other))],
    }
}
