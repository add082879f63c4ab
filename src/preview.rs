//! Diff previews shown before a file-writing tool asks for consent.
//!
//! [`for_call`] inspects a tool call and, for `write_file`, compares the
//! proposed content with what is on disk.

use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

use crate::message::ToolCallRequest;
use crate::tools::resolve_path;

/// Preview for `call`, or `None` if it does not write a file or its
/// arguments are incomplete.
pub fn for_call(call: &ToolCallRequest, root: &Path) -> Option<String> {
    if call.name != "write_file" {
        return None;
    }
    let path = call.parameters.get("file_path")?.as_str()?;
    let content = call.parameters.get("content")?.as_str()?;
    let full_path = resolve_path(root, path);

    // An unreadable existing file (binary, permissions) gets no preview.
    if full_path.exists() {
        let old = std::fs::read_to_string(&full_path).ok()?;
        Some(unified_diff(&old, content, path))
    } else {
        Some(new_file_preview(content, path))
    }
}

/// Colored unified diff of `old` against `new`, three lines of context.
///
/// Identical contents produce just the header.
pub fn unified_diff(old: &str, new: &str, path: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut out = format!("--- a/{path}\n+++ b/{path}\n");

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        out.push_str(&hunk.header().to_string());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{}", change).red().to_string(),
                ChangeTag::Insert => format!("+{}", change).green().to_string(),
                ChangeTag::Equal => format!(" {}", change),
            };
            out.push_str(&line);
            if change.missing_newline() {
                out.push('\n');
            }
        }
    }

    out
}

/// Every line of `content` as an addition.
pub fn new_file_preview(content: &str, path: &str) -> String {
    let mut out = format!("--- /dev/null\n+++ b/{path}\n");
    for line in content.lines() {
        out.push_str(&format!("+{}", line).green().to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preview_only_for_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let call = ToolCallRequest::new("c1", "read_file", json!({"file_path": "a.txt"}));
        assert!(for_call(&call, dir.path()).is_none());
    }

    #[test]
    fn test_new_file_preview_lists_additions() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let call = ToolCallRequest::new(
            "c1",
            "write_file",
            json!({"file_path": "new.txt", "content": "one\ntwo\n"}),
        );
        let preview = for_call(&call, dir.path()).unwrap();
        assert!(preview.starts_with("--- /dev/null\n+++ b/new.txt\n"));
        assert!(preview.contains("+one\n+two\n"));
    }

    #[test]
    fn test_existing_file_diff() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "keep\nold\n").unwrap();
        let call = ToolCallRequest::new(
            "c1",
            "write_file",
            json!({"file_path": "a.txt", "content": "keep\nnew\n"}),
        );
        let preview = for_call(&call, dir.path()).unwrap();
        assert!(preview.contains("-old"));
        assert!(preview.contains("+new"));
        assert!(preview.contains(" keep"));
    }
}
