//! Write-file tool: writes content to a file, creating parent directories as needed.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

use super::{parse_args, resolve_path, Tool, ToolError};

/// Tool that writes string content to a file.
///
/// Existing files are overwritten. The invocation coordinator shows a diff
/// preview of the change before asking for consent.
pub struct WriteFileTool {
    root: PathBuf,
}

impl WriteFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct WriteFileInput {
    file_path: String,
    content: String,
}

impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file, replacing it if it exists.\nParent directories are created as needed."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: WriteFileInput = parse_args(params)?;
        let path = resolve_path(&self.root, &input.file_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &input.content)?;

        Ok(Value::String(format!(
            "Wrote {} bytes to {}",
            input.content.len(),
            input.file_path
        )))
    }
}
