use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::{parse_args, resolve_path, Tool, ToolError};

use crate::constants::{BINARY_DETECTION_BYTES, READ_FILE_MAX_SIZE};

pub struct ReadFileTool {
    /// Relative paths are resolved against this directory.
    root: PathBuf,
}

impl ReadFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct ReadFileInput {
    file_path: String,
}

impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a text file.\nRelative paths are resolved against the working directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to read"
                }
            },
            "required": ["file_path"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: ReadFileInput = parse_args(params)?;
        let path = resolve_path(&self.root, &input.file_path);

        if !path.is_file() {
            return Err(ToolError::file_not_found(&input.file_path));
        }

        let metadata = std::fs::metadata(&path)?;
        if metadata.len() > READ_FILE_MAX_SIZE {
            return Err(ToolError::new(
                "FileTooLarge",
                format!(
                    "File too large: {} bytes (max {})",
                    metadata.len(),
                    READ_FILE_MAX_SIZE
                ),
            ));
        }

        let content = std::fs::read(&path)?;
        let check_len = content.len().min(BINARY_DETECTION_BYTES);
        if content[..check_len].contains(&0) {
            return Err(ToolError::new(
                "BinaryFile",
                "Binary file detected. Cannot display binary content.",
            ));
        }

        let text = String::from_utf8(content)
            .map_err(|_| ToolError::new("UnicodeDecodeError", "File is not valid UTF-8"))?;
        Ok(Value::String(text))
    }
}
