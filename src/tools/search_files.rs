use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::{parse_args, resolve_path, Tool, ToolError};

use crate::constants::SEARCH_MAX_RESULTS;

/// Recursive filename search below a directory.
pub struct SearchFilesTool {
    root: PathBuf,
}

impl SearchFilesTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct SearchFilesInput {
    #[serde(default = "default_directory")]
    directory: String,
    pattern: String,
}

fn default_directory() -> String {
    ".".to_string()
}

impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Search for files whose name matches a glob pattern, recursively."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to search (defaults to the working directory)"
                },
                "pattern": {
                    "type": "string",
                    "description": "Filename pattern (e.g. '*.rs')"
                }
            },
            "required": ["pattern"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: SearchFilesInput = parse_args(params)?;
        let dir = resolve_path(&self.root, &input.directory);
        if !dir.is_dir() {
            return Err(ToolError::new(
                "NotADirectory",
                format!("'{}' is not a directory.", input.directory),
            ));
        }

        let full_pattern = dir.join("**").join(&input.pattern);
        let entries = glob::glob(&full_pattern.to_string_lossy())
            .map_err(|e| ToolError::new("InvalidPattern", e.to_string()))?;

        let mut matches = Vec::new();
        for entry in entries {
            // Unreadable entries are skipped rather than failing the search.
            let Ok(path) = entry else { continue };
            if !path.is_file() {
                continue;
            }
            if matches.len() >= SEARCH_MAX_RESULTS {
                tracing::debug!(limit = SEARCH_MAX_RESULTS, "search_files truncated");
                break;
            }
            let shown = path.strip_prefix(&self.root).unwrap_or(&path);
            matches.push(shown.display().to_string());
        }

        Ok(json!(matches))
    }
}
