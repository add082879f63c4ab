//! Small filesystem tools: listing, sizing, creating, deleting, and moving.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

use super::{parse_args, resolve_path, Tool, ToolError};

fn default_directory() -> String {
    ".".to_string()
}

pub struct ListFilesTool {
    root: PathBuf,
}

impl ListFilesTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct ListFilesInput {
    #[serde(default = "default_directory")]
    directory: String,
}

impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List the files and subdirectories of a directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to list (defaults to the working directory)"
                }
            }
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: ListFilesInput = parse_args(params)?;
        let dir = resolve_path(&self.root, &input.directory);

        if !dir.is_dir() {
            return Err(ToolError::new(
                "NotADirectory",
                format!("'{}' is not a directory.", input.directory),
            ));
        }

        let mut directories = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                directories.push(name);
            } else {
                files.push(name);
            }
        }
        directories.sort();
        files.sort();

        Ok(json!({ "directories": directories, "files": files }))
    }
}

pub struct FileSizeTool {
    root: PathBuf,
}

impl FileSizeTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct FileInput {
    file_path: String,
}

impl Tool for FileSizeTool {
    fn name(&self) -> &str {
        "get_file_size"
    }

    fn description(&self) -> &str {
        "Get the size of a file in bytes."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "Path of the file" }
            },
            "required": ["file_path"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: FileInput = parse_args(params)?;
        let path = resolve_path(&self.root, &input.file_path);
        if !path.is_file() {
            return Err(ToolError::file_not_found(&input.file_path));
        }
        Ok(json!(fs::metadata(&path)?.len()))
    }
}

pub struct CreateDirectoryTool {
    root: PathBuf,
}

impl CreateDirectoryTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

/// Shared by the directory tools.
#[derive(Deserialize)]
struct CreateDirectoryInput {
    directory_path: String,
}

impl Tool for CreateDirectoryTool {
    fn name(&self) -> &str {
        "create_directory"
    }

    fn description(&self) -> &str {
        "Create a directory, including any missing parents."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory_path": { "type": "string", "description": "Directory to create" }
            },
            "required": ["directory_path"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: CreateDirectoryInput = parse_args(params)?;
        let path = resolve_path(&self.root, &input.directory_path);
        if path.exists() {
            return Err(ToolError::new(
                "FileExists",
                format!("'{}' already exists.", input.directory_path),
            ));
        }
        fs::create_dir_all(&path)?;
        Ok(Value::String(format!(
            "Created directory {}",
            input.directory_path
        )))
    }
}

pub struct DeleteFileTool {
    root: PathBuf,
}

impl DeleteFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file. Directories are not removed."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "Path of the file to delete" }
            },
            "required": ["file_path"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: FileInput = parse_args(params)?;
        let path = resolve_path(&self.root, &input.file_path);
        if !path.is_file() {
            return Err(ToolError::file_not_found(&input.file_path));
        }
        fs::remove_file(&path)?;
        Ok(Value::String(format!("Deleted {}", input.file_path)))
    }
}

pub struct DeleteDirectoryTool {
    root: PathBuf,
}

impl DeleteDirectoryTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Tool for DeleteDirectoryTool {
    fn name(&self) -> &str {
        "delete_directory"
    }

    fn description(&self) -> &str {
        "Delete a directory and everything in it. This cannot be undone."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory_path": { "type": "string", "description": "Directory to delete" }
            },
            "required": ["directory_path"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: CreateDirectoryInput = parse_args(params)?;
        let path = resolve_path(&self.root, &input.directory_path);
        if !path.is_dir() {
            return Err(ToolError::new(
                "FileNotFound",
                format!("The directory '{}' does not exist.", input.directory_path),
            ));
        }
        fs::remove_dir_all(&path).map_err(|e| {
            ToolError::new(
                "DeletionFailed",
                format!("Error deleting directory '{}': {}", input.directory_path, e),
            )
        })?;
        Ok(Value::String(format!(
            "Successfully deleted directory '{}'.",
            input.directory_path
        )))
    }
}

pub struct MoveFileTool {
    root: PathBuf,
}

impl MoveFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct MoveFileInput {
    source_path: String,
    destination_path: String,
}

impl Tool for MoveFileTool {
    fn name(&self) -> &str {
        "move_file"
    }

    fn description(&self) -> &str {
        "Move or rename a file."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": { "type": "string", "description": "File to move" },
                "destination_path": { "type": "string", "description": "New location" }
            },
            "required": ["source_path", "destination_path"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: MoveFileInput = parse_args(params)?;
        let source = resolve_path(&self.root, &input.source_path);
        let destination = resolve_path(&self.root, &input.destination_path);

        if !source.exists() {
            return Err(ToolError::file_not_found(&input.source_path));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&source, &destination)?;

        Ok(Value::String(format!(
            "Moved {} to {}",
            input.source_path, input.destination_path
        )))
    }
}
