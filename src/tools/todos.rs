//! Markdown checklist tools backed by a single file (`~/todos.md` by default).
//!
//! Each line is `- [ ] task` or `- [x] task`; task numbers are 1-based line
//! positions.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::{parse_args, Tool, ToolError};

use crate::constants::TODO_FILENAME;

const OPEN_MARK: &str = "- [ ]";
const DONE_MARK: &str = "- [x]";

/// Shared handle to the todo file.
#[derive(Debug, Clone)]
pub struct TodoList {
    path: Option<PathBuf>,
}

impl TodoList {
    /// `path` overrides the default location under the home directory.
    pub fn new(path: Option<PathBuf>) -> Self {
        let path = path.or_else(|| dirs::home_dir().map(|h| h.join(TODO_FILENAME)));
        Self { path }
    }

    fn path(&self) -> Result<&PathBuf, ToolError> {
        self.path.as_ref().ok_or_else(|| {
            ToolError::new("HomeNotFound", "Could not determine the home directory")
        })
    }

    fn lines(&self) -> Result<Option<Vec<String>>, ToolError> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(content.lines().map(str::to_string).collect()))
    }
}

pub struct AddTodoTool {
    list: TodoList,
}

impl AddTodoTool {
    pub fn new(list: TodoList) -> Self {
        Self { list }
    }
}

#[derive(Deserialize)]
struct AddTodoInput {
    task: String,
}

impl Tool for AddTodoTool {
    fn name(&self) -> &str {
        "add_todo"
    }

    fn description(&self) -> &str {
        "Add a new task to the user's todo list."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task": { "type": "string", "description": "The task to add" }
            },
            "required": ["task"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: AddTodoInput = parse_args(params)?;
        let task = input.task.trim();
        if task.is_empty() {
            return Err(ToolError::invalid_arguments("task must not be empty"));
        }
        let path = self.list.path()?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{} {}", OPEN_MARK, task)?;
        Ok(Value::String(format!("Added task: '{}'", task)))
    }
}

pub struct ListTodosTool {
    list: TodoList,
}

impl ListTodosTool {
    pub fn new(list: TodoList) -> Self {
        Self { list }
    }
}

impl Tool for ListTodosTool {
    fn name(&self) -> &str {
        "list_todos"
    }

    fn description(&self) -> &str {
        "List every task in the user's todo list, numbered from 1."
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn execute(&self, _params: Value) -> Result<Value, ToolError> {
        let lines = match self.list.lines()? {
            Some(lines) if !lines.is_empty() => lines,
            _ => return Ok(Value::String("Your todo list is empty.".to_string())),
        };
        let numbered = lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}. {}", i + 1, line))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Value::String(numbered))
    }
}

pub struct CompleteTodoTool {
    list: TodoList,
}

impl CompleteTodoTool {
    pub fn new(list: TodoList) -> Self {
        Self { list }
    }
}

#[derive(Deserialize)]
struct CompleteTodoInput {
    task_number: usize,
}

impl Tool for CompleteTodoTool {
    fn name(&self) -> &str {
        "complete_todo"
    }

    fn description(&self) -> &str {
        "Mark a task in the todo list as complete. Task numbers start at 1."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_number": {
                    "type": "integer",
                    "description": "1-based number of the task to complete"
                }
            },
            "required": ["task_number"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: CompleteTodoInput = parse_args(params)?;
        let mut lines = match self.list.lines()? {
            Some(lines) if !lines.is_empty() => lines,
            _ => return Ok(Value::String("Your todo list is empty.".to_string())),
        };

        let n = input.task_number;
        if n == 0 || n > lines.len() {
            return Err(ToolError::new(
                "InvalidTaskNumber",
                format!(
                    "Invalid task number. Please choose a number between 1 and {}.",
                    lines.len()
                ),
            ));
        }

        let line = &mut lines[n - 1];
        if line.starts_with(DONE_MARK) {
            return Ok(Value::String(
                "Task is already marked as complete.".to_string(),
            ));
        }
        *line = line.replacen(OPEN_MARK, DONE_MARK, 1);

        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(self.list.path()?, content)?;
        Ok(Value::String(format!("Marked task {} as complete.", n)))
    }
}

pub struct ClearTodosTool {
    list: TodoList,
}

impl ClearTodosTool {
    pub fn new(list: TodoList) -> Self {
        Self { list }
    }
}

impl Tool for ClearTodosTool {
    fn name(&self) -> &str {
        "clear_todos"
    }

    fn description(&self) -> &str {
        "Delete the entire todo list. This cannot be undone."
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn execute(&self, _params: Value) -> Result<Value, ToolError> {
        let path = self.list.path()?;
        if !path.exists() {
            return Ok(Value::String("Todo list is already empty.".to_string()));
        }
        fs::remove_file(path)?;
        Ok(Value::String("Todo list cleared.".to_string()))
    }
}
