pub mod calculate;
pub mod expenses;
pub mod filesystem;
pub mod invoke;
pub mod manifest;
pub mod read_file;
pub mod run_command;
pub mod search_files;
pub mod system;
pub mod todos;
pub mod web;
pub mod write_file;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use calculate::CalculateTool;
use expenses::{ExpenseLedger, ListExpensesTool, RecordExpenseTool};
use filesystem::{
    CreateDirectoryTool, DeleteDirectoryTool, DeleteFileTool, FileSizeTool, ListFilesTool,
    MoveFileTool,
};
use read_file::ReadFileTool;
use run_command::RunCommandTool;
use search_files::SearchFilesTool;
use system::{CurrentDirectoryTool, EnvVarTool, SystemInfoTool, TimeTool};
use todos::{AddTodoTool, ClearTodosTool, CompleteTodoTool, ListTodosTool, TodoList};
use web::{ScrapeUrlTool, WeatherTool, WebSearchTool};
use write_file::WriteFileTool;

/// Structured failure raised by a tool, fed back to the model as
/// `{"error": {"name": ..., "description": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{name}: {description}")]
pub struct ToolError {
    /// Error kind, e.g. `FileNotFound` or `CalculationError`.
    pub name: String,
    pub description: String,
}

impl ToolError {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn invalid_arguments(err: impl std::fmt::Display) -> Self {
        Self::new("InvalidArguments", err.to_string())
    }

    pub fn file_not_found(path: &str) -> Self {
        Self::new("FileNotFound", format!("The file '{}' does not exist.", path))
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("{:?}", err.kind()), err.to_string())
    }
}

/// Definition sent to the LLM so it knows what tools are available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema
}

/// Every tool implements this trait.
///
/// `execute` is synchronous: the invocation coordinator always runs it on
/// the blocking pool, so tools are free to do disk or process I/O directly.
pub trait Tool: Send + Sync {
    /// Unique name the LLM uses to call this tool.
    fn name(&self) -> &str;

    /// Human-readable description. The first line doubles as the summary in `/tools list`.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's input parameters.
    fn schema(&self) -> Value;

    /// Execute the tool with the given JSON parameters.
    fn execute(&self, params: Value) -> Result<Value, ToolError>;
}

/// Deserializes tool parameters, treating a missing object as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(params: Value) -> Result<T, ToolError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params).map_err(ToolError::invalid_arguments)
}

/// Resolves a tool path argument against `root` when it is relative.
pub(crate) fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

/// Where the registry discovers capabilities.
#[derive(Debug, Clone, Default)]
pub struct ToolSources {
    /// Working directory for file and command tools.
    pub root: PathBuf,
    /// Directories scanned for `*.toml` tool manifests.
    pub dirs: Vec<PathBuf>,
    /// Tool names left out of the registry.
    pub disabled: Vec<String>,
    /// Todo list file; `~/todos.md` when unset.
    pub todo_file: Option<PathBuf>,
    /// Expense ledger; `~/data/expenses.json` when unset.
    pub expenses_file: Option<PathBuf>,
}

/// Outcome of a registry (re)load.
#[derive(Debug, Default)]
pub struct ReloadReport {
    pub count: usize,
    /// Manifests that could not be loaded.
    pub warnings: Vec<String>,
}

/// Holds all registered tools and dispatches lookups by name.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    sources: ToolSources,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            sources: ToolSources::default(),
        }
    }

    /// Builds a registry from `sources` and performs the first discovery pass.
    pub fn discover(sources: ToolSources) -> (Self, ReloadReport) {
        let mut registry = Self::new();
        registry.sources = sources;
        let report = registry.reload();
        (registry, report)
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let tool: Arc<dyn Tool> = Arc::from(tool);
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => self.tools[i] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Re-discovers every capability: built-ins first, then manifests in
    /// directory order, then drops disabled names.
    pub fn reload(&mut self) -> ReloadReport {
        self.tools.clear();
        let mut warnings = Vec::new();

        self.register_builtins();
        for dir in self.sources.dirs.clone() {
            match manifest::load_dir(&dir, &self.sources.root) {
                Ok(loaded) => {
                    for entry in loaded {
                        match entry {
                            Ok(tool) => self.register(Box::new(tool)),
                            Err(e) => warnings.push(format!("{:#}", e)),
                        }
                    }
                }
                Err(e) => warnings.push(format!("{:#}", e)),
            }
        }

        let disabled = &self.sources.disabled;
        self.tools.retain(|t| !disabled.iter().any(|d| d == t.name()));

        for warning in &warnings {
            tracing::warn!(%warning, "skipped tool manifest");
        }
        tracing::info!(count = self.tools.len(), "tool registry loaded");

        ReloadReport {
            count: self.tools.len(),
            warnings,
        }
    }

    fn register_builtins(&mut self) {
        let root = self.sources.root.clone();
        let todos = TodoList::new(self.sources.todo_file.clone());
        let ledger = ExpenseLedger::new(self.sources.expenses_file.clone());

        self.register(Box::new(ReadFileTool::new(root.clone())));
        self.register(Box::new(WriteFileTool::new(root.clone())));
        self.register(Box::new(ListFilesTool::new(root.clone())));
        self.register(Box::new(SearchFilesTool::new(root.clone())));
        self.register(Box::new(FileSizeTool::new(root.clone())));
        self.register(Box::new(CreateDirectoryTool::new(root.clone())));
        self.register(Box::new(DeleteFileTool::new(root.clone())));
        self.register(Box::new(DeleteDirectoryTool::new(root.clone())));
        self.register(Box::new(MoveFileTool::new(root.clone())));
        self.register(Box::new(RunCommandTool::new(root.clone())));
        self.register(Box::new(CurrentDirectoryTool::new(root)));
        self.register(Box::new(EnvVarTool));
        self.register(Box::new(TimeTool));
        self.register(Box::new(SystemInfoTool));
        self.register(Box::new(CalculateTool));
        self.register(Box::new(AddTodoTool::new(todos.clone())));
        self.register(Box::new(ListTodosTool::new(todos.clone())));
        self.register(Box::new(CompleteTodoTool::new(todos.clone())));
        self.register(Box::new(ClearTodosTool::new(todos)));
        self.register(Box::new(RecordExpenseTool::new(ledger.clone())));
        self.register(Box::new(ListExpensesTool::new(ledger)));
        self.register(Box::new(WebSearchTool));
        self.register(Box::new(ScrapeUrlTool));
        self.register(Box::new(WeatherTool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Produce definitions for the LLM (sent in the API request).
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.schema(),
            })
            .collect()
    }

    /// How many tools are registered.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// First line of a tool description, for compact listings.
pub fn summary_line(description: &str) -> &str {
    description
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("No description available")
}

#[cfg(test)]
mod tests;
