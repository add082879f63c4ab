//! Tools that report on the host: working directory, environment, clock, platform.

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::{parse_args, Tool, ToolError};

fn no_parameters() -> Value {
    json!({ "type": "object", "properties": {} })
}

pub struct CurrentDirectoryTool {
    root: PathBuf,
}

impl CurrentDirectoryTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Tool for CurrentDirectoryTool {
    fn name(&self) -> &str {
        "get_current_directory"
    }

    fn description(&self) -> &str {
        "Get the current working directory."
    }

    fn schema(&self) -> Value {
        no_parameters()
    }

    fn execute(&self, _params: Value) -> Result<Value, ToolError> {
        let dir = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        Ok(Value::String(dir.display().to_string()))
    }
}

pub struct EnvVarTool;

#[derive(Deserialize)]
struct EnvVarInput {
    variable_name: String,
}

impl Tool for EnvVarTool {
    fn name(&self) -> &str {
        "get_environment_variable"
    }

    fn description(&self) -> &str {
        "Get the value of an environment variable, or null when it is unset."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "variable_name": {
                    "type": "string",
                    "description": "Name of the environment variable"
                }
            },
            "required": ["variable_name"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: EnvVarInput = parse_args(params)?;
        Ok(std::env::var(&input.variable_name)
            .map(Value::String)
            .unwrap_or(Value::Null))
    }
}

pub struct TimeTool;

impl Tool for TimeTool {
    fn name(&self) -> &str {
        "get_time"
    }

    fn description(&self) -> &str {
        "Get the current local date and time."
    }

    fn schema(&self) -> Value {
        no_parameters()
    }

    fn execute(&self, _params: Value) -> Result<Value, ToolError> {
        let now = chrono::Local::now();
        Ok(json!({
            "iso": now.to_rfc3339(),
            "date": now.format("%Y-%m-%d").to_string(),
            "time": now.format("%H:%M:%S").to_string(),
            "weekday": now.format("%A").to_string(),
            "timezone": now.format("%:z").to_string(),
            "unix": now.timestamp(),
        }))
    }
}

pub struct SystemInfoTool;

impl Tool for SystemInfoTool {
    fn name(&self) -> &str {
        "get_system_info"
    }

    fn description(&self) -> &str {
        "Get basic information about the host operating system and hardware."
    }

    fn schema(&self) -> Value {
        no_parameters()
    }

    fn execute(&self, _params: Value) -> Result<Value, ToolError> {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok();
        Ok(json!({
            "os": std::env::consts::OS,
            "family": std::env::consts::FAMILY,
            "arch": std::env::consts::ARCH,
            "cpu_count": cpus,
            "user": user,
            "home": dirs::home_dir().map(|p| p.display().to_string()),
        }))
    }
}
