//! Shell command tool.

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::{parse_args, Tool, ToolError};

use crate::constants::{COMMAND_MAX_OUTPUT_SIZE, COMMAND_STRIPPED_ENV_VARS};

/// Tool that executes shell commands in a child process.
///
/// Commands run through `sh -c` in the working directory with provider
/// credentials stripped from the environment. A non-zero exit is still a
/// successful invocation: the model gets the exit code and both streams.
pub struct RunCommandTool {
    root: PathBuf,
}

impl RunCommandTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[derive(Deserialize)]
struct RunCommandInput {
    command: String,
}

/// Truncate `output` to at most `COMMAND_MAX_OUTPUT_SIZE` bytes, appending a
/// notice when truncation occurs.
pub(crate) fn cap_output(output: &str) -> String {
    if output.len() <= COMMAND_MAX_OUTPUT_SIZE {
        return output.to_string();
    }
    let mut end = COMMAND_MAX_OUTPUT_SIZE;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n... output truncated at {} bytes",
        &output[..end],
        COMMAND_MAX_OUTPUT_SIZE
    )
}

impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Run a shell command and return its stdout, stderr, and exit code."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: RunCommandInput = parse_args(params)?;

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&input.command)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for var in COMMAND_STRIPPED_ENV_VARS {
            cmd.env_remove(var);
        }

        let output = cmd.output().map_err(|e| {
            ToolError::new(
                "CommandFailed",
                format!("Failed to execute command: {}", e),
            )
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        Ok(json!({
            "stdout": cap_output(stdout.trim_end()),
            "stderr": cap_output(stderr.trim_end()),
            "returncode": output.status.code().unwrap_or(-1),
        }))
    }
}
