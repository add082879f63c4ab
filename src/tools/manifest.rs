//! User-defined tools declared as TOML manifests.
//!
//! Any `*.toml` file in a configured tools directory becomes a tool:
//!
//! ```toml
//! name = "weather"
//! description = "Current weather for a city"
//! command = "curl -s \"wttr.in/$TOOL_CITY?format=3\""
//!
//! [parameters]
//! city = "City name"
//! ```
//!
//! The command runs through `sh -c`. Parameters arrive as a JSON object on
//! stdin and as `TOOL_<NAME>` environment variables. Stdout is returned as
//! JSON when it parses, otherwise as a trimmed string.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::run_command::cap_output;
use super::{Tool, ToolError};

use crate::constants::MANIFEST_ENV_PREFIX;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    name: String,
    description: String,
    command: String,
    /// Parameter name to description. Every parameter is a required string.
    #[serde(default)]
    parameters: BTreeMap<String, String>,
}

/// A tool backed by a shell command.
pub struct ManifestTool {
    manifest: Manifest,
    root: PathBuf,
}

impl ManifestTool {
    /// Parse a manifest file.
    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tool manifest: {}", path.display()))?;
        let manifest: Manifest = toml::from_str(&content)
            .with_context(|| format!("Failed to parse tool manifest: {}", path.display()))?;

        let valid_name = !manifest.name.is_empty()
            && manifest
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            anyhow::bail!(
                "Invalid tool name '{}' in {}",
                manifest.name,
                path.display()
            );
        }

        Ok(Self {
            manifest,
            root: root.to_path_buf(),
        })
    }
}

/// Load every `*.toml` manifest in `dir`, sorted by filename.
///
/// A missing directory yields no tools. Individual manifests that fail to
/// load are returned as errors so the caller can report them and continue.
pub fn load_dir(dir: &Path, root: &Path) -> Result<Vec<Result<ManifestTool>>> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "tools directory not found");
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read tools directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    Ok(paths
        .iter()
        .map(|path| ManifestTool::load(path, root))
        .collect())
}

fn env_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Tool for ManifestTool {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn description(&self) -> &str {
        &self.manifest.description
    }

    fn schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .manifest
            .parameters
            .iter()
            .map(|(name, description)| {
                (
                    name.clone(),
                    json!({ "type": "string", "description": description }),
                )
            })
            .collect();
        let required: Vec<&String> = self.manifest.parameters.keys().collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let args = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::invalid_arguments(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };
        if let Some(missing) = self
            .manifest
            .parameters
            .keys()
            .find(|k| !args.contains_key(k.as_str()))
        {
            return Err(ToolError::invalid_arguments(format!(
                "missing parameter '{}'",
                missing
            )));
        }

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.manifest.command)
            .current_dir(&self.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &args {
            let var = format!("{}{}", MANIFEST_ENV_PREFIX, key.to_uppercase());
            cmd.env(var, env_value(value));
        }

        let mut child = cmd.spawn().map_err(|e| {
            ToolError::new("CommandFailed", format!("Failed to start command: {}", e))
        })?;
        let stdin = child.stdin.take();
        let payload = Value::Object(args).to_string();
        // Stdin is fed while output drains so neither pipe can fill up and stall.
        let output = std::thread::scope(|scope| {
            if let Some(mut stdin) = stdin {
                scope.spawn(move || {
                    // A command that ignores stdin may close it early; that is not an error.
                    let _ = stdin.write_all(payload.as_bytes());
                });
            }
            child.wait_with_output()
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            let detail = if stderr.trim().is_empty() {
                format!("Command exited with code {}", code)
            } else {
                format!("Command exited with code {}: {}", code, cap_output(stderr.trim()))
            };
            return Err(ToolError::new("CommandFailed", detail));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        Ok(serde_json::from_str(stdout)
            .unwrap_or_else(|_| Value::String(cap_output(stdout))))
    }
}
