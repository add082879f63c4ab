//! File loading and merging for toolchat configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{Config, FilesConfig, ProviderConfig, ProviderEntry, ToolsConfig};
use crate::constants::{DEFAULT_MODEL, OLLAMA_DEFAULT_BASE_URL, PROJECT_CONFIG_FILENAME};

fn default_config_toml() -> String {
    format!(
        r#"model = "{DEFAULT_MODEL}"
default_provider = "ollama"

[provider.ollama]
base_url = "{OLLAMA_DEFAULT_BASE_URL}"

[provider.anthropic]
api_key = "{{env:ANTHROPIC_API_KEY}}"

[provider.openai]
api_key = "{{env:OPENAI_API_KEY}}"

[provider.openrouter]
api_key = "{{env:OPENROUTER_API_KEY}}"

[files]
strip_unresolved = false

[tools]
dirs = []
disabled = []
"#
    )
}

impl Config {
    /// Loads the global config from `path`.
    ///
    /// If the file does not exist, writes one with defaults (including
    /// `{env:VAR}` placeholders for API keys) and returns it.
    pub(super) fn load_global(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_toml = default_config_toml();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            tracing::info!(path = %path.display(), "wrote default config");
            return toml::from_str(&default_toml).context("Failed to parse default config");
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Looks for `toolchat.toml` in `start` and its parents, stopping at the
    /// git root. Returns the config and the directory it was found in.
    pub(super) fn load_project(start: &Path) -> Result<Option<(Config, PathBuf)>> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(PROJECT_CONFIG_FILENAME);
            if candidate.is_file() {
                let contents = fs::read_to_string(&candidate)
                    .with_context(|| format!("Failed to read {:?}", candidate))?;
                let config: Config = toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse {:?}", candidate))?;
                return Ok(Some((config, dir)));
            }
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Overlays `project` on `global`. Project values win field by field,
    /// including inside provider entries; tool directories accumulate.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: project.model.or(global.model),
            default_provider: project.default_provider.or(global.default_provider),
            system_prompt: project.system_prompt.or(global.system_prompt),
            provider: ProviderConfig {
                openai: merge_entry(global.provider.openai, project.provider.openai),
                anthropic: merge_entry(global.provider.anthropic, project.provider.anthropic),
                ollama: merge_entry(global.provider.ollama, project.provider.ollama),
                openrouter: merge_entry(global.provider.openrouter, project.provider.openrouter),
            },
            files: FilesConfig {
                strip_unresolved: project
                    .files
                    .strip_unresolved
                    .or(global.files.strip_unresolved),
            },
            tools: ToolsConfig {
                dirs: global.tools.dirs.into_iter().chain(project.tools.dirs).collect(),
                disabled: global
                    .tools
                    .disabled
                    .into_iter()
                    .chain(project.tools.disabled)
                    .collect(),
            },
        }
    }
}

fn merge_entry(global: Option<ProviderEntry>, project: Option<ProviderEntry>) -> Option<ProviderEntry> {
    match (global, project) {
        (Some(g), Some(p)) => Some(ProviderEntry {
            api_key: p.api_key.or(g.api_key),
            base_url: p.base_url.or(g.base_url),
            model: p.model.or(g.model),
        }),
        (g, p) => p.or(g),
    }
}
