//! Environment variable substitution and derived settings.

use std::path::{Path, PathBuf};

use super::types::{Config, ProviderEntry};

impl Config {
    /// Resolve `{env:VAR}` patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        for field in [
            &mut self.model,
            &mut self.default_provider,
            &mut self.system_prompt,
        ] {
            if let Some(value) = field {
                *value = resolve_str(value);
            }
        }
        for entry in [
            &mut self.provider.openai,
            &mut self.provider.anthropic,
            &mut self.provider.ollama,
            &mut self.provider.openrouter,
        ]
        .into_iter()
        .flatten()
        {
            for value in [&mut entry.api_key, &mut entry.base_url, &mut entry.model]
                .into_iter()
                .flatten()
            {
                *value = resolve_str(value);
            }
        }
        for dir in &mut self.tools.dirs {
            *dir = resolve_str(dir);
        }
    }

    /// Settings for a provider by name, if configured.
    pub fn provider_entry(&self, provider: &str) -> Option<&ProviderEntry> {
        match provider {
            "openai" => self.provider.openai.as_ref(),
            "anthropic" => self.provider.anthropic.as_ref(),
            "ollama" => self.provider.ollama.as_ref(),
            "openrouter" => self.provider.openrouter.as_ref(),
            _ => None,
        }
    }

    /// Resolve the API key for a provider: env var first, then config value.
    /// Empty values (e.g. an unset `{env:VAR}` placeholder) count as missing.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        let env_key = format!("{}_API_KEY", provider.to_uppercase());
        if let Ok(val) = std::env::var(&env_key) {
            if !val.is_empty() {
                return Some(val);
            }
        }
        self.provider_entry(provider)
            .and_then(|e| e.api_key.clone())
            .filter(|k| !k.is_empty())
    }

    /// Configured base URL for a provider, if any.
    pub fn base_url(&self, provider: &str) -> Option<&str> {
        self.provider_entry(provider)
            .and_then(|e| e.base_url.as_deref())
            .filter(|u| !u.is_empty())
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    pub fn strip_unresolved(&self) -> bool {
        self.files.strip_unresolved.unwrap_or(false)
    }

    /// Configured manifest directories with `~` expanded.
    pub fn tool_dirs(&self) -> Vec<PathBuf> {
        self.tools.dirs.iter().map(|d| expand_home(d)).collect()
    }

    /// Makes relative tool directories absolute against `base`.
    pub(super) fn anchor_tool_dirs(&mut self, base: &Path) {
        for dir in &mut self.tools.dirs {
            let expanded = expand_home(dir);
            if expanded.is_relative() {
                *dir = base.join(expanded).display().to_string();
            }
        }
    }
}

/// Replace `{env:VAR}` with the environment variable value (empty if unset).
pub(super) fn resolve_str(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{env:") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 5..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}
