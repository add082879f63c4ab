//! Struct definitions for toolchat configuration.

use serde::{Deserialize, Serialize};

/// Root configuration, deserialized from `config.toml` and `toolchat.toml`.
///
/// Every field is optional so a project file can override just what it names.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Model identifier, optionally as `provider/model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Default provider name (e.g. "ollama", "anthropic").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    /// System prompt sent as the preamble of every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Per-provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Provider-specific configuration map.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<ProviderEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama: Option<ProviderEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openrouter: Option<ProviderEntry>,
}

/// Connection details for a single LLM provider.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ProviderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom endpoint (proxies, remote Ollama hosts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model used with this provider when none is given elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// File-reference extraction settings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FilesConfig {
    /// Remove path candidates that could not be resolved from the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_unresolved: Option<bool>,
}

/// Tool discovery settings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ToolsConfig {
    /// Extra directories scanned for `*.toml` tool manifests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dirs: Vec<String>,
    /// Tool names that are never offered to the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
}
