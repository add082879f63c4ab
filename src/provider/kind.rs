//! Provider kind enumeration and default model mapping.

use anyhow::anyhow;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_MODEL, DEFAULT_OPENAI_MODEL, DEFAULT_OPENROUTER_MODEL,
};

/// Identifies which LLM backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAI,
    OpenRouter,
    /// Local models through Ollama's OpenAI-compatible endpoint.
    Ollama,
}

impl ProviderKind {
    /// Lower-case name used in config files and API key variables.
    pub fn name(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            Self::OpenAI => DEFAULT_OPENAI_MODEL,
            Self::OpenRouter => DEFAULT_OPENROUTER_MODEL,
            Self::Ollama => DEFAULT_MODEL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!(
                "Unknown provider: {other}. Supported: anthropic, openai, openrouter, ollama"
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
