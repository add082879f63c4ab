//! Model resolution: which provider and model a session talks to.
//!
//! Priority: CLI flags > config file > per-provider defaults. A model given
//! as `provider/model` selects the provider too, unless the provider was
//! named explicitly (OpenRouter model ids contain slashes).

use anyhow::Result;

use super::kind::ProviderKind;
use crate::config::Config;
use crate::constants::DEFAULT_PROVIDER;

/// Resolved provider + model pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub provider: ProviderKind,
    pub model: String,
}

/// Splits `provider/model` when the prefix names a known provider.
fn split_shorthand(model: &str) -> Option<(ProviderKind, &str)> {
    let (prefix, rest) = model.split_once('/')?;
    let provider = prefix.parse().ok()?;
    Some((provider, rest))
}

pub fn resolve_model(
    cli_provider: Option<&str>,
    cli_model: Option<&str>,
    config: &Config,
) -> Result<ModelSelection> {
    if let Some(provider) = cli_provider {
        let provider: ProviderKind = provider.parse()?;
        let configured: Option<ProviderKind> = config
            .provider_name()
            .unwrap_or(DEFAULT_PROVIDER)
            .parse()
            .ok();
        // The global `model` belongs to the configured provider, not this one.
        let model = cli_model
            .map(String::from)
            .or_else(|| config.provider_entry(provider.name()).and_then(|e| e.model.clone()))
            .or_else(|| {
                (configured == Some(provider))
                    .then(|| config.model.clone())
                    .flatten()
            })
            .unwrap_or_else(|| provider.default_model().to_string());
        return Ok(ModelSelection { provider, model });
    }

    if let Some(model) = cli_model {
        if let Some((provider, model)) = split_shorthand(model) {
            return Ok(ModelSelection {
                provider,
                model: model.to_string(),
            });
        }
    }

    let provider: ProviderKind = config
        .provider_name()
        .unwrap_or(DEFAULT_PROVIDER)
        .parse()?;

    // A configured `provider/model` string can name the provider on its own.
    if cli_model.is_none() {
        if let Some((provider, model)) = config.model.as_deref().and_then(split_shorthand) {
            return Ok(ModelSelection {
                provider,
                model: model.to_string(),
            });
        }
    }

    let model = cli_model
        .map(String::from)
        .or_else(|| configured_model(config, provider))
        .unwrap_or_else(|| provider.default_model().to_string());
    Ok(ModelSelection { provider, model })
}

/// Provider-specific model first, then the global `model` key.
fn configured_model(config: &Config, provider: ProviderKind) -> Option<String> {
    config
        .provider_entry(provider.name())
        .and_then(|e| e.model.clone())
        .or_else(|| config.model.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_ollama() {
        let selection = resolve_model(None, None, &Config::default()).unwrap();
        assert_eq!(selection.provider, ProviderKind::Ollama);
        assert_eq!(selection.model, "gemma3:12b-fc");
    }

    #[test]
    fn test_shorthand_selects_provider() {
        let selection = resolve_model(None, Some("anthropic/claude-x"), &Config::default()).unwrap();
        assert_eq!(selection.provider, ProviderKind::Anthropic);
        assert_eq!(selection.model, "claude-x");
    }

    #[test]
    fn test_explicit_provider_keeps_slash_in_model() {
        let selection =
            resolve_model(Some("openrouter"), Some("org/model"), &Config::default()).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenRouter);
        assert_eq!(selection.model, "org/model");
    }

    #[test]
    fn test_config_model_used() {
        let config = Config {
            model: Some("llama3.2".into()),
            ..Config::default()
        };
        let selection = resolve_model(None, None, &config).unwrap();
        assert_eq!(selection.provider, ProviderKind::Ollama);
        assert_eq!(selection.model, "llama3.2");
    }

    #[test]
    fn test_explicit_provider_ignores_other_providers_model() {
        let config = Config {
            model: Some("gemma3:12b-fc".into()),
            default_provider: Some("ollama".into()),
            ..Config::default()
        };
        let selection = resolve_model(Some("openai"), None, &config).unwrap();
        assert_eq!(selection.model, "gpt-4.1");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(resolve_model(Some("nope"), None, &Config::default()).is_err());
    }
}
