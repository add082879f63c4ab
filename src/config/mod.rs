//! Configuration types and path resolution for toolchat.
//!
//! Settings live as TOML at the platform's XDG config path
//! (`~/.config/toolchat/config.toml` on Linux), optionally overlaid by a
//! `toolchat.toml` found in the working directory or one of its parents.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::Config;
#[allow(unused_imports)]
pub use types::{FilesConfig, ProviderConfig, ProviderEntry, ToolsConfig};

use anyhow::Result;
use std::path::Path;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates the global config file if none exists.
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load_from(&Self::config_path()?, &cwd)
    }

    /// Load from an explicit global file, searching for a project file from `start`.
    pub fn load_from(global_path: &Path, start: &Path) -> Result<Self> {
        let mut config = Self::load_global(global_path)?;
        if let Some(parent) = global_path.parent() {
            config.anchor_tool_dirs(parent);
        }

        if let Some((mut project, dir)) = Self::load_project(start)? {
            tracing::debug!(dir = %dir.display(), "found project config");
            project.anchor_tool_dirs(&dir);
            config = Self::merge(config, project);
        }

        config.resolve_substitutions();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_global_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("cfg/config.toml");
        let work = dir.path().join("work");
        fs::create_dir_all(work.join(".git")).unwrap();

        let config = Config::load_from(&global, &work).unwrap();
        assert!(global.is_file());
        assert_eq!(config.model.as_deref(), Some("gemma3:12b-fc"));
        assert_eq!(config.provider_name(), Some("ollama"));
        assert_eq!(config.base_url("ollama"), Some("http://localhost:11434"));
        assert!(!config.strip_unresolved());
    }

    #[test]
    fn test_project_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        fs::write(
            &global,
            r#"
model = "llama3"
system_prompt = "global prompt"

[provider.ollama]
base_url = "http://gpu-box:11434"
model = "qwen"

[tools]
dirs = ["shared-tools"]
"#,
        )
        .unwrap();

        let project = dir.path().join("repo");
        let nested = project.join("src/deep");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(project.join(".git")).unwrap();
        fs::write(
            project.join("toolchat.toml"),
            r#"
system_prompt = "project prompt"

[provider.ollama]
model = "mistral"

[files]
strip_unresolved = true

[tools]
dirs = ["tools"]
disabled = ["run_command"]
"#,
        )
        .unwrap();

        let config = Config::load_from(&global, &nested).unwrap();
        assert_eq!(config.model.as_deref(), Some("llama3"));
        assert_eq!(config.system_prompt.as_deref(), Some("project prompt"));
        let ollama = config.provider_entry("ollama").unwrap();
        assert_eq!(ollama.base_url.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(ollama.model.as_deref(), Some("mistral"));
        assert!(config.strip_unresolved());
        assert_eq!(
            config.tool_dirs(),
            vec![dir.path().join("shared-tools"), project.join("tools")]
        );
        assert_eq!(config.tools.disabled, vec!["run_command".to_string()]);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("TOOLCHAT_TEST_SUBST_KEY", "secret");
        assert_eq!(
            resolve::resolve_str("key-{env:TOOLCHAT_TEST_SUBST_KEY}-end"),
            "key-secret-end"
        );
        assert_eq!(resolve::resolve_str("{env:TOOLCHAT_TEST_UNSET_VAR}"), "");
        assert_eq!(resolve::resolve_str("no braces {env:OPEN"), "no braces {env:OPEN");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = toml::from_str::<Config>("modle = \"typo\"").unwrap_err();
        assert!(err.to_string().contains("modle"));
    }
}
