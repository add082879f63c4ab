//! Command-line interface definition and dispatch for toolchat.
//!
//! Uses [`clap`] for argument parsing with derive macros. Running without a
//! subcommand starts a chat session with default flags.

use crate::{chat, config, provider, tools::summary_line};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

/// Top-level CLI structure for toolchat.
#[derive(Parser)]
#[command(
    name = "toolchat",
    version,
    about = "Offline function calling chat for local and hosted models"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the toolchat CLI.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session
    Chat(ChatArgs),
    /// List the tools offered to the model
    Tools {
        /// Directory containing tool manifests (repeatable)
        #[arg(short = 't', long = "tools", value_name = "DIR")]
        dirs: Vec<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Default)]
pub struct ChatArgs {
    /// Provider to use (anthropic, openai, openrouter, ollama)
    #[arg(short, long)]
    provider: Option<String>,
    /// Model to use, optionally as provider/model (overrides config)
    #[arg(short, long)]
    model: Option<String>,
    /// Ollama server to use
    #[arg(short, long, value_name = "URL")]
    ollama: Option<String>,
    /// System prompt sent with every request
    #[arg(short, long)]
    system: Option<String>,
    /// Directory containing tool manifests (repeatable)
    #[arg(short, long, value_name = "DIR")]
    tools: Vec<PathBuf>,
    /// File attached to the first message (repeatable)
    #[arg(short, long, value_name = "PATH")]
    file: Vec<PathBuf>,
}

/// Subcommands for the `config` command.
///
/// Reads toolchat's TOML configuration stored at the XDG config path
/// (`~/.config/toolchat/config.toml`) merged with any project `toolchat.toml`.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective config
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or_else(|| Commands::Chat(ChatArgs::default())) {
        Commands::Chat(args) => {
            let mut config = config::Config::load()?;
            if let Some(url) = args.ollama {
                config
                    .provider
                    .ollama
                    .get_or_insert_with(Default::default)
                    .base_url = Some(url);
            }
            if let Some(system) = args.system {
                config.system_prompt = Some(system);
            }

            let selection =
                provider::resolve_model(args.provider.as_deref(), args.model.as_deref(), &config)?;
            tracing::info!(provider = %selection.provider, model = %selection.model, "starting chat");

            let options = chat::ChatOptions {
                tool_dirs: args.tools,
                files: args.file,
            };
            chat::run_chat(config, &selection, options).await
        }
        Commands::Tools { dirs } => {
            let config = config::Config::load()?;
            let root = std::env::current_dir()?;
            let registry = chat::discover_tools(&config, dirs, &root);
            println!("{} {}", registry.len().to_string().bold(), "tools enabled".bold());
            for tool in registry.list() {
                println!(
                    "  {:<26} {}",
                    tool.name().cyan(),
                    summary_line(tool.description()).dimmed()
                );
            }
            Ok(())
        }
        Commands::Config { action } => {
            let config = config::Config::load()?;
            match action {
                ConfigAction::Show => {
                    let path = config::Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    let toml_str = toml::to_string_pretty(&config)?;
                    println!("{}", toml_str);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_chat() {
        let cli = Cli::try_parse_from(["toolchat"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_chat_flags_repeat() {
        let cli = Cli::try_parse_from([
            "toolchat", "chat", "-m", "ollama/qwen3", "-t", "a", "--tools", "b", "-f", "x.md",
        ])
        .unwrap();
        let Some(Commands::Chat(args)) = cli.command else {
            panic!("expected chat");
        };
        assert_eq!(args.model.as_deref(), Some("ollama/qwen3"));
        assert_eq!(args.tools, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(args.file, vec![PathBuf::from("x.md")]);
    }
}
