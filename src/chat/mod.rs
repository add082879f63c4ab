//! Interactive chat REPL for toolchat.
//!
//! Provides a multi-turn conversation loop using [`rustyline`] for readline
//! support (history, line editing). Each submitted input is either a slash
//! command or a prompt; prompts have their file references extracted and are
//! run as one turn of the [`TurnEngine`].

mod commands;
mod header;

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agent::{TurnEngine, TurnError};
use crate::config::Config;
use crate::consent::TerminalConsent;
use crate::constants::HISTORY_FILENAME;
use crate::files::FileExtractor;
use crate::output::{Renderer, StdoutRenderer};
use crate::provider::{ModelSelection, Provider};
use crate::tools::invoke::Coordinator;
use crate::tools::{ToolRegistry, ToolSources};

use commands::CommandAction;
use header::SessionHeader;

/// Session-wide options given on the command line.
#[derive(Debug, Default)]
pub struct ChatOptions {
    /// Extra manifest directories, scanned after the configured ones.
    pub tool_dirs: Vec<PathBuf>,
    /// Files attached to the first turn.
    pub files: Vec<PathBuf>,
}

/// State a slash command may act on.
pub(crate) struct ChatContext {
    pub(crate) engine: TurnEngine,
    pub(crate) registry: ToolRegistry,
    pub(crate) header: SessionHeader,
}

/// One unit of user input.
enum Input {
    Line(String),
    Interrupted,
    Eof,
}

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C**: cancels current input, or the running turn, and stays in the REPL
/// - **Ctrl+D** on an empty prompt: exits with a farewell
/// - A trailing `\` continues the input on the next line
/// - Readline history is persisted to `~/.cache/toolchat/chat_history.txt`
///
/// # Errors
///
/// Returns an error if the provider cannot be built or a turn fails for any
/// reason other than cancellation.
pub async fn run_chat(config: Config, selection: &ModelSelection, options: ChatOptions) -> Result<()> {
    let provider = Arc::new(Provider::from_config(&config, selection)?);
    let root = std::env::current_dir().context("Failed to read the working directory")?;

    let registry = discover_tools(&config, options.tool_dirs, &root);

    let header = SessionHeader::query(
        provider.as_ref(),
        provider.model(),
        config.system_prompt.is_some(),
    )
    .await;
    header.print(registry.len());
    println!(
        "{}",
        "Begin a conversation, or type '/help' for more information.".dimmed()
    );
    println!();

    let mut ctx = ChatContext {
        engine: TurnEngine::new(provider),
        registry,
        header,
    };
    let extractor = FileExtractor::new(root.clone(), config.strip_unresolved());
    let consent = TerminalConsent;
    let mut initial_files = initial_attachments(&options.files, &root);

    // Set up readline with persistent history
    let mut rl = DefaultEditor::new()?;
    let history_path = Config::cache_dir()?.join(HISTORY_FILENAME);
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    let outcome: Result<()> = loop {
        let line = match read_input(&mut rl) {
            Ok(Input::Line(line)) => line,
            Ok(Input::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Ok(Input::Eof) => break Ok(()),
            Err(e) => break Err(e),
        };
        let line = line.trim();
        if line.is_empty() && initial_files.is_empty() {
            continue;
        }
        if !line.is_empty() {
            let _ = rl.add_history_entry(line);
        }

        match commands::handle(line, &mut ctx) {
            Some(CommandAction::Exit) => break Ok(()),
            Some(CommandAction::Continue) => continue,
            None => {}
        }

        let mut renderer = StdoutRenderer::new();
        let extraction = extractor.extract(line);
        for warning in &extraction.warnings {
            tracing::debug!(%warning, "file reference warning");
            renderer.warning(&warning.to_string());
        }

        let mut attachments = std::mem::take(&mut initial_files);
        for path in extraction.attachable() {
            if !attachments.contains(&path) {
                attachments.push(path);
            }
        }
        if extraction.text.is_empty() && attachments.is_empty() {
            continue;
        }
        if !attachments.is_empty() {
            let names: Vec<String> = attachments.iter().map(|p| p.display().to_string()).collect();
            renderer.info(&format!("Attached: {}", names.join(", ")));
        }
        println!();

        let coordinator = Coordinator::new(&ctx.registry, &consent, root.clone());
        let result = tokio::select! {
            result = ctx.engine.run_turn(&extraction.text, attachments, &coordinator, &mut renderer) => result,
            _ = tokio::signal::ctrl_c() => Err(TurnError::Cancelled),
        };
        renderer.clear_spinner();

        match result {
            Ok(_) => println!(),
            Err(TurnError::Cancelled) => {
                tracing::info!("turn cancelled");
                println!();
                renderer.warning("Turn cancelled.");
            }
            Err(e) => {
                renderer.error(&format!("Unexpected error: {:#}", e));
                break Err(anyhow::Error::new(e).context("Turn failed"));
            }
        }
    };

    // Save readline history
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    if outcome.is_ok() {
        println!("{}", "Goodbye!".cyan().bold());
    }
    outcome
}

/// Builds the tool registry: built-ins, then manifests from the default
/// tools directory, configured directories and `extra_dirs`, in that order.
pub(crate) fn discover_tools(config: &Config, extra_dirs: Vec<PathBuf>, root: &Path) -> ToolRegistry {
    let mut dirs = Vec::new();
    if let Ok(default_dir) = Config::default_tools_dir() {
        dirs.push(default_dir);
    }
    dirs.extend(config.tool_dirs());
    dirs.extend(extra_dirs);

    let (registry, report) = ToolRegistry::discover(ToolSources {
        root: root.to_path_buf(),
        dirs,
        disabled: config.tools.disabled.clone(),
        todo_file: None,
        expenses_file: None,
    });
    for warning in &report.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
    registry
}

/// Reads one logical input, joining lines that end with `\`.
fn read_input(rl: &mut DefaultEditor) -> Result<Input> {
    let mut buffer = String::new();
    let mut prompt = format!("{} ", ">".green().bold());

    loop {
        match rl.readline(&prompt) {
            Ok(line) => match continued(&line) {
                Some(head) => {
                    buffer.push_str(head);
                    buffer.push('\n');
                    prompt = format!("{} ", ".".dimmed());
                }
                None => {
                    buffer.push_str(&line);
                    return Ok(Input::Line(buffer));
                }
            },
            Err(ReadlineError::Interrupted) => return Ok(Input::Interrupted),
            Err(ReadlineError::Eof) if buffer.is_empty() => return Ok(Input::Eof),
            Err(ReadlineError::Eof) => return Ok(Input::Line(buffer)),
            Err(e) => return Err(e).context("Failed to read input"),
        }
    }
}

/// The line without its trailing `\`, if it asks for continuation.
fn continued(line: &str) -> Option<&str> {
    line.trim_end().strip_suffix('\\')
}

/// Resolves `--file` arguments against `root`, keeping regular files only.
fn initial_attachments(files: &[PathBuf], root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for file in files {
        let path = if file.is_absolute() {
            file.clone()
        } else {
            root.join(file)
        };
        match path.canonicalize() {
            Ok(resolved) if resolved.is_file() => {
                if !out.contains(&resolved) {
                    out.push(resolved);
                }
            }
            _ => eprintln!(
                "{} File not found: {}",
                "warning:".yellow().bold(),
                file.display()
            ),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continued_lines() {
        assert_eq!(continued("first part \\"), Some("first part "));
        assert_eq!(continued("trailing space \\  "), Some("trailing space "));
        assert_eq!(continued("done"), None);
    }

    #[test]
    fn test_initial_attachments_skip_missing_and_dupes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("a.txt"), "a").unwrap();
        std::fs::create_dir(root.join("sub")).unwrap();

        let files = vec![
            PathBuf::from("a.txt"),
            root.join("a.txt"),
            PathBuf::from("missing.txt"),
            PathBuf::from("sub"),
        ];
        assert_eq!(initial_attachments(&files, &root), vec![root.join("a.txt")]);
    }
}
