//! Slash command handling for the chat REPL.
//!
//! Parses `/exit`, `/quit`, `/help`, `/clear` and `/tools [list|reload]` into
//! a closed [`Command`] set. Returns a [`CommandAction`] so the REPL loop can
//! decide how to proceed.

use anyhow::{Context, Result};
use colored::Colorize;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use thiserror::Error;

use super::header::print_help;
use super::ChatContext;
use crate::constants::COMMAND_PREFIX;
use crate::tools::summary_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Exit,
    Help,
    Clear,
    Tools(ToolsAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ToolsAction {
    List,
    Reload,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Unknown tools subcommand: {0}")]
    UnknownToolsSubcommand(String),
}

/// Action returned by slash command handling.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CommandAction {
    /// Command was handled; continue the REPL loop.
    Continue,
    /// End the session.
    Exit,
}

/// Parses `line` as a command. `None` when it does not start with `/`.
pub(crate) fn parse(line: &str) -> Option<Result<Command, CommandError>> {
    let rest = line.trim_start().strip_prefix(COMMAND_PREFIX)?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next().unwrap_or_default().to_lowercase();

    let command = match name.as_str() {
        "exit" | "quit" => Command::Exit,
        "help" => Command::Help,
        "clear" => Command::Clear,
        "tools" => match tokens.next().map(str::to_lowercase).as_deref() {
            None | Some("list") => Command::Tools(ToolsAction::List),
            Some("reload") => Command::Tools(ToolsAction::Reload),
            Some(other) => {
                return Some(Err(CommandError::UnknownToolsSubcommand(other.to_string())))
            }
        },
        _ => return Some(Err(CommandError::Unknown(format!("{}{}", COMMAND_PREFIX, name)))),
    };
    Some(Ok(command))
}

/// Dispatch and handle a slash command.
///
/// Returns `None` if `line` is not a command at all. Unknown commands and
/// handler failures are reported and still count as handled.
pub(crate) fn handle(line: &str, ctx: &mut ChatContext) -> Option<CommandAction> {
    let command = match parse(line)? {
        Ok(command) => command,
        Err(e) => {
            println!("{} {}", "?".yellow(), e);
            return Some(CommandAction::Continue);
        }
    };

    tracing::debug!(?command, "slash command");
    match dispatch(command, ctx) {
        Ok(action) => Some(action),
        Err(e) => {
            eprintln!("{} Command failed: {:#}", "error:".red().bold(), e);
            Some(CommandAction::Continue)
        }
    }
}

fn dispatch(command: Command, ctx: &mut ChatContext) -> Result<CommandAction> {
    match command {
        Command::Exit => return Ok(CommandAction::Exit),
        Command::Help => print_help(),
        Command::Clear => {
            ctx.engine.clear();
            execute!(std::io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
                .context("Failed to clear the screen")?;
            ctx.header.print(ctx.registry.len());
            println!("{}", "History cleared.".dimmed());
        }
        Command::Tools(ToolsAction::List) => {
            if ctx.registry.is_empty() {
                println!("{}", "No tools available.".dimmed());
            }
            for tool in ctx.registry.list() {
                println!(
                    "  {} {}",
                    tool.name().cyan(),
                    summary_line(tool.description()).dimmed()
                );
            }
        }
        Command::Tools(ToolsAction::Reload) => {
            let report = ctx.registry.reload();
            for warning in &report.warnings {
                println!("{} {}", "warning:".yellow().bold(), warning);
            }
            println!("{}", format!("Reloaded {} tools", report.count).green());
        }
    }
    Ok(CommandAction::Continue)
}
