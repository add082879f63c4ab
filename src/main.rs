//! Entry point for toolchat, an interactive chat client for tool-calling
//! language models.
//!
//! This binary loads environment variables, sets up file logging, parses CLI
//! arguments via [`cli`], and dispatches to the appropriate subcommand handler.

mod agent;
mod chat;
mod cli;
mod config;
mod consent;
mod constants;
mod files;
mod format;
mod logging;
mod message;
mod output;
mod preview;
mod provider;
mod tools;

use anyhow::Result;
use colored::Colorize;

/// Runs the toolchat CLI.
///
/// Loads `.env` files (silently ignored if absent). A logging failure is
/// reported but does not stop the session.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    if let Err(e) = logging::init() {
        eprintln!("{} {:#}", "warning:".yellow().bold(), e);
    }
    let cli = cli::parse();
    cli::run(cli).await
}
