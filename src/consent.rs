//! Interactive consent for tool execution.
//!
//! Every tool call is gated behind a [`ConsentPrompt`]. The terminal
//! implementation asks `Execute <tool>? [Y/n]` with yes as the default.

use async_trait::async_trait;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use thiserror::Error;

use crate::message::ToolCallRequest;

#[derive(Debug, Error)]
pub enum ConsentError {
    /// The user pressed Ctrl+C or Ctrl+D at the prompt.
    #[error("consent prompt cancelled")]
    Cancelled,
    #[error("failed to read consent: {0}")]
    Io(String),
}

/// Decides whether a tool call may run.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn confirm(&self, call: &ToolCallRequest) -> Result<bool, ConsentError>;
}

/// Interpretation of one consent answer. `None` means ask again.
pub fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" | "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Asks on the terminal via readline.
pub struct TerminalConsent;

impl TerminalConsent {
    fn ask_blocking(tool_name: &str) -> Result<bool, ConsentError> {
        let mut rl = DefaultEditor::new().map_err(|e| ConsentError::Io(e.to_string()))?;
        let prompt = format!("Execute {}? {} ", tool_name.cyan().bold(), "[Y/n]".dimmed());

        loop {
            match rl.readline(&prompt) {
                Ok(line) => match parse_answer(&line) {
                    Some(answer) => return Ok(answer),
                    None => println!("{}", "Please enter y or n.".yellow()),
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    return Err(ConsentError::Cancelled)
                }
                Err(e) => return Err(ConsentError::Io(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl ConsentPrompt for TerminalConsent {
    async fn confirm(&self, call: &ToolCallRequest) -> Result<bool, ConsentError> {
        let name = call.name.clone();
        tokio::task::spawn_blocking(move || Self::ask_blocking(&name))
            .await
            .map_err(|e| ConsentError::Io(e.to_string()))?
    }
}

/// Answers from a script, in order; an exhausted script reads as Ctrl+C.
#[cfg(test)]
pub struct ScriptedConsent {
    answers: std::sync::Mutex<std::collections::VecDeque<bool>>,
    pub asked: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedConsent {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: std::sync::Mutex::new(answers.iter().copied().collect()),
            asked: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ConsentPrompt for ScriptedConsent {
    async fn confirm(&self, _call: &ToolCallRequest) -> Result<bool, ConsentError> {
        self.asked
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ConsentError::Cancelled)
    }
}
