//! Output rendering abstraction for toolchat.
//!
//! Defines the [`Renderer`] trait that decouples the turn engine and the
//! invocation coordinator from the terminal. [`StdoutRenderer`] prints to the
//! terminal; tests substitute a recorder.

use colored::Colorize;
use crossterm::{cursor, terminal, QueueableCommand};
use std::io::{self, IsTerminal, Write};

use crate::constants::SPINNER_FRAMES;
use crate::format;
use crate::message::ToolCallRequest;
use crate::tools::ToolError;

/// Everything the core needs to show the user.
pub trait Renderer {
    /// Opens an incremental text render.
    fn text_begin(&mut self);

    /// Appends a streamed chunk to the open render.
    fn text_chunk(&mut self, chunk: &str);

    /// Finalizes the open render with the full text of the segment.
    fn text_end(&mut self, full_text: &str);

    /// Advances the indicator shown while the model has not replied yet.
    /// Cleared by the next `text_begin` or `tool_request`.
    fn waiting(&mut self, tick: usize);

    /// Shows a tool call awaiting consent.
    fn tool_request(&mut self, call: &ToolCallRequest);

    /// Shows a change preview (e.g. a diff) for the pending call.
    fn tool_preview(&mut self, preview: &str);

    /// Advances the progress indicator of a running tool.
    fn tool_progress(&mut self, name: &str, tick: usize);

    fn tool_success(&mut self, name: &str);

    fn tool_denied(&mut self, name: &str);

    fn tool_failed(&mut self, name: &str, err: &ToolError);

    /// A denial stopped the batch; `skipped` calls were never presented.
    fn batch_aborted(&mut self, skipped: usize);

    fn tools_summary(&mut self, total: usize, executed: usize, failed: usize);

    fn info(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    fn error(&mut self, msg: &str);
}

/// Renders to stdout with colors.
///
/// Streamed text is printed raw as it arrives; once the segment is complete
/// it is erased and reprinted with markdown-lite formatting.
pub struct StdoutRenderer {
    buffer: String,
    spinner_visible: bool,
    interactive: bool,
}

impl StdoutRenderer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            spinner_visible: false,
            interactive: io::stdout().is_terminal(),
        }
    }

    /// Number of terminal rows the raw streamed text occupies, accounting
    /// for line wrapping at the current terminal width.
    pub fn visual_line_count(&self) -> usize {
        let width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80)
            .max(1);

        self.buffer
            .split('\n')
            .map(|line| line.chars().count().div_ceil(width).max(1))
            .sum()
    }

    /// Erases the raw stream so it can be reprinted formatted.
    fn erase_stream(&self) -> io::Result<()> {
        let mut out = io::stdout();
        let up = self.visual_line_count().saturating_sub(1);
        out.queue(cursor::MoveToColumn(0))?;
        if up > 0 {
            out.queue(cursor::MoveUp(up as u16))?;
        }
        out.queue(terminal::Clear(terminal::ClearType::FromCursorDown))?;
        out.flush()
    }

    /// Removes any spinner line left on screen.
    pub fn clear_spinner(&mut self) {
        if self.spinner_visible {
            print!("\r\x1b[2K");
            io::stdout().flush().ok();
            self.spinner_visible = false;
        }
    }

    fn rule() -> String {
        let width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);
        "─".repeat(width).dimmed().to_string()
    }
}

impl Default for StdoutRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for StdoutRenderer {
    fn text_begin(&mut self) {
        self.clear_spinner();
        self.buffer.clear();
    }

    fn text_chunk(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
        print!("{}", chunk);
        io::stdout().flush().ok();
    }

    fn text_end(&mut self, full_text: &str) {
        if self.interactive && self.erase_stream().is_ok() {
            println!("{}", format::render_markdown_lite(full_text));
        } else {
            println!();
        }
        println!();
        self.buffer.clear();
    }

    fn waiting(&mut self, tick: usize) {
        let frame = SPINNER_FRAMES[tick % SPINNER_FRAMES.len()];
        print!("\r{} {}", frame.magenta(), "Thinking...".dimmed());
        io::stdout().flush().ok();
        self.spinner_visible = true;
    }

    fn tool_request(&mut self, call: &ToolCallRequest) {
        self.clear_spinner();
        println!("{}", Self::rule());
        println!("{} {}", "Tool".magenta().bold(), format!("• {}", call.name).cyan());

        let args = format::format_arguments(&call.parameters);
        if args.is_empty() {
            println!("{}", " (no arguments)".dimmed());
        }
        for (key, value) in args {
            println!(" {} {}", format!("• {}:", key).yellow(), value.dimmed());
        }
        println!();
    }

    fn tool_preview(&mut self, preview: &str) {
        println!("{}", preview);
    }

    fn tool_progress(&mut self, name: &str, tick: usize) {
        let frame = SPINNER_FRAMES[tick % SPINNER_FRAMES.len()];
        print!("\r{} Executing {}...", frame.magenta(), name.cyan());
        io::stdout().flush().ok();
        self.spinner_visible = true;
    }

    fn tool_success(&mut self, name: &str) {
        self.clear_spinner();
        println!("{}", format!("Called {} successfully", name).green());
        println!();
    }

    fn tool_denied(&mut self, name: &str) {
        self.clear_spinner();
        println!(
            "{}",
            format!("Tool {} execution denied by user", name).yellow()
        );
        println!();
    }

    fn tool_failed(&mut self, name: &str, err: &ToolError) {
        self.clear_spinner();
        println!(
            "{}{}",
            format!("Tool call for {} failed: ", name).red(),
            err.to_string().yellow()
        );
        println!();
    }

    fn batch_aborted(&mut self, skipped: usize) {
        let msg = match skipped {
            0 => "Tool execution aborted.".to_string(),
            1 => "Tool execution aborted; skipped 1 remaining call.".to_string(),
            n => format!("Tool execution aborted; skipped {} remaining calls.", n),
        };
        println!("{}", msg.yellow());
        println!();
    }

    fn tools_summary(&mut self, total: usize, executed: usize, failed: usize) {
        let mut line = format!(
            "{}{}",
            "Tools Summary: ".bold(),
            format!("{}/{} executed", executed, total).green()
        );
        if failed > 0 {
            line.push_str(&format!(", {} failed", failed).red().to_string());
        }
        println!("{}", Self::rule());
        println!("{}", line);
        println!("{}", Self::rule());
        println!();
    }

    fn info(&mut self, msg: &str) {
        self.clear_spinner();
        println!("{}", msg.blue());
    }

    fn warning(&mut self, msg: &str) {
        self.clear_spinner();
        println!("{}", msg.yellow());
    }

    fn error(&mut self, msg: &str) {
        self.clear_spinner();
        eprintln!("{} {}", "error:".red().bold(), msg);
    }
}

/// Records every render call as a line of text, for assertions in tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingRenderer {
    pub events: Vec<String>,
    open: bool,
}

#[cfg(test)]
impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Index of the first event starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.events.iter().position(|e| e.starts_with(prefix))
    }

    /// Text of every finalized segment, in order.
    pub fn rendered_text(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| e.strip_prefix("text_end:"))
            .collect()
    }
}

#[cfg(test)]
impl Renderer for RecordingRenderer {
    fn text_begin(&mut self) {
        assert!(!self.open, "text render opened twice");
        self.open = true;
        self.events.push("text_begin".into());
    }

    fn text_chunk(&mut self, chunk: &str) {
        assert!(self.open, "chunk rendered without an open render");
        self.events.push(format!("text_chunk:{}", chunk));
    }

    fn text_end(&mut self, full_text: &str) {
        assert!(self.open, "render closed without being opened");
        self.open = false;
        self.events.push(format!("text_end:{}", full_text));
    }

    fn waiting(&mut self, _tick: usize) {
        assert!(!self.open, "waiting shown while text render open");
        self.events.push("waiting".into());
    }

    fn tool_request(&mut self, call: &ToolCallRequest) {
        assert!(!self.open, "tool request shown while text render open");
        self.events.push(format!("tool_request:{}", call.name));
    }

    fn tool_preview(&mut self, preview: &str) {
        self.events.push(format!("tool_preview:{}", preview));
    }

    fn tool_progress(&mut self, name: &str, _tick: usize) {
        self.events.push(format!("tool_progress:{}", name));
    }

    fn tool_success(&mut self, name: &str) {
        self.events.push(format!("tool_success:{}", name));
    }

    fn tool_denied(&mut self, name: &str) {
        self.events.push(format!("tool_denied:{}", name));
    }

    fn tool_failed(&mut self, name: &str, err: &ToolError) {
        self.events.push(format!("tool_failed:{}:{}", name, err.name));
    }

    fn batch_aborted(&mut self, skipped: usize) {
        self.events.push(format!("batch_aborted:{}", skipped));
    }

    fn tools_summary(&mut self, total: usize, executed: usize, failed: usize) {
        self.events
            .push(format!("tools_summary:{}/{}:{}", executed, total, failed));
    }

    fn info(&mut self, msg: &str) {
        self.events.push(format!("info:{}", msg));
    }

    fn warning(&mut self, msg: &str) {
        self.events.push(format!("warning:{}", msg));
    }

    fn error(&mut self, msg: &str) {
        self.events.push(format!("error:{}", msg));
    }
}
