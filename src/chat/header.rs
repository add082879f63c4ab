//! Session header and help screen.

use colored::Colorize;

use crate::constants::APP_TITLE;
use crate::provider::{ModelInfo, ModelProvider};

/// What the header shows about the running session.
pub(crate) struct SessionHeader {
    info: ModelInfo,
    custom_prompt: bool,
}

impl SessionHeader {
    /// Asks the provider for model metadata, falling back to just the name.
    pub(crate) async fn query(provider: &dyn ModelProvider, model: &str, custom_prompt: bool) -> Self {
        let info = match provider.describe().await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "model metadata unavailable");
                ModelInfo::default()
            }
        };
        Self::new(info, model, custom_prompt)
    }

    pub(crate) fn new(mut info: ModelInfo, model: &str, custom_prompt: bool) -> Self {
        if info.name.is_empty() {
            info.name = model.to_string();
        }
        Self {
            info,
            custom_prompt,
        }
    }

    pub(crate) fn render(&self, tool_count: usize) -> String {
        let mut details = Vec::new();
        if let Some(size) = &self.info.parameter_size {
            details.push(size.clone());
        }
        if let Some(quant) = &self.info.quantization_level {
            details.push(quant.clone());
        }

        let mut lines = vec![APP_TITLE.bold().cyan().to_string()];
        let mut model_line = format!("  {} {}", "Model:".bold(), self.info.name.yellow());
        if !details.is_empty() {
            model_line.push_str(&format!(" {}", format!("({})", details.join(", ")).dimmed()));
        }
        lines.push(model_line);
        if !self.info.capabilities.is_empty() {
            lines.push(format!(
                "  {} {}",
                "Capabilities:".bold(),
                self.info.capabilities.join(", ")
            ));
        }

        let prompt = if self.custom_prompt {
            "Custom prompt"
        } else {
            "Default prompt"
        };
        lines.push(format!("  {} tools enabled · {}", tool_count, prompt));
        lines.push("  Type /help for commands, Ctrl+D to exit".dimmed().to_string());
        lines.join("\n")
    }

    pub(crate) fn print(&self, tool_count: usize) {
        println!("{}", self.render(tool_count));
        println!();
    }
}

pub(crate) fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  {}  end the session", "/exit, /quit".cyan());
    println!("  {}         clear conversation history", "/clear".cyan());
    println!("  {}  list or reload tools", "/tools [list|reload]".cyan());
    println!("  {}          show this help", "/help".cyan());
    println!();
    println!(
        "{}",
        "Mention any valid file path in your message to attach it.".dimmed()
    );
    println!(
        "{}",
        "End a line with \\ to continue on the next one.".dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_metadata() {
        let info = ModelInfo {
            name: "gemma3:12b-fc".into(),
            parameter_size: Some("12.2B".into()),
            quantization_level: Some("Q4_K_M".into()),
            capabilities: vec!["completion".into(), "tools".into()],
        };
        let out = SessionHeader::new(info, "ignored", true).render(18);
        assert!(out.contains("gemma3:12b-fc"));
        assert!(out.contains("(12.2B, Q4_K_M)"));
        assert!(out.contains("completion, tools"));
        assert!(out.contains("18 tools enabled · Custom prompt"));
    }

    #[test]
    fn test_render_falls_back_to_model_name() {
        let out = SessionHeader::new(ModelInfo::default(), "gpt-4.1", false).render(3);
        assert!(out.contains("gpt-4.1"));
        assert!(!out.contains("Capabilities"));
        assert!(out.contains("3 tools enabled · Default prompt"));
    }
}
