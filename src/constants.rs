//! Centralized constants for toolchat.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

use std::time::Duration;

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "toolchat";

/// Title shown in the session header.
pub const APP_TITLE: &str = "Offline Function Calling Agent";

/// Default LLM model identifier (an Ollama function-calling build).
pub const DEFAULT_MODEL: &str = "gemma3:12b-fc";

/// Maximum tokens for LLM completions.
pub const MAX_TOKENS: u64 = 4096;

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "toolchat.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

/// Log filename, written under the cache directory.
pub const LOG_FILENAME: &str = "toolchat.log";

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV_VAR: &str = "TOOLCHAT_LOG";

// --- Provider defaults ---

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "ollama";

/// Default LLM model identifier for Anthropic.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-6";

/// Default LLM model identifier for OpenAI.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";

/// Default LLM model identifier for OpenRouter.
pub const DEFAULT_OPENROUTER_MODEL: &str = "arcee-ai/trinity-large-preview:free";

/// Default base URL for local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

// --- Turn engine ---

/// Prompt substituted when the user attaches files without typing anything.
pub const ATTACHMENTS_ONLY_PROMPT: &str = "Please analyze the attached files.";

/// Command prefix that diverts input to the command router.
pub const COMMAND_PREFIX: char = '/';

/// Fence tag wrapping serialized tool outcomes in history.
pub const TOOL_RESULT_FENCE: &str = "tool_result";

/// Error kind recorded when the user declines a tool call.
pub const DENIED_ERROR_NAME: &str = "ToolExecutionDenied";

/// Argument strings longer than this are truncated in consent prompts.
pub const ARG_DISPLAY_LIMIT: usize = 100;

/// Spinner frame interval while a tool executes.
pub const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

/// Spinner animation frames.
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// --- Tool limits ---

/// Maximum file size (bytes) the read_file tool will read.
pub const READ_FILE_MAX_SIZE: u64 = 100 * 1024;

/// Byte threshold for binary file detection (check first N bytes for null).
pub const BINARY_DETECTION_BYTES: usize = 8192;

/// Maximum number of results the search_files tool returns.
pub const SEARCH_MAX_RESULTS: usize = 1000;

/// Deepest nesting of parentheses, signs and exponents `calculate` accepts.
pub const CALC_MAX_DEPTH: usize = 64;

/// Maximum size (bytes) of an attachment inlined into a prompt.
pub const ATTACHMENT_MAX_SIZE: u64 = 256 * 1024;

/// Todo list location, relative to the home directory.
pub const TODO_FILENAME: &str = "todos.md";

/// Expense ledger location, relative to the home directory.
pub const EXPENSES_FILENAME: &str = "data/expenses.json";

// --- Network tools ---

/// DuckDuckGo's HTML results endpoint, used by web_search.
pub const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Results web_search returns when the model does not ask for a count.
pub const SEARCH_DEFAULT_RESULTS: usize = 5;

/// Weather service queried by get_weather as `<url>/<location>?format=j1`.
pub const WEATHER_URL: &str = "https://wttr.in/";

/// User agent sent by web_search and scrape_url.
pub const WEB_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/141.0";

/// Request timeout for web_search and scrape_url.
pub const WEB_TIMEOUT: Duration = Duration::from_secs(15);

/// Request timeout for get_weather.
pub const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum bytes of stdout or stderr the run_command tool returns.
pub const COMMAND_MAX_OUTPUT_SIZE: usize = 50 * 1024;

/// Environment variables removed before spawning shell commands.
pub const COMMAND_STRIPPED_ENV_VARS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "OPENROUTER_API_KEY",
];

/// Prefix of environment variables carrying manifest tool parameters.
pub const MANIFEST_ENV_PREFIX: &str = "TOOL_";
