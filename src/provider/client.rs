//! rig-core backed [`ModelProvider`].
//!
//! [`Provider`] wraps the provider-specific clients behind enum dispatch and
//! issues one streaming completion request per round. Tool calls are not
//! executed here: they surface as [`StreamPart::ToolCall`] for the turn
//! engine to gate behind consent.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use rig::client::CompletionClient;
use rig::completion::{CompletionError, CompletionModel, ToolDefinition};
use rig::message::Text;
use rig::providers::{anthropic, openai, openrouter};
use rig::streaming::StreamedAssistantContent;

use super::convert::split_history;
use super::kind::ProviderKind;
use super::metadata::ollama_model_info;
use super::resolve::ModelSelection;
use super::{ModelInfo, ModelProvider, PartStream, StreamPart};
use crate::config::Config;
use crate::constants::{MAX_TOKENS, OLLAMA_DEFAULT_BASE_URL};
use crate::message::{Message, ToolCallRequest};
use crate::tools::ToolSpec;

/// Internal enum wrapping provider-specific clients.
enum ClientKind {
    Anthropic(anthropic::Client),
    OpenAI(openai::Client),
    OpenRouter(openrouter::Client),
    Ollama(openai::Client),
}

/// A configured LLM provider ready to handle completion requests.
pub struct Provider {
    client: ClientKind,
    model: String,
    system_prompt: Option<String>,
    /// Ollama server root, used for metadata queries.
    ollama_base: Option<String>,
}

/// Dispatches an operation across provider-specific clients.
///
/// Matches on [`ClientKind`] and executes the same block for each variant,
/// letting the compiler monomorphize per provider.
macro_rules! dispatch {
    ($self:expr, |$client:ident| $body:expr) => {
        match &$self.client {
            ClientKind::Anthropic($client) => $body,
            ClientKind::OpenAI($client) => $body,
            ClientKind::OpenRouter($client) => $body,
            ClientKind::Ollama($client) => $body,
        }
    };
}

fn missing_key(provider: ProviderKind) -> String {
    format!(
        "No API key found for {provider}. Set {}_API_KEY or configure it in config.toml",
        provider.name().to_uppercase()
    )
}

impl Provider {
    /// Builds the client for `selection`, resolving credentials through the
    /// config precedence chain (env var, then config file).
    ///
    /// # Errors
    ///
    /// Returns an error if a hosted provider has no API key or client
    /// construction fails.
    pub fn from_config(config: &Config, selection: &ModelSelection) -> Result<Self> {
        let provider = selection.provider;
        let api_key = || {
            config
                .resolve_api_key(provider.name())
                .with_context(|| missing_key(provider))
        };

        let mut ollama_base = None;
        let client = match provider {
            ProviderKind::Anthropic => ClientKind::Anthropic(
                anthropic::Client::new(&api_key()?).context("Failed to create Anthropic client")?,
            ),
            ProviderKind::OpenAI => ClientKind::OpenAI(
                openai::Client::new(&api_key()?).context("Failed to create OpenAI client")?,
            ),
            ProviderKind::OpenRouter => ClientKind::OpenRouter(
                openrouter::Client::new(&api_key()?)
                    .context("Failed to create OpenRouter client")?,
            ),
            ProviderKind::Ollama => {
                let base_url = config
                    .base_url("ollama")
                    .unwrap_or(OLLAMA_DEFAULT_BASE_URL)
                    .trim_end_matches('/')
                    .to_string();
                let client = openai::Client::builder()
                    .api_key("ollama")
                    .base_url(format!("{}/v1", base_url))
                    .build()
                    .context("Failed to create Ollama client")?;
                ollama_base = Some(base_url);
                ClientKind::Ollama(client)
            }
        };

        tracing::info!(%provider, model = %selection.model, "provider ready");
        Ok(Self {
            client,
            model: selection.model.clone(),
            system_prompt: config.system_prompt.clone().filter(|s| !s.trim().is_empty()),
            ollama_base,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn to_definition(spec: &ToolSpec) -> ToolDefinition {
    ToolDefinition {
        name: spec.name.clone(),
        description: spec.description.clone(),
        parameters: spec.parameters.clone(),
    }
}

/// Keeps text and complete tool calls; deltas, reasoning and the final
/// usage record are dropped.
fn to_part<R>(item: Result<StreamedAssistantContent<R>, CompletionError>) -> Option<Result<StreamPart>> {
    match item {
        Ok(StreamedAssistantContent::Text(Text { text })) => Some(Ok(StreamPart::Text(text))),
        Ok(StreamedAssistantContent::ToolCall { tool_call, .. }) => {
            Some(Ok(StreamPart::ToolCall(ToolCallRequest::new(
                tool_call.id,
                tool_call.function.name,
                tool_call.function.arguments,
            ))))
        }
        Ok(_) => None,
        Err(err) => Some(Err(anyhow::Error::new(err).context("Streaming error"))),
    }
}

#[async_trait]
impl ModelProvider for Provider {
    async fn stream(&self, history: &[Message], tools: &[ToolSpec]) -> Result<PartStream> {
        let (prompt, chat_history) = split_history(history)?;
        let definitions: Vec<ToolDefinition> = tools.iter().map(to_definition).collect();
        tracing::debug!(
            model = %self.model,
            messages = history.len(),
            tools = definitions.len(),
            "submitting history"
        );

        dispatch!(self, |client| {
            let model = client.completion_model(&self.model);
            let mut request = model
                .completion_request(prompt)
                .messages(chat_history)
                .tools(definitions)
                .max_tokens(MAX_TOKENS);
            if let Some(sys) = &self.system_prompt {
                request = request.preamble(sys.clone());
            }
            let response = request
                .stream()
                .await
                .context("Failed to start model stream")?;
            Ok(PartStream::spawn(
                response.filter_map(|item| futures::future::ready(to_part(item))),
            ))
        })
    }

    async fn describe(&self) -> Result<ModelInfo> {
        match &self.ollama_base {
            Some(base) => ollama_model_info(base, &self.model).await,
            None => Ok(ModelInfo {
                name: self.model.clone(),
                ..ModelInfo::default()
            }),
        }
    }
}
