//! LLM provider abstraction for toolchat.
//!
//! The turn engine only sees [`ModelProvider`]: submit history, get back a
//! [`PartStream`] of text chunks and tool calls. [`Provider`] implements it
//! over rig-core's clients for Anthropic, OpenAI, OpenRouter and Ollama.

mod client;
mod convert;
mod kind;
mod metadata;
mod resolve;

pub use client::Provider;
pub use kind::ProviderKind;
pub use resolve::{resolve_model, ModelSelection};

use anyhow::Result;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::message::{Message, ToolCallRequest};
use crate::tools::ToolSpec;

/// One element of a streamed model response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    Text(String),
    ToolCall(ToolCallRequest),
}

/// Best-effort description of the active model, for the session header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub parameter_size: Option<String>,
    pub quantization_level: Option<String>,
    pub capabilities: Vec<String>,
}

/// An opaque producer of model output.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Submits `history` and returns the response as a part stream.
    async fn stream(&self, history: &[Message], tools: &[ToolSpec]) -> Result<PartStream>;

    /// Metadata about the model. Fields the backend cannot report stay empty.
    async fn describe(&self) -> Result<ModelInfo>;
}

/// Finite, non-restartable sequence of [`StreamPart`]s.
///
/// A producer task feeds a capacity-1 channel, so at most one part is
/// buffered ahead of the consumer. Dropping the stream aborts the producer.
pub struct PartStream {
    rx: mpsc::Receiver<Result<StreamPart>>,
    producer: Option<JoinHandle<()>>,
}

impl PartStream {
    /// Drives `source` on a background task.
    pub fn spawn<S>(source: S) -> Self
    where
        S: Stream<Item = Result<StreamPart>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let producer = tokio::spawn(async move {
            let mut source = Box::pin(source);
            while let Some(item) = source.next().await {
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });
        Self {
            rx,
            producer: Some(producer),
        }
    }

    /// A stream that yields `parts` and ends.
    #[cfg(test)]
    pub fn from_parts(parts: Vec<StreamPart>) -> Self {
        Self::spawn(futures::stream::iter(parts.into_iter().map(Ok)))
    }

    /// Next part, or `None` once the provider signals completion.
    pub async fn next(&mut self) -> Option<Result<StreamPart>> {
        self.rx.recv().await
    }
}

impl Drop for PartStream {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}
