//! Conversation turn engine.
//!
//! One user turn is a loop of rounds: submit history, stream the reply while
//! rendering text live, then hand any requested tool calls to the
//! [`Coordinator`] and go round again with the results appended. The turn
//! ends on the first round that requests no tools.
//!
//! Messages produced during a turn are staged and only committed to history
//! when the turn completes, so a cancelled turn leaves no trace.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::consent::ConsentError;
use crate::constants::{ATTACHMENTS_ONLY_PROMPT, SPINNER_INTERVAL};
use crate::message::{History, Message, ToolCallRequest};
use crate::output::Renderer;
use crate::provider::{ModelProvider, PartStream, StreamPart};
use crate::tools::invoke::{Coordinator, ToolResult};

#[derive(Debug, Error)]
pub enum TurnError {
    /// Ctrl+C during the turn, including at a consent prompt.
    #[error("turn cancelled")]
    Cancelled,
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
    #[error(transparent)]
    Consent(ConsentError),
}

impl From<ConsentError> for TurnError {
    fn from(err: ConsentError) -> Self {
        match err {
            ConsentError::Cancelled => TurnError::Cancelled,
            other => TurnError::Consent(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Streaming,
    ToolExecution,
    Continuation,
}

#[derive(Debug, Default, PartialEq)]
pub struct TurnReport {
    /// Rounds that followed a tool batch.
    pub continuations: usize,
    /// Assistant text from the final round.
    pub text: String,
}

pub struct TurnEngine {
    provider: Arc<dyn ModelProvider>,
    history: History,
    state: TurnState,
}

impl TurnEngine {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            history: History::new(),
            state: TurnState::Idle,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn transition(&mut self, next: TurnState) {
        tracing::debug!(from = ?self.state, to = ?next, "turn state");
        self.state = next;
    }

    /// Runs one user turn to completion.
    ///
    /// An empty `prompt` with attachments is replaced by a stock request to
    /// analyze them.
    ///
    /// # Errors
    ///
    /// [`TurnError::Cancelled`] if the user interrupts a consent prompt;
    /// [`TurnError::Provider`] if the model request or its stream fails. In
    /// both cases history is left as it was before the turn.
    pub async fn run_turn(
        &mut self,
        prompt: &str,
        attachments: Vec<PathBuf>,
        coordinator: &Coordinator<'_>,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnReport, TurnError> {
        let prompt = if prompt.trim().is_empty() && !attachments.is_empty() {
            ATTACHMENTS_ONLY_PROMPT
        } else {
            prompt
        };

        let result = self
            .run_rounds(Message::user(prompt, attachments), coordinator, renderer)
            .await;
        self.transition(TurnState::Idle);

        let (pending, report) = result?;
        for message in pending {
            self.history.push(message);
        }
        tracing::info!(
            continuations = report.continuations,
            history = self.history.len(),
            "turn complete"
        );
        Ok(report)
    }

    async fn run_rounds(
        &mut self,
        user: Message,
        coordinator: &Coordinator<'_>,
        renderer: &mut dyn Renderer,
    ) -> Result<(Vec<Message>, TurnReport), TurnError> {
        let specs = coordinator.specs();
        let mut pending = vec![user];
        let mut continuations = 0;

        loop {
            self.transition(TurnState::Streaming);
            let transcript: Vec<Message> = self
                .history
                .messages()
                .iter()
                .chain(pending.iter())
                .cloned()
                .collect();
            let provider = &self.provider;
            let opening = async {
                let mut stream = provider.stream(&transcript, &specs).await?;
                let first = stream.next().await;
                anyhow::Ok((stream, first))
            };
            let (mut stream, first) = until_first_part(opening, renderer).await?;
            let (text, calls) = consume(first, &mut stream, renderer).await?;
            drop(stream);

            pending.push(Message::assistant(text.clone(), calls.clone()));
            if calls.is_empty() {
                return Ok((
                    pending,
                    TurnReport {
                        continuations,
                        text,
                    },
                ));
            }

            self.transition(TurnState::ToolExecution);
            let batch = coordinator.process(&calls, renderer).await?;
            tracing::debug!(
                results = batch.results.len(),
                aborted = batch.was_aborted(),
                "tool batch finished"
            );
            pending.extend(batch.results.into_iter().map(ToolResult::into_message));

            self.transition(TurnState::Continuation);
            continuations += 1;
        }
    }
}

/// Live text rendering for one stream. At most one segment is open at a
/// time; dropping the guard closes it, so errors never leave it dangling.
struct TextSegment<'r> {
    renderer: &'r mut dyn Renderer,
    segment: Option<String>,
}

impl<'r> TextSegment<'r> {
    fn new(renderer: &'r mut dyn Renderer) -> Self {
        Self {
            renderer,
            segment: None,
        }
    }

    fn push(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        if self.segment.is_none() {
            self.renderer.text_begin();
            self.segment = Some(String::new());
        }
        if let Some(segment) = &mut self.segment {
            segment.push_str(chunk);
        }
        self.renderer.text_chunk(chunk);
    }

    fn close(&mut self) {
        if let Some(text) = self.segment.take() {
            self.renderer.text_end(&text);
        }
    }
}

impl Drop for TextSegment<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Awaits `opening`, ticking the waiting indicator until it resolves.
async fn until_first_part<F: Future>(opening: F, renderer: &mut dyn Renderer) -> F::Output {
    tokio::pin!(opening);
    let mut ticker = tokio::time::interval(SPINNER_INTERVAL);
    let mut tick = 0;

    loop {
        tokio::select! {
            biased;
            output = &mut opening => return output,
            _ = ticker.tick() => {
                renderer.waiting(tick);
                tick += 1;
            }
        }
    }
}

/// Drains `stream` starting from its already received `first` part,
/// returning the round's full text and its tool calls in arrival order.
async fn consume(
    first: Option<anyhow::Result<StreamPart>>,
    stream: &mut PartStream,
    renderer: &mut dyn Renderer,
) -> Result<(String, Vec<ToolCallRequest>), TurnError> {
    let mut live = TextSegment::new(renderer);
    let mut text = String::new();
    let mut calls = Vec::new();

    let mut next = first;
    while let Some(part) = next {
        match part? {
            StreamPart::Text(chunk) => {
                text.push_str(&chunk);
                live.push(&chunk);
            }
            StreamPart::ToolCall(call) => {
                live.close();
                tracing::debug!(tool = %call.name, id = %call.id, "tool call streamed");
                calls.push(call);
            }
        }
        next = stream.next().await;
    }
    live.close();
    Ok((text, calls))
}
