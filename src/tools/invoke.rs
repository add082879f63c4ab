//! Consent-gated execution of a batch of tool calls.
//!
//! [`Coordinator::process`] walks a batch strictly in order: present the
//! call, ask for consent, execute on the blocking pool, record the outcome.
//! The first denial ends the batch.

use serde_json::{json, Value};
use std::path::PathBuf;

use super::{ToolError, ToolRegistry, ToolSpec};
use crate::consent::{ConsentError, ConsentPrompt};
use crate::constants::{DENIED_ERROR_NAME, SPINNER_INTERVAL, TOOL_RESULT_FENCE};
use crate::message::{Message, ToolCallRequest};
use crate::output::Renderer;
use crate::preview;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Denied(ToolError),
    Error(ToolError),
}

/// Outcome of one tool call, tied to the request it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call: ToolCallRequest,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn denied(call: ToolCallRequest) -> Self {
        let err = ToolError::new(
            DENIED_ERROR_NAME,
            format!("User denied execution of tool '{}'.", call.name),
        );
        Self {
            call,
            outcome: ToolOutcome::Denied(err),
        }
    }

    /// JSON payload recorded in history.
    pub fn payload(&self) -> Value {
        match &self.outcome {
            ToolOutcome::Success(value) => json!({ "result": value }),
            ToolOutcome::Denied(err) | ToolOutcome::Error(err) => json!({ "error": err }),
        }
    }

    /// The payload wrapped in a `tool_result` fence.
    pub fn to_wire(&self) -> String {
        let body = serde_json::to_string_pretty(&self.payload())
            .unwrap_or_else(|_| self.payload().to_string());
        format!("```{}\n{}\n```", TOOL_RESULT_FENCE, body)
    }

    pub fn into_message(self) -> Message {
        let body = self.to_wire();
        Message::tool_result(self.call, body)
    }
}

/// Results of one batch plus the counters shown in the summary.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<ToolResult>,
    pub executed: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn was_aborted(&self) -> bool {
        self.results
            .last()
            .is_some_and(|r| matches!(r.outcome, ToolOutcome::Denied(_)))
    }
}

pub struct Coordinator<'a> {
    registry: &'a ToolRegistry,
    consent: &'a dyn ConsentPrompt,
    /// Base for resolving paths in change previews.
    root: PathBuf,
}

impl<'a> Coordinator<'a> {
    pub fn new(registry: &'a ToolRegistry, consent: &'a dyn ConsentPrompt, root: PathBuf) -> Self {
        Self {
            registry,
            consent,
            root,
        }
    }

    /// Schemas advertised to the model alongside history.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.registry.specs()
    }

    /// Runs `batch` in order, returning at most one result per request.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError`] if the consent prompt is interrupted; results
    /// gathered so far are dropped along with the turn.
    pub async fn process(
        &self,
        batch: &[ToolCallRequest],
        renderer: &mut dyn Renderer,
    ) -> Result<BatchOutcome, ConsentError> {
        let mut outcome = BatchOutcome::default();

        for (i, call) in batch.iter().enumerate() {
            renderer.tool_request(call);
            if let Some(diff) = preview::for_call(call, &self.root) {
                renderer.tool_preview(&diff);
            }

            if !self.consent.confirm(call).await? {
                tracing::info!(tool = %call.name, id = %call.id, "tool call denied");
                renderer.tool_denied(&call.name);
                renderer.batch_aborted(batch.len() - i - 1);
                outcome.results.push(ToolResult::denied(call.clone()));
                break;
            }

            let result = self.execute(call, renderer).await;
            match &result {
                Ok(_) => {
                    outcome.executed += 1;
                    renderer.tool_success(&call.name);
                }
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(tool = %call.name, error = %err, "tool call failed");
                    renderer.tool_failed(&call.name, err);
                }
            }
            outcome.results.push(ToolResult {
                call: call.clone(),
                outcome: match result {
                    Ok(value) => ToolOutcome::Success(value),
                    Err(err) => ToolOutcome::Error(err),
                },
            });
        }

        if batch.len() > 1 {
            renderer.tools_summary(batch.len(), outcome.executed, outcome.failed);
        }
        Ok(outcome)
    }

    /// Executes one call on the blocking pool, ticking the progress
    /// indicator until it finishes.
    async fn execute(
        &self,
        call: &ToolCallRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<Value, ToolError> {
        let Some(tool) = self.registry.get(&call.name) else {
            return Err(ToolError::new(
                "UnknownTool",
                format!("No tool named '{}' is registered.", call.name),
            ));
        };

        tracing::debug!(tool = %call.name, id = %call.id, "executing tool");
        let params = call.parameters.clone();
        let mut handle = tokio::task::spawn_blocking(move || tool.execute(params));
        let mut ticker = tokio::time::interval(SPINNER_INTERVAL);
        let mut tick = 0;

        let joined = loop {
            tokio::select! {
                joined = &mut handle => break joined,
                _ = ticker.tick() => {
                    renderer.tool_progress(&call.name, tick);
                    tick += 1;
                }
            }
        };

        joined.unwrap_or_else(|e| {
            Err(ToolError::new(
                "ToolPanicked",
                format!("Tool '{}' panicked: {}", call.name, e),
            ))
        })
    }
}
