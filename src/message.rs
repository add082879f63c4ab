//! Message types for toolchat's conversation history.
//!
//! A [`Message`] is a [`Role`] plus an ordered list of [`Part`]s. These are
//! toolchat's internal types, converted to provider-specific formats (e.g.
//! rig-core's `Message`) when sent to the LLM. [`History`] owns the session's
//! messages and only ever grows, except through [`History::clear`].

use serde_json::Value;
use std::path::PathBuf;

/// A tool invocation requested by the LLM.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Identifier tying this request to exactly one result.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON object of named parameters.
    pub parameters: Value,
}

impl ToolCallRequest {
    /// Creates a request, generating an id when the provider did not supply one.
    pub fn new(id: impl Into<String>, name: impl Into<String>, parameters: Value) -> Self {
        let id = id.into();
        let id = if id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            id
        };
        Self {
            id,
            name: name.into(),
            parameters,
        }
    }
}

/// The role of a message sender in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// One element of a message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    ToolCall(ToolCallRequest),
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    /// Files submitted alongside a user prompt.
    pub attachments: Vec<PathBuf>,
}

impl Message {
    pub fn user(text: impl Into<String>, attachments: Vec<PathBuf>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
            attachments,
        }
    }

    /// Builds the assistant message for one streamed round.
    ///
    /// Empty text is omitted so a tool-call-only round has no blank part.
    pub fn assistant(text: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        let text = text.into();
        let mut parts = Vec::with_capacity(tool_calls.len() + 1);
        if !text.is_empty() {
            parts.push(Part::Text(text));
        }
        parts.extend(tool_calls.into_iter().map(Part::ToolCall));
        Self {
            role: Role::Assistant,
            parts,
            attachments: Vec::new(),
        }
    }

    /// Creates a tool-role message carrying a serialized outcome and the call it answers.
    pub fn tool_result(call: ToolCallRequest, body: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            parts: vec![Part::Text(body.into()), Part::ToolCall(call)],
            attachments: Vec::new(),
        }
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::ToolCall(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallRequest> {
        self.parts.iter().filter_map(|p| match p {
            Part::ToolCall(call) => Some(call),
            Part::Text(_) => None,
        })
    }
}

/// Ordered, append-only conversation log.
#[derive(Debug, Default)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drops every message. The only way history shrinks.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
