use serde::{Deserialize, Serialize};

/// Who authored a message.
///
/// The protocol requires the sequence system → user → (assistant → tool)* ;
/// after the system prompt, an exchange always opens with a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// One entry in the conversation history.
///
/// Messages are immutable once appended: the sliding window produces a new
/// list rather than editing entries in place.  Tool invocations travel as
/// XML inside assistant text, so content is always plain text here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self { role: Role::Tool, content: content.into() }
    }

    /// Rough token estimate: chars/4, minimum 1 for non-empty content.
    pub fn approx_tokens(&self) -> usize {
        if self.content.is_empty() {
            return 0;
        }
        (self.content.len() / 4).max(1)
    }
}

/// What the orchestrator hands a [`crate::ModelProvider`] for one turn.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    /// Rendered tool documentation for the system prompt suffix; providers
    /// that embed tool docs elsewhere may ignore it.
    pub tool_docs: Option<String>,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
