//! Conversation turns and the append-only history a pipeline run works on.

use serde::{Deserialize, Serialize};

use crate::tools::{ToolRequest, ToolResult};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A message typed by the person chatting.
    User,
    /// A model answer, possibly carrying tool requests.
    Assistant,
    /// The output of one tool invocation.
    ToolResult,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool_result",
        }
    }

    /// Parse a front-end role name. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "user" | "human" => Some(Role::User),
            "assistant" | "ai" => Some(Role::Assistant),
            "tool_result" | "tool" => Some(Role::ToolResult),
            _ => None,
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Role tag.
    pub role: Role,
    /// Text payload.
    pub content: String,
    /// Tool invocations requested by an assistant turn, in request order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolRequest>,
    /// For tool-result turns: the id of the invocation this answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For tool-result turns: the tool that produced the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create an assistant turn with no tool requests.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create an assistant turn that requests tool invocations.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolRequest>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    /// Create a tool-result turn from an executed (or failed) invocation.
    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: Role::ToolResult,
            content: result.content,
            tool_calls: Vec::new(),
            tool_call_id: Some(result.tool_call_id),
            tool_name: Some(result.tool_name),
        }
    }

    /// Whether this is an assistant turn that asks for tools.
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// An ordered, append-only sequence of turns.
///
/// A conversation is owned by exactly one pipeline run at a time; there are
/// no methods that remove or rewrite turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append several turns, keeping their order.
    pub fn extend<I: IntoIterator<Item = Turn>>(&mut self, turns: I) {
        self.turns.extend(turns);
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The most recent user turn, if any.
    pub fn last_user(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether there are no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of assistant turns, i.e. model answers so far.
    pub fn assistant_turns(&self) -> usize {
        self.turns.iter().filter(|t| t.role == Role::Assistant).count()
    }

    /// Consume the conversation and return its turns.
    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

impl From<Vec<Turn>> for Conversation {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

impl FromIterator<Turn> for Conversation {
    fn from_iter<I: IntoIterator<Item = Turn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}
