//! The Brain trait definition.

use async_trait::async_trait;

use crate::conversation::Turn;
use crate::error::BrainError;
use crate::tools::{ToolRequest, ToolSpec};

/// Everything a model sees for one decision.
#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    /// Fixed instruction preamble.
    pub system: String,
    /// The entire conversation so far, oldest first.
    pub turns: Vec<Turn>,
    /// Tools the model may call.
    pub tools: Vec<ToolSpec>,
}

/// A model's answer: final text, tool requests, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    /// Text content; empty when the model only asked for tools.
    pub text: String,
    /// Requested tool invocations, in the order the model listed them.
    pub tool_calls: Vec<ToolRequest>,
}

impl ModelResponse {
    /// A final text answer.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A response that requests tools.
    pub fn tool_calls(tool_calls: Vec<ToolRequest>) -> Self {
        Self {
            text: String::new(),
            tool_calls,
        }
    }
}

/// A language model backend.
///
/// Implementations range from scripted test doubles to remote
/// chat-completion endpoints. This trait is object-safe and can be used
/// with `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Ask the model for its next move given the request.
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to process requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
