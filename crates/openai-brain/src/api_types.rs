//! OpenAI chat-completions request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chat message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", "assistant" or "tool"
    pub role: String,
    /// Message content (null for assistant messages that only call tools)
    pub content: Option<String>,
    /// Tool calls made by an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ApiToolCall>>,
    /// For "tool" messages: the call being answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain("assistant", content)
    }

    /// Create a tool result message.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain("tool", content)
        }
    }

    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A function tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTool {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function specification
    pub function: FunctionDefinition,
}

/// Function definition for a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the function parameters
    pub parameters: Value,
}

/// A tool call emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToolCall {
    /// Call identifier
    pub id: String,
    /// Call type (always "function")
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    /// Function name and JSON-encoded arguments
    pub function: FunctionCall,
}

/// The function part of a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// Arguments as a JSON string
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Tools to make available (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ApiTool>>,
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response ID
    #[serde(default)]
    pub id: String,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Response choices
    pub choices: Vec<Choice>,
    /// Token usage
    pub usage: Option<Usage>,
}

/// A response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// The message
    pub message: ResponseMessage,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Response message (may carry tool calls instead of content).
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Role
    #[serde(default)]
    pub role: String,
    /// Content (may be null if tool calls)
    pub content: Option<String>,
    /// Requested tool calls
    #[serde(default)]
    pub tool_calls: Option<Vec<ApiToolCall>>,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ApiErrorDetails,
}

/// API error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    /// Error message
    pub message: String,
    /// Error type
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    /// Error code; some providers send a number here.
    #[serde(default)]
    pub code: Option<Value>,
}

impl ApiErrorDetails {
    /// One-line description, e.g. `invalid_request_error/model_not_found: ...`.
    pub fn describe(&self) -> String {
        let code = self.code.as_ref().map(|code| match code {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        match (self.error_type.as_deref(), code) {
            (Some(kind), Some(code)) => format!("{}/{}: {}", kind, code, self.message),
            (Some(kind), None) => format!("{}: {}", kind, self.message),
            (None, Some(code)) => format!("{}: {}", code, self.message),
            (None, None) => self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_describe() {
        let full: ApiError = serde_json::from_str(
            r#"{"error": {"message": "no such model", "type": "invalid_request_error", "code": "model_not_found"}}"#,
        )
        .unwrap();
        assert_eq!(
            full.error.describe(),
            "invalid_request_error/model_not_found: no such model"
        );

        let numeric: ApiError =
            serde_json::from_str(r#"{"error": {"message": "slow down", "code": 429}}"#).unwrap();
        assert_eq!(numeric.error.describe(), "429: slow down");

        let bare: ApiError = serde_json::from_str(r#"{"error": {"message": "oops"}}"#).unwrap();
        assert_eq!(bare.error.describe(), "oops");
    }
}
