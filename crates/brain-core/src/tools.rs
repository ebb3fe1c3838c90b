//! Tool calling convention shared by brains, tools and the dispatcher.
//!
//! A brain never runs a tool itself. It describes the call it wants as a
//! [`ToolRequest`]; something implementing [`ToolExecutor`] runs it and hands
//! back a [`ToolResult`] that is folded into the conversation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// What a model is told about a tool it may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name, used for dispatch.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema object describing the arguments.
    pub parameters: Value,
}

impl ToolSpec {
    /// Create a tool specification.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A request, produced by the model, to execute one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Unique ID for this tool call.
    pub id: String,
    /// Name of the tool to execute.
    pub name: String,
    /// Arguments as a JSON object.
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

impl ToolRequest {
    /// Create a request with no arguments.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: HashMap::new(),
        }
    }

    /// Add an argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Parse arguments from a JSON string.
    ///
    /// An empty string is accepted as "no arguments", which some endpoints
    /// send for zero-argument functions.
    pub fn from_call(
        id: String,
        name: String,
        arguments_json: &str,
    ) -> Result<Self, serde_json::Error> {
        let arguments: HashMap<String, Value> = if arguments_json.trim().is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(arguments_json)?
        };
        Ok(Self {
            id,
            name,
            arguments,
        })
    }

    /// Serialize the arguments back to a JSON string.
    pub fn arguments_json(&self) -> String {
        serde_json::to_string(&self.arguments).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get a string argument by name.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// The tool call ID this result corresponds to.
    pub tool_call_id: String,
    /// The tool that was asked for.
    pub tool_name: String,
    /// The result content (will be sent back to the model).
    pub content: String,
    /// Whether the tool execution succeeded.
    pub success: bool,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            success: true,
        }
    }

    /// Create a failed tool result.
    pub fn error(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            content: format!("Error: {}", error.into()),
            success: false,
        }
    }
}

/// Trait for executing tools requested by a brain.
///
/// Implementations must never panic or fail outright: every problem
/// (unknown tool, bad arguments, timeouts) is reported as an error
/// [`ToolResult`] so sibling calls and the conversation carry on.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool and return the result.
    async fn execute(&self, request: ToolRequest) -> ToolResult;

    /// List the tools this executor supports.
    fn supported_tools(&self) -> Vec<&str>;

    /// Specifications to bind to the model, in a stable order.
    fn specs(&self) -> Vec<ToolSpec>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("call-123", "risk_calculator", "Expected loss is 20");
        assert!(result.success);
        assert_eq!(result.tool_call_id, "call-123");
        assert_eq!(result.content, "Expected loss is 20");
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("call-456", "mystery", "tool unavailable");
        assert!(!result.success);
        assert_eq!(result.content, "Error: tool unavailable");
    }

    #[test]
    fn test_tool_request_parsing() {
        let request = ToolRequest::from_call(
            "id-1".to_string(),
            "recommend_albums".to_string(),
            r#"{"query": "ambient textures", "n_results": 2}"#,
        )
        .unwrap();

        assert_eq!(request.name, "recommend_albums");
        assert_eq!(request.get_string("query"), Some("ambient textures"));
        assert_eq!(request.arguments.get("n_results"), Some(&Value::from(2)));
    }

    #[test]
    fn test_tool_request_empty_arguments() {
        let request =
            ToolRequest::from_call("id-2".to_string(), "get_cat_facts".to_string(), "").unwrap();
        assert!(request.arguments.is_empty());
    }

    #[test]
    fn test_tool_request_rejects_malformed_json() {
        let result = ToolRequest::from_call("id-3".to_string(), "x".to_string(), "{not json");
        assert!(result.is_err());
    }
}
