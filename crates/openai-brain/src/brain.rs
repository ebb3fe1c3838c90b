//! OpenAiBrain implementation using an OpenAI-compatible endpoint.

use brain_core::{
    async_trait, Brain, BrainError, ModelRequest, ModelResponse, Role, ToolRequest, ToolSpec, Turn,
};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, ApiTool, ApiToolCall, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    FunctionCall, FunctionDefinition,
};
use crate::config::{AuthHeader, OpenAiBrainConfig};

/// Text used when the model returns neither content nor tool calls.
const EMPTY_RESPONSE_TEXT: &str = "I apologize, but I couldn't generate a response.";

/// A brain that calls an OpenAI-compatible chat-completions endpoint.
///
/// The brain is stateless: every call carries the full conversation, and
/// the tool specifications are bound as function tools.
pub struct OpenAiBrain {
    client: Client,
    config: OpenAiBrainConfig,
}

impl OpenAiBrain {
    /// Create a new OpenAiBrain with the given configuration.
    pub fn new(config: OpenAiBrainConfig) -> Result<Self, BrainError> {
        if config.api_key.trim().is_empty() {
            return Err(BrainError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "OpenAiBrain initialized with model: {}, url: {}",
            config.model, config.api_url
        );

        Ok(Self { client, config })
    }

    /// Create an OpenAiBrain from environment variables.
    ///
    /// See [`OpenAiBrainConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, BrainError> {
        let config = OpenAiBrainConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiBrainConfig {
        &self.config
    }

    /// Make a chat completion request.
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, BrainError> {
        let url = self.config.completions_url();

        debug!(
            "Sending request to {} ({} messages, {} tools)",
            url,
            request.messages.len(),
            request.tools.as_ref().map(|t| t.len()).unwrap_or(0)
        );

        let builder = self.client.post(&url).json(request);
        let builder = match self.config.auth_header {
            AuthHeader::Bearer => builder.bearer_auth(&self.config.api_key),
            AuthHeader::ApiKey => builder.header("x-api-key", &self.config.api_key),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BrainError::Timeout
            } else {
                BrainError::Network(format!("Failed to send request: {}", e))
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(BrainError::ProcessingFailed(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.describe()
                )));
            }

            return Err(BrainError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BrainError::ProcessingFailed(format!("Failed to parse response: {}", e)))?;

        if let Some(ref usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(completion)
    }

    fn build_request(&self, request: &ModelRequest) -> ChatCompletionRequest {
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(request.tools.iter().map(to_api_tool).collect())
        };

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: build_messages(&request.system, &request.turns),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools,
        }
    }
}

#[async_trait]
impl Brain for OpenAiBrain {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, BrainError> {
        let api_request = self.build_request(&request);
        let completion = self.chat_completion(&api_request).await?;
        parse_completion(completion)
    }

    fn name(&self) -> &str {
        "OpenAiBrain"
    }
}

/// Map the system prompt and conversation onto wire messages.
fn build_messages(system: &str, turns: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 1);

    if !system.trim().is_empty() {
        messages.push(ChatMessage::system(system));
    }

    for turn in turns {
        let message = match turn.role {
            Role::User => ChatMessage::user(turn.content.clone()),
            Role::Assistant if turn.tool_calls.is_empty() => {
                ChatMessage::assistant(turn.content.clone())
            }
            Role::Assistant => ChatMessage {
                role: "assistant".to_string(),
                content: if turn.content.is_empty() {
                    None
                } else {
                    Some(turn.content.clone())
                },
                tool_calls: Some(turn.tool_calls.iter().map(to_api_tool_call).collect()),
                tool_call_id: None,
            },
            Role::ToolResult => ChatMessage::tool(
                turn.tool_call_id.clone().unwrap_or_default(),
                turn.content.clone(),
            ),
        };
        messages.push(message);
    }

    messages
}

fn to_api_tool(spec: &ToolSpec) -> ApiTool {
    ApiTool {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: spec.parameters.clone(),
        },
    }
}

fn to_api_tool_call(request: &ToolRequest) -> ApiToolCall {
    ApiToolCall {
        id: request.id.clone(),
        call_type: "function".to_string(),
        function: FunctionCall {
            name: request.name.clone(),
            arguments: request.arguments_json(),
        },
    }
}

/// Turn the first choice of a completion into a model response.
fn parse_completion(completion: ChatCompletionResponse) -> Result<ModelResponse, BrainError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BrainError::ProcessingFailed("Response contained no choices".to_string()))?;

    let mut tool_calls = Vec::new();
    for call in choice.message.tool_calls.unwrap_or_default() {
        let request = ToolRequest::from_call(call.id, call.function.name, &call.function.arguments)
            .map_err(|e| {
                BrainError::ProcessingFailed(format!("Malformed tool call arguments: {}", e))
            })?;
        tool_calls.push(request);
    }

    let text = choice.message.content.unwrap_or_default();

    if text.trim().is_empty() && tool_calls.is_empty() {
        warn!("No content in response, using default");
        return Ok(ModelResponse::text(EMPTY_RESPONSE_TEXT));
    }

    Ok(ModelResponse { text, tool_calls })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::ToolResult;
    use serde_json::json;

    fn completion(value: serde_json::Value) -> ChatCompletionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_new_requires_key() {
        let config = OpenAiBrainConfig::builder().build();
        assert!(matches!(
            OpenAiBrain::new(config),
            Err(BrainError::Configuration(_))
        ));
    }

    #[test]
    fn test_brain_name() {
        let config = OpenAiBrainConfig::builder().api_key("test-key").build();
        let brain = OpenAiBrain::new(config).unwrap();
        assert_eq!(brain.name(), "OpenAiBrain");
    }

    #[test]
    fn test_build_messages_maps_roles() {
        let turns = vec![
            Turn::user("expected loss for 100 at 0.2?"),
            Turn::assistant_with_tools(
                "",
                vec![ToolRequest::new("call-1", "risk_calculator")
                    .with_arg("loss", 100)
                    .with_arg("probability", 0.2)],
            ),
            Turn::tool_result(ToolResult::success(
                "call-1",
                "risk_calculator",
                "Expected loss is 20",
            )),
        ];

        let messages = build_messages("Be concise.", &turns);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert!(messages[2].content.is_none());
        let calls = messages[2].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "risk_calculator");
        assert_eq!(messages[3].role, "tool");
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("call-1"));
    }

    #[test]
    fn test_build_request_binds_tools() {
        let config = OpenAiBrainConfig::builder().api_key("k").build();
        let brain = OpenAiBrain::new(config).unwrap();
        let request = ModelRequest {
            system: "sys".to_string(),
            turns: vec![Turn::user("hi")],
            tools: vec![ToolSpec::new(
                "risk_calculator",
                "Calculates expected loss.",
                json!({"type": "object", "properties": {}}),
            )],
        };

        let api_request = brain.build_request(&request);
        let json = serde_json::to_value(&api_request).unwrap();
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "risk_calculator");
        assert_eq!(json["model"], "gpt-4o-mini");
    }

    #[test]
    fn test_parse_completion_text() {
        let response = parse_completion(completion(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
        })))
        .unwrap();
        assert_eq!(response.text, "Hello!");
        assert!(response.tool_calls.is_empty());
    }

    #[test]
    fn test_parse_completion_tool_calls() {
        let response = parse_completion(completion(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "recommend_albums",
                            "arguments": "{\"query\": \"ambient textures\", \"n_results\": 2}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .unwrap();

        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(
            response.tool_calls[0].get_string("query"),
            Some("ambient textures")
        );
    }

    #[test]
    fn test_parse_completion_no_choices() {
        let result = parse_completion(completion(json!({"choices": []})));
        assert!(matches!(result, Err(BrainError::ProcessingFailed(_))));
    }

    #[test]
    fn test_parse_completion_bad_arguments() {
        let result = parse_completion(completion(json!({
            "choices": [{"message": {"tool_calls": [{
                "id": "c", "function": {"name": "risk_calculator", "arguments": "{oops"}
            }]}}]
        })));
        assert!(matches!(result, Err(BrainError::ProcessingFailed(_))));
    }

    #[test]
    fn test_parse_completion_empty_uses_default() {
        let response = parse_completion(completion(json!({
            "choices": [{"message": {"content": ""}}]
        })))
        .unwrap();
        assert_eq!(response.text, EMPTY_RESPONSE_TEXT);
    }
}
