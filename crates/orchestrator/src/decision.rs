//! Decision step: one model call over the whole conversation.

use std::sync::Arc;
use std::time::Duration;

use brain_core::{hash_prompt, Brain, BrainError, Conversation, ModelRequest, ToolSpec, Turn};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Assistant turn used when the model call fails.
pub const MODEL_FAILURE_MESSAGE: &str = "Error: LLM call failed.";

/// What the decision step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// The assistant turn to append.
    pub turn: Turn,
    /// Set when the model failed and `turn` is the fixed error turn.
    pub error: Option<String>,
}

impl Decision {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Calls the model with the system prompt, the full history and the tool
/// specs, and turns the response into an assistant turn.
pub struct DecisionStep {
    brain: Arc<dyn Brain>,
    system_prompt: String,
    timeout: Duration,
}

impl DecisionStep {
    pub fn new(brain: Arc<dyn Brain>, system_prompt: impl Into<String>, timeout: Duration) -> Self {
        let system_prompt = system_prompt.into();
        info!(
            "Decision step using {} (prompt fingerprint: {})",
            brain.name(),
            hash_prompt(&system_prompt)
        );
        Self {
            brain,
            system_prompt,
            timeout,
        }
    }

    pub fn brain(&self) -> &Arc<dyn Brain> {
        &self.brain
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Ask the model for the next assistant turn.
    ///
    /// Never fails: network errors, bad responses and timeouts all produce
    /// the fixed [`MODEL_FAILURE_MESSAGE`] turn.
    pub async fn decide(&self, conversation: &Conversation, tools: &[ToolSpec]) -> Decision {
        let request = ModelRequest {
            system: self.system_prompt.clone(),
            turns: conversation.turns().to_vec(),
            tools: tools.to_vec(),
        };

        debug!(
            turns = request.turns.len(),
            tools = request.tools.len(),
            "Calling {}",
            self.brain.name()
        );

        let result = match timeout(self.timeout, self.brain.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(BrainError::Timeout),
        };

        match result {
            Ok(response) => {
                let mut tool_calls = response.tool_calls;
                for (i, call) in tool_calls.iter_mut().enumerate() {
                    if call.id.is_empty() {
                        call.id = format!("call_{}_{}", conversation.len(), i);
                    }
                }

                let turn = if tool_calls.is_empty() {
                    Turn::assistant(response.text)
                } else {
                    Turn::assistant_with_tools(response.text, tool_calls)
                };
                Decision { turn, error: None }
            }
            Err(e) => {
                warn!("LLM call failed: {}", e);
                Decision {
                    turn: Turn::assistant(MODEL_FAILURE_MESSAGE),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::{ModelResponse, ToolRequest};
    use mock_brain::{DelayedBrain, EchoBrain, FailingBrain, ScriptedBrain};
    use serde_json::json;

    fn convo() -> Conversation {
        vec![Turn::user("hello")].into()
    }

    #[tokio::test]
    async fn test_text_answer() {
        let step = DecisionStep::new(Arc::new(EchoBrain::new()), "sys", Duration::from_secs(5));
        let decision = step.decide(&convo(), &[]).await;

        assert!(!decision.is_failure());
        assert_eq!(decision.turn, Turn::assistant("hello"));
    }

    #[tokio::test]
    async fn test_request_carries_prompt_history_and_tools() {
        let brain = Arc::new(ScriptedBrain::from_responses(vec![ModelResponse::text("ok")]));
        let step = DecisionStep::new(brain.clone(), "Be helpful.", Duration::from_secs(5));
        let spec = ToolSpec::new("risk_calculator", "calc", json!({"type": "object"}));

        step.decide(&convo(), &[spec.clone()]).await;

        let requests = brain.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, "Be helpful.");
        assert_eq!(requests[0].turns, convo().into_turns());
        assert_eq!(requests[0].tools, vec![spec]);
    }

    #[tokio::test]
    async fn test_tool_request_turn() {
        let brain = ScriptedBrain::from_responses(vec![ModelResponse::tool_calls(vec![
            ToolRequest::new("c1", "get_horoscope").with_arg("sign", "leo"),
            ToolRequest::new("", "risk_calculator"),
        ])]);
        let step = DecisionStep::new(Arc::new(brain), "sys", Duration::from_secs(5));
        let decision = step.decide(&convo(), &[]).await;

        assert!(decision.turn.requests_tools());
        assert_eq!(decision.turn.tool_calls[0].id, "c1");
        assert!(!decision.turn.tool_calls[1].id.is_empty());
    }

    #[tokio::test]
    async fn test_failure_becomes_error_turn() {
        let step = DecisionStep::new(Arc::new(FailingBrain::default()), "sys", Duration::from_secs(5));
        let decision = step.decide(&convo(), &[]).await;

        assert!(decision.is_failure());
        assert_eq!(decision.turn.content, MODEL_FAILURE_MESSAGE);
        assert!(!decision.turn.requests_tools());
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_turn() {
        let brain = DelayedBrain::with_millis(EchoBrain::new(), 500);
        let step = DecisionStep::new(Arc::new(brain), "sys", Duration::from_millis(20));
        let decision = step.decide(&convo(), &[]).await;

        assert!(decision.is_failure());
        assert_eq!(decision.turn.content, MODEL_FAILURE_MESSAGE);
    }
}
