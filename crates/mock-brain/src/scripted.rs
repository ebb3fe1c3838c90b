//! Scripted brains - replay a fixed sequence of model responses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, Brain, BrainError, ModelRequest, ModelResponse, ToolRequest};
use tokio::sync::Mutex;

/// One scripted step: either a response or a failure.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Return this response.
    Respond(ModelResponse),
    /// Fail with `BrainError::Unavailable` carrying this message.
    Fail(String),
}

/// A brain that returns pre-recorded responses in order.
///
/// Every request is recorded so tests can inspect what the model was shown.
/// Once the script runs out the brain answers with a fixed text.
pub struct ScriptedBrain {
    steps: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
    exhausted_text: String,
}

impl ScriptedBrain {
    /// Create a brain that plays `steps` in order.
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            exhausted_text: "(script exhausted)".to_string(),
        }
    }

    /// Convenience: a script made only of responses.
    pub fn from_responses(responses: Vec<ModelResponse>) -> Self {
        Self::new(responses.into_iter().map(ScriptStep::Respond).collect())
    }

    /// Set the text returned after the script is exhausted.
    pub fn with_exhausted_text(mut self, text: impl Into<String>) -> Self {
        self.exhausted_text = text.into();
        self
    }

    /// Number of times `complete` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All requests seen so far, oldest first.
    pub async fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);

        match self.steps.lock().await.pop_front() {
            Some(ScriptStep::Respond(response)) => Ok(response),
            Some(ScriptStep::Fail(message)) => Err(BrainError::Unavailable(message)),
            None => Ok(ModelResponse::text(self.exhausted_text.clone())),
        }
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}

/// A brain that always fails.
#[derive(Debug, Clone)]
pub struct FailingBrain {
    message: String,
}

impl FailingBrain {
    /// Create a brain that fails with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingBrain {
    fn default() -> Self {
        Self::new("quota exceeded")
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn complete(&self, _request: ModelRequest) -> Result<ModelResponse, BrainError> {
        Err(BrainError::Network(self.message.clone()))
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

/// A brain that requests the same tool on every call and never answers.
///
/// Used to prove the dispatch loop terminates under a round limit.
pub struct LoopingBrain {
    tool_name: String,
    calls: AtomicUsize,
}

impl LoopingBrain {
    /// Create a brain that keeps asking for `tool_name`.
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `complete` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Brain for LoopingBrain {
    async fn complete(&self, _request: ModelRequest) -> Result<ModelResponse, BrainError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ModelResponse::tool_calls(vec![ToolRequest::new(
            format!("loop-{}", call),
            self.tool_name.clone(),
        )]))
    }

    fn name(&self) -> &str {
        "LoopingBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_plays_in_order_then_exhausts() {
        let brain = ScriptedBrain::new(vec![
            ScriptStep::Respond(ModelResponse::text("one")),
            ScriptStep::Fail("down".to_string()),
        ])
        .with_exhausted_text("done");

        let first = brain.complete(ModelRequest::default()).await.unwrap();
        assert_eq!(first.text, "one");

        let second = brain.complete(ModelRequest::default()).await;
        assert!(matches!(second, Err(BrainError::Unavailable(_))));

        let third = brain.complete(ModelRequest::default()).await.unwrap();
        assert_eq!(third.text, "done");

        assert_eq!(brain.calls(), 3);
        assert_eq!(brain.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_brain() {
        let brain = FailingBrain::default();
        assert!(brain.complete(ModelRequest::default()).await.is_err());
        assert!(!brain.is_ready().await);
    }

    #[tokio::test]
    async fn test_looping_brain_always_requests_tool() {
        let brain = LoopingBrain::new("no_such_tool");
        for _ in 0..3 {
            let response = brain.complete(ModelRequest::default()).await.unwrap();
            assert_eq!(response.tool_calls.len(), 1);
            assert_eq!(response.tool_calls[0].name, "no_such_tool");
        }
        assert_eq!(brain.calls(), 3);
    }
}
