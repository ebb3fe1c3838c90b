//! Echo brain implementation - answers with the latest user turn.

use brain_core::{async_trait, Brain, BrainError, ModelRequest, ModelResponse, Role};

/// A brain that echoes the most recent user turn back as its answer.
///
/// It never requests tools, so a pipeline driven by it always finishes after
/// one decision. Useful for testing the message flow without any AI.
#[derive(Debug, Clone, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("Echo: ");
    /// // Will answer with "Echo: <latest user text>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Brain for EchoBrain {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, BrainError> {
        let latest = request
            .turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        let text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, latest),
            None => latest.to_string(),
        };

        Ok(ModelResponse::text(text))
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }
}
