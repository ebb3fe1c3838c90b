//! Placeholder for a tool whose backing capability failed to start.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// A tool that keeps the real tool's name and schema but always answers
/// with a fixed message.
///
/// Registered once at start-up in place of a tool that could not be built,
/// so the model still sees the tool and the conversation keeps going.
pub struct DisabledTool {
    name: String,
    description: String,
    parameters: Value,
    message: String,
}

impl DisabledTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            message: message.into(),
        }
    }

    /// Mirror `tool`'s name, description and schema.
    pub fn replacing(tool: &dyn Tool, message: impl Into<String>) -> Self {
        Self::new(tool.name(), tool.description(), tool.parameters(), message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[async_trait]
impl Tool for DisabledTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::failure(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::RiskCalculator;

    #[tokio::test]
    async fn test_replacing_mirrors_spec() {
        let real = RiskCalculator::new();
        let disabled = DisabledTool::replacing(&real, "Risk tool unavailable");

        assert_eq!(disabled.spec(), real.spec());
        assert_eq!(disabled.message(), "Risk tool unavailable");

        let output = disabled.execute(ToolArgs::default()).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.content, "Risk tool unavailable");
    }
}
