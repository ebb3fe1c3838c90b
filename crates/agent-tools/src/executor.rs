//! ToolExecutor implementation backed by ToolRegistry.

use std::sync::Arc;

use brain_core::{ToolExecutor, ToolRequest, ToolResult, ToolSpec};
use tracing::warn;

use crate::{ToolError, ToolRegistry};

/// Error payload for a tool that is not registered.
pub const TOOL_UNAVAILABLE: &str = "tool unavailable";

/// Error payload for a tool that exceeded its time budget.
pub const TOOL_TIMED_OUT: &str = "tool execution timed out";

/// Runs model tool requests against a [`ToolRegistry`], turning every
/// outcome into a [`ToolResult`].
pub struct RegistryToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl RegistryToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.registry.as_ref()
    }
}

#[async_trait::async_trait]
impl ToolExecutor for RegistryToolExecutor {
    async fn execute(&self, request: ToolRequest) -> ToolResult {
        let ToolRequest {
            id,
            name,
            arguments,
        } = request;

        if !self.registry.has_tool(&name) {
            warn!("Model requested unavailable tool '{}'", name);
            return ToolResult::error(id, name, TOOL_UNAVAILABLE);
        }

        let output = match self.registry.execute(&name, arguments).await {
            Ok(output) => output,
            Err(ToolError::NotFound(_)) => return ToolResult::error(id, name, TOOL_UNAVAILABLE),
            Err(error) => {
                warn!("Tool '{}' failed: {}", name, error);
                return ToolResult::error(id, name, error.to_string());
            }
        };

        if output.success {
            ToolResult::success(id, name, output.content)
        } else {
            ToolResult::error(id, name, output.content)
        }
    }

    fn supported_tools(&self) -> Vec<&str> {
        self.registry.list_tools()
    }

    fn specs(&self) -> Vec<ToolSpec> {
        self.registry.specs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tool, ToolArgs, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTool {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "counting_tool"
        }

        fn description(&self) -> &str {
            "Counts executions"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            let current = self.count.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ToolOutput::success(format!("count: {}", current)))
        }
    }

    fn registry_with_counter(counter: Arc<AtomicUsize>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(CountingTool { count: counter });
        registry
    }

    #[tokio::test]
    async fn test_executes_registered_tool() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = RegistryToolExecutor::new(registry_with_counter(counter.clone()));

        let result = executor
            .execute(ToolRequest::new("call-1", "counting_tool"))
            .await;
        assert!(result.success);
        assert_eq!(result.tool_call_id, "call-1");
        assert_eq!(result.tool_name, "counting_tool");
        assert_eq!(result.content, "count: 1");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_unavailable() {
        let executor = RegistryToolExecutor::new(ToolRegistry::new());

        let result = executor.execute(ToolRequest::new("call-1", "no_such_tool")).await;
        assert!(!result.success);
        assert_eq!(result.tool_name, "no_such_tool");
        assert!(result.content.contains(TOOL_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_specs_follow_registry() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = RegistryToolExecutor::new(registry_with_counter(counter.clone()));

        assert_eq!(executor.supported_tools(), vec!["counting_tool"]);
        assert_eq!(executor.specs()[0].name, "counting_tool");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
