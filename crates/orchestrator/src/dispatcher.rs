//! Tool dispatcher: runs one batch of tool requests.

use std::sync::Arc;
use std::time::Duration;

use agent_tools::TOOL_TIMED_OUT;
use brain_core::{ToolExecutor, ToolRequest, ToolResult, Turn};
use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Executes tool requests concurrently and returns one tool-result turn per
/// request, in request order.
pub struct ToolDispatcher {
    executor: Arc<dyn ToolExecutor>,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(executor: Arc<dyn ToolExecutor>, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    pub fn executor(&self) -> &Arc<dyn ToolExecutor> {
        &self.executor
    }

    /// Run every request in the batch.
    ///
    /// Each call is independent: an unknown tool, a failure or a timeout only
    /// affects its own result turn.
    pub async fn dispatch(&self, requests: &[ToolRequest]) -> Vec<Turn> {
        debug!("Dispatching {} tool calls", requests.len());

        let calls = requests.iter().cloned().map(|request| self.run_one(request));
        join_all(calls)
            .await
            .into_iter()
            .map(Turn::tool_result)
            .collect()
    }

    async fn run_one(&self, request: ToolRequest) -> ToolResult {
        let id = request.id.clone();
        let name = request.name.clone();

        match timeout(self.timeout, self.executor.execute(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Tool '{}' ({}) timed out after {:?}", name, id, self.timeout);
                ToolResult::error(id, name, TOOL_TIMED_OUT)
            }
        }
    }
}
