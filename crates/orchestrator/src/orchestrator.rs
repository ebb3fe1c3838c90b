//! The chat front door: builds the pipeline and runs user turns through it.

use std::sync::Arc;

use agent_tools::{default_registry, RecommendAlbums, RegistryToolExecutor};
use brain_core::{Brain, Conversation, ToolExecutor, Turn};
use indexmap::IndexMap;
use openai_brain::OpenAiBrain;
use review_index::{IndexConfig, ReviewIndex};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::decision::DecisionStep;
use crate::dispatcher::ToolDispatcher;
use crate::error::OrchestratorError;
use crate::guardrails::Guardrails;
use crate::pipeline::{Pipeline, RunOutcome};

/// Runs user turns through guardrails, the model and the tools.
///
/// The orchestrator holds no conversation state of its own: callers pass
/// the prior history with every turn and get the answer text back.
/// [`submit_keyed`](Self::submit_keyed) additionally serializes turns that
/// share a conversation key.
pub struct Orchestrator {
    pipeline: Pipeline,
    /// Per-conversation locks, oldest first.
    locks: Mutex<IndexMap<String, Arc<Mutex<()>>>>,
    max_conversations: usize,
    /// Index owned for the process lifetime, closed on shutdown.
    index: Option<ReviewIndex>,
}

impl Orchestrator {
    /// Create an orchestrator from its parts.
    pub fn new(
        brain: Arc<dyn Brain>,
        executor: Arc<dyn ToolExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        let guardrails = Guardrails::new(config.guardrail_match);
        let decision = DecisionStep::new(brain, config.system_prompt, config.model_timeout);
        let dispatcher = ToolDispatcher::new(executor, config.tool_timeout);

        info!(
            "Orchestrator ready: tools={:?}, max_tool_rounds={}, guardrails={:?}",
            dispatcher.executor().supported_tools(),
            config.max_tool_rounds,
            guardrails.mode()
        );

        Self {
            pipeline: Pipeline::new(guardrails, decision, dispatcher, config.max_tool_rounds),
            locks: Mutex::new(IndexMap::new()),
            max_conversations: config.max_conversations.max(1),
            index: None,
        }
    }

    /// Hand the orchestrator ownership of the review index so
    /// [`shutdown`](Self::shutdown) can close it.
    pub fn with_index(mut self, index: ReviewIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Create an orchestrator from environment variables.
    ///
    /// Reads [`OrchestratorConfig`], the OpenAI model settings and the
    /// review index settings. An index that cannot be opened is not fatal:
    /// `recommend_albums` is registered as a disabled tool instead.
    pub async fn from_env() -> Result<Self, OrchestratorError> {
        let config = OrchestratorConfig::from_env();
        config.validate()?;

        let brain = OpenAiBrain::from_env()?;

        let index_config = IndexConfig::from_env();
        let index = match ReviewIndex::open(&index_config).await {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("Failed to open review index: {}", e);
                None
            }
        };

        let music = index
            .clone()
            .map(|index| RecommendAlbums::new(index, index_config.max_results));
        let executor = RegistryToolExecutor::new(default_registry(music));

        let orchestrator = Self::new(Arc::new(brain), Arc::new(executor), config);
        Ok(match index {
            Some(index) => orchestrator.with_index(index),
            None => orchestrator,
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Whether the underlying model reports itself ready.
    pub async fn is_ready(&self) -> bool {
        self.pipeline.is_ready().await
    }

    /// Run a full conversation whose last turn is the new user turn.
    pub async fn run(&self, conversation: Conversation) -> RunOutcome {
        self.pipeline.run(conversation).await
    }

    /// Answer one user turn given the prior history.
    pub async fn submit(&self, user_text: &str, prior_history: Vec<Turn>) -> String {
        let mut conversation = Conversation::from(prior_history);
        conversation.push(Turn::user(user_text));
        self.run(conversation).await.answer
    }

    /// Like [`run`](Self::run), but runs sharing a key are serialized.
    pub async fn run_keyed(&self, key: &str, conversation: Conversation) -> RunOutcome {
        let lock = self.lock_for(key).await;
        let _guard = lock.lock().await;
        self.run(conversation).await
    }

    /// Like [`submit`](Self::submit), but turns with the same key run one at
    /// a time.
    pub async fn submit_keyed(&self, key: &str, user_text: &str, prior_history: Vec<Turn>) -> String {
        let mut conversation = Conversation::from(prior_history);
        conversation.push(Turn::user(user_text));
        self.run_keyed(key, conversation).await.answer
    }

    /// Number of conversation locks currently held in the table.
    pub async fn tracked_conversations(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Release owned resources.
    pub async fn shutdown(&self) {
        if let Some(index) = &self.index {
            index.close().await;
        }
        info!("Orchestrator shut down");
    }

    /// Fetch or create the lock for `key`, marking it most recently used.
    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;

        let lock = locks
            .shift_remove(key)
            .unwrap_or_else(|| Arc::new(Mutex::new(())));
        locks.insert(key.to_string(), lock.clone());

        // Evict the oldest idle entries; a lock still held elsewhere stays.
        while locks.len() > self.max_conversations {
            let idle = locks
                .iter()
                .position(|(_, lock)| Arc::strong_count(lock) == 1);
            match idle {
                Some(i) => {
                    if let Some((evicted, _)) = locks.shift_remove_index(i) {
                        debug!("Evicted conversation lock {}", evicted);
                    }
                }
                None => break,
            }
        }

        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_brain::EchoBrain;

    fn orchestrator(max_conversations: usize) -> Orchestrator {
        let config = OrchestratorConfig::builder()
            .system_prompt("test")
            .max_conversations(max_conversations)
            .build();
        Orchestrator::new(
            Arc::new(EchoBrain::new()),
            Arc::new(RegistryToolExecutor::new(default_registry(None))),
            config,
        )
    }

    #[tokio::test]
    async fn test_submit_returns_answer_text() {
        let orch = orchestrator(10);
        let answer = orch
            .submit("play something", vec![Turn::user("hi"), Turn::assistant("hello")])
            .await;
        assert_eq!(answer, "play something");
    }

    #[tokio::test]
    async fn test_lock_table_evicts_oldest() {
        let orch = orchestrator(2);
        orch.submit_keyed("a", "one", Vec::new()).await;
        orch.submit_keyed("b", "two", Vec::new()).await;
        orch.submit_keyed("c", "three", Vec::new()).await;

        assert_eq!(orch.tracked_conversations().await, 2);
        let locks = orch.locks.lock().await;
        let keys: Vec<&str> = locks.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_lock_reuse_marks_recent() {
        let orch = orchestrator(2);
        orch.submit_keyed("a", "one", Vec::new()).await;
        orch.submit_keyed("b", "two", Vec::new()).await;
        orch.submit_keyed("a", "again", Vec::new()).await;
        orch.submit_keyed("c", "three", Vec::new()).await;

        let locks = orch.locks.lock().await;
        let keys: Vec<&str> = locks.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_held_lock_is_not_evicted() {
        let orch = orchestrator(1);
        let held = orch.lock_for("busy").await;
        let _guard = held.lock().await;

        orch.lock_for("other").await;
        let locks = orch.locks.lock().await;
        assert!(locks.contains_key("busy"));
    }
}
