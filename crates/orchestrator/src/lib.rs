//! Chat pipeline for the Liner Notes assistant.
//!
//! This crate provides the [`Orchestrator`] type which takes one user turn
//! through a fixed flow and returns the assistant's answer.
//!
//! # Architecture
//!
//! ```text
//! user turn + prior history
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Guardrails: forbidden topic / meta phrase?              │
//! │         ├── yes → append refusal, done (no model call)      │
//! │         ↓                                                   │
//! │  2. Decision step: model call with history + tool specs     │
//! │         ├── failure → append error turn, done               │
//! │         ├── plain answer → done                             │
//! │         ↓                                                   │
//! │  3. Dispatcher: run requested tools, append results         │
//! │         ├── round limit reached → loop-limit turn, done     │
//! │         └── back to 2                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::from_env().await?;
//!
//!     let answer = orchestrator
//!         .submit("Recommend an album with ambient textures", Vec::new())
//!         .await;
//!     println!("{}", answer);
//!
//!     orchestrator.shutdown().await;
//!     Ok(())
//! }
//! ```

mod config;
mod decision;
mod dispatcher;
mod error;
mod guardrails;
mod orchestrator;
mod pipeline;

pub use config::{
    load_system_prompt, OrchestratorConfig, OrchestratorConfigBuilder, DEFAULT_MAX_TOOL_ROUNDS,
    DEFAULT_PROMPT_FILE, DEFAULT_SYSTEM_PROMPT,
};
pub use decision::{Decision, DecisionStep, MODEL_FAILURE_MESSAGE};
pub use dispatcher::ToolDispatcher;
pub use error::OrchestratorError;
pub use guardrails::{
    Block, BlockKind, Guardrails, MatchMode, Verdict, FORBIDDEN_META, FORBIDDEN_TOPICS,
    META_REFUSAL, TOPIC_REFUSAL,
};
pub use orchestrator::Orchestrator;
pub use pipeline::{
    Pipeline, RunOutcome, RunStatus, TOOL_LOOP_LIMIT_MESSAGE, TOOL_LOOP_LIMIT_RESULT,
};

// Re-export commonly used types from dependencies
pub use brain_core::{Conversation, Role, Turn};
