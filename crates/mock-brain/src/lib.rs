//! Mock brain implementations for exercising the chat pipeline.
//!
//! This crate provides test doubles for the `Brain` trait:
//! - `EchoBrain` - Answers with the latest user turn
//! - `ScriptedBrain` - Replays a fixed list of responses and failures
//! - `FailingBrain` - Always fails, like an unreachable endpoint
//! - `LoopingBrain` - Requests the same tool forever
//! - `DelayedBrain` - Wraps another brain with artificial delay
//!
//! For real model calls, use the `openai-brain` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, EchoBrain, ModelRequest, Turn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = EchoBrain::new();
//!     let request = ModelRequest {
//!         turns: vec![Turn::user("Hello!")],
//!         ..Default::default()
//!     };
//!
//!     let response = brain.complete(request).await?;
//!     println!("Response: {}", response.text);
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, Brain, BrainError, ModelRequest, ModelResponse, ToolRequest, Turn,
};

pub use delayed::DelayedBrain;
pub use echo::EchoBrain;
pub use scripted::{FailingBrain, LoopingBrain, ScriptStep, ScriptedBrain};
