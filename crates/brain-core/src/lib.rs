//! Core types and traits shared by every part of the Liner Notes assistant.
//!
//! This crate defines:
//!
//! - [`Turn`] / [`Conversation`] - The ordered message history a pipeline run works on
//! - [`Brain`] - The trait a language model backend implements
//! - [`ModelRequest`] / [`ModelResponse`] - What a brain receives and returns
//! - [`ToolSpec`] / [`ToolRequest`] / [`ToolResult`] - The tool calling convention
//! - [`ToolExecutor`] - Trait for executing tool calls requested by a brain
//! - [`BrainError`] - Error types for model calls
//!
//! # Example
//!
//! ```rust
//! use brain_core::{async_trait, Brain, BrainError, ModelRequest, ModelResponse};
//!
//! struct Parrot;
//!
//! #[async_trait]
//! impl Brain for Parrot {
//!     async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, BrainError> {
//!         let last = request.turns.last().map(|t| t.content.clone()).unwrap_or_default();
//!         Ok(ModelResponse::text(last))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Parrot"
//!     }
//! }
//! ```

mod conversation;
mod error;
mod prompt;
mod tools;
mod trait_def;

pub use conversation::{Conversation, Role, Turn};
pub use error::BrainError;
pub use prompt::{hash_prompt, load_prompt_file};
pub use tools::{ToolExecutor, ToolRequest, ToolResult, ToolSpec};
pub use trait_def::{Brain, ModelRequest, ModelResponse};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
