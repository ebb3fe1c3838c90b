//! OpenAI-compatible brain implementation.
//!
//! This crate provides a [`Brain`] that talks to any endpoint speaking the
//! OpenAI chat-completions format, with the conversation's tools bound as
//! function tools.
//!
//! # Features
//!
//! - Stateless: the caller supplies the full conversation each call
//! - Function tool binding and `tool_calls` parsing
//! - Bearer or `x-api-key` authentication (for API gateways)
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_brain::OpenAiBrain;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = OpenAiBrain::from_env()?;
//!     // Hand the brain to the orchestrator...
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::OpenAiBrain;
pub use config::{AuthHeader, OpenAiBrainConfig, OpenAiBrainConfigBuilder, DEFAULT_API_URL, DEFAULT_MODEL};

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, ModelRequest, ModelResponse};
