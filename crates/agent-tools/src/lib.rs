//! Tool registry and built-in tools for the Liner Notes assistant.
//!
//! A [`Tool`] is a callable capability with a name, a description and a JSON
//! Schema for its arguments. Tools live in a [`ToolRegistry`]; the
//! [`RegistryToolExecutor`] adapter exposes a registry as brain-core's
//! `ToolExecutor`, so the dispatcher can run whatever the model asks for.
//!
//! # Built-in Tools
//!
//! - [`CatFacts`] / [`DogFacts`] - Facts from a fixed list.
//! - [`Horoscope`] - A fixed reading per zodiac sign.
//! - [`RiskCalculator`] - Expected loss from loss and probability.
//! - [`RecommendAlbums`] - Similar album reviews from a `review-index` collection.
//! - [`DisabledTool`] - Stand-in for a tool that could not be built.
//!
//! # Example
//!
//! ```rust
//! use agent_tools::default_registry;
//!
//! #[tokio::main]
//! async fn main() {
//!     // No review index: recommend_albums is registered as disabled.
//!     let registry = default_registry(None);
//!
//!     let result = registry
//!         .execute_json("risk_calculator", r#"{"loss": 100, "probability": 0.2}"#)
//!         .await
//!         .unwrap();
//!     println!("{}", result.content); // "Expected loss is 20"
//! }
//! ```

mod error;
mod executor;
mod registry;
mod tool;
pub mod tools;

pub use error::ToolError;
pub use executor::{RegistryToolExecutor, TOOL_TIMED_OUT, TOOL_UNAVAILABLE};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolArgs, ToolOutput};
pub use tools::{
    CatFacts, DisabledTool, DogFacts, Horoscope, RecommendAlbums, RiskCalculator, NO_MATCHES,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Message reported by `recommend_albums` when no index is available.
pub const MUSIC_TOOL_UNAVAILABLE: &str = "Music tool unavailable";

/// Create a registry with all built-in tools registered.
///
/// Pass `None` when the review index could not be opened; `recommend_albums`
/// is then registered as a [`DisabledTool`] that reports
/// [`MUSIC_TOOL_UNAVAILABLE`].
pub fn default_registry(music: Option<RecommendAlbums>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(CatFacts::new());
    registry.register(DogFacts::new());
    match music {
        Some(tool) => registry.register(tool),
        None => {
            tracing::warn!("Review index unavailable, registering recommend_albums as disabled");
            registry.register(RecommendAlbums::disabled(MUSIC_TOOL_UNAVAILABLE));
        }
    }
    registry.register(Horoscope::new());
    registry.register(RiskCalculator::new());

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_tools() {
        let registry = default_registry(None);
        assert_eq!(
            registry.list_tools(),
            vec![
                "get_cat_facts",
                "get_dog_facts",
                "recommend_albums",
                "get_horoscope",
                "risk_calculator"
            ]
        );
        for spec in registry.specs() {
            assert_eq!(spec.parameters["type"], "object");
            assert!(!spec.description.is_empty());
        }
    }

    #[tokio::test]
    async fn test_disabled_music_tool() {
        let registry = default_registry(None);
        let output = registry
            .execute_json("recommend_albums", r#"{"query": "jazz"}"#)
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.content, MUSIC_TOOL_UNAVAILABLE);
    }
}
