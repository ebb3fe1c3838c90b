//! Pipeline configuration and system prompt loading.

use std::env;
use std::time::Duration;

use brain_core::load_prompt_file;
use tracing::{info, warn};

use crate::error::OrchestratorError;
use crate::guardrails::MatchMode;

/// Default path for the system prompt file.
pub const DEFAULT_PROMPT_FILE: &str = "SYSTEM_PROMPT.md";

/// Fallback system prompt if neither the env var nor the file is available.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant. Respond concisely.";

/// Default number of tool dispatch rounds per run.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 3;

/// Default timeout for one model call.
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

/// Default timeout for one tool call.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Default number of conversation locks kept for keyed submissions.
pub const DEFAULT_MAX_CONVERSATIONS: usize = 1000;

/// Load the system prompt.
///
/// Priority:
/// 1. `CHAT_SYSTEM_PROMPT` env var (if set)
/// 2. Contents of prompt file (`CHAT_PROMPT_FILE` or default `SYSTEM_PROMPT.md`)
/// 3. Embedded default prompt
pub fn load_system_prompt() -> String {
    if let Ok(prompt) = env::var("CHAT_SYSTEM_PROMPT") {
        if !prompt.trim().is_empty() {
            info!("Using system prompt from CHAT_SYSTEM_PROMPT env var");
            return prompt;
        }
    }

    let prompt_file =
        env::var("CHAT_PROMPT_FILE").unwrap_or_else(|_| DEFAULT_PROMPT_FILE.to_string());

    if let Some(prompt) = load_prompt_file(&prompt_file) {
        info!("Loaded system prompt from {}", prompt_file);
        return prompt;
    }

    info!("Using embedded default system prompt");
    DEFAULT_SYSTEM_PROMPT.to_string()
}

/// Configuration for the chat pipeline.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Instruction preamble sent with every model call.
    pub system_prompt: String,

    /// Tool dispatch rounds allowed per run before the loop is cut off.
    pub max_tool_rounds: usize,

    /// Timeout for one model call.
    pub model_timeout: Duration,

    /// Timeout for one tool call.
    pub tool_timeout: Duration,

    /// How guardrail terms are matched.
    pub guardrail_match: MatchMode,

    /// Conversation locks kept for `submit_keyed` before LRU eviction.
    pub max_conversations: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            guardrail_match: MatchMode::default(),
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring invalid {}: {}", key, value);
            None
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CHAT_SYSTEM_PROMPT` / `CHAT_PROMPT_FILE` - See [`load_system_prompt`]
    /// - `CHAT_MAX_TOOL_ROUNDS` - Dispatch rounds per run (default: 3)
    /// - `CHAT_MODEL_TIMEOUT_SECS` - Model call timeout (default: 60)
    /// - `CHAT_TOOL_TIMEOUT_SECS` - Tool call timeout (default: 30)
    /// - `CHAT_GUARDRAIL_MATCH` - `substring` or `whole_word` (default: substring)
    /// - `CHAT_MAX_CONVERSATIONS` - Lock table size (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let guardrail_match = match env::var("CHAT_GUARDRAIL_MATCH") {
            Ok(value) => MatchMode::parse(&value).unwrap_or_else(|| {
                warn!("Unknown CHAT_GUARDRAIL_MATCH '{}', using substring", value);
                MatchMode::Substring
            }),
            Err(_) => defaults.guardrail_match,
        };

        Self {
            system_prompt: load_system_prompt(),
            max_tool_rounds: env_parse("CHAT_MAX_TOOL_ROUNDS").unwrap_or(defaults.max_tool_rounds),
            model_timeout: env_parse("CHAT_MODEL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.model_timeout),
            tool_timeout: env_parse("CHAT_TOOL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.tool_timeout),
            guardrail_match,
            max_conversations: env_parse("CHAT_MAX_CONVERSATIONS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_conversations),
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.system_prompt.trim().is_empty() {
            return Err(OrchestratorError::Configuration(
                "system prompt is empty".to_string(),
            ));
        }
        if self.model_timeout.is_zero() || self.tool_timeout.is_zero() {
            return Err(OrchestratorError::Configuration(
                "timeouts must be non-zero".to_string(),
            ));
        }
        if self.max_conversations == 0 {
            return Err(OrchestratorError::Configuration(
                "max_conversations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a new config builder.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }
}

/// Builder for OrchestratorConfig.
#[derive(Debug, Default)]
pub struct OrchestratorConfigBuilder {
    config: OrchestratorConfig,
}

impl OrchestratorConfigBuilder {
    /// Set the system prompt.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    /// Set the dispatch round limit.
    pub fn max_tool_rounds(mut self, rounds: usize) -> Self {
        self.config.max_tool_rounds = rounds;
        self
    }

    /// Set the model call timeout.
    pub fn model_timeout(mut self, timeout: Duration) -> Self {
        self.config.model_timeout = timeout;
        self
    }

    /// Set the tool call timeout.
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.config.tool_timeout = timeout;
        self
    }

    /// Set the guardrail match mode.
    pub fn guardrail_match(mut self, mode: MatchMode) -> Self {
        self.config.guardrail_match = mode;
        self
    }

    /// Set the lock table size.
    pub fn max_conversations(mut self, n: usize) -> Self {
        self.config.max_conversations = n.max(1);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OrchestratorConfig {
        self.config
    }
}
