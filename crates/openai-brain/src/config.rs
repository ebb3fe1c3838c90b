//! Configuration for OpenAiBrain.

use brain_core::BrainError;
use std::env;
use std::time::Duration;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default HTTP timeout for API requests (60 seconds).
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// How the API key is presented to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthHeader {
    /// `Authorization: Bearer <key>` (OpenAI itself).
    Bearer,
    /// `x-api-key: <key>` (API gateways in front of OpenAI).
    ApiKey,
}

impl AuthHeader {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "bearer" | "authorization" => Some(AuthHeader::Bearer),
            "x-api-key" | "api-key" | "apikey" => Some(AuthHeader::ApiKey),
            _ => None,
        }
    }
}

/// Configuration for OpenAiBrain.
#[derive(Debug, Clone)]
pub struct OpenAiBrainConfig {
    /// API base URL (the `/chat/completions` path is appended).
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// How the key is sent.
    pub auth_header: AuthHeader,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// HTTP timeout for a single request.
    pub timeout: Duration,
}

impl Default for OpenAiBrainConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            auth_header: AuthHeader::Bearer,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: Some(1024),
            temperature: None,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl OpenAiBrainConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables (one of):
    /// - `API_GATEWAY_KEY` - Key for an API gateway (sent as `x-api-key` by default)
    /// - `OPENAI_API_KEY` - OpenAI key (sent as a bearer token by default)
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API base URL (default: https://api.openai.com/v1)
    /// - `OPENAI_MODEL` - Model name (default: gpt-4o-mini)
    /// - `OPENAI_AUTH_HEADER` - `bearer` or `x-api-key`
    /// - `OPENAI_MAX_TOKENS` - Max tokens (default: 1024)
    /// - `OPENAI_TEMPERATURE` - Temperature (default: model default)
    /// - `OPENAI_TIMEOUT_SECS` - HTTP timeout (default: 60)
    pub fn from_env() -> Result<Self, BrainError> {
        let (api_key, default_auth) = match env::var("API_GATEWAY_KEY") {
            Ok(key) if !key.trim().is_empty() => (key, AuthHeader::ApiKey),
            _ => match env::var("OPENAI_API_KEY") {
                Ok(key) if !key.trim().is_empty() => (key, AuthHeader::Bearer),
                _ => {
                    return Err(BrainError::Configuration(
                        "API_GATEWAY_KEY or OPENAI_API_KEY not set".to_string(),
                    ))
                }
            },
        };

        let api_url = env::var("OPENAI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let auth_header = match env::var("OPENAI_AUTH_HEADER") {
            Ok(value) => AuthHeader::parse(&value).ok_or_else(|| {
                BrainError::Configuration(format!("invalid OPENAI_AUTH_HEADER: {}", value))
            })?,
            Err(_) => default_auth,
        };

        let max_tokens = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(1024));

        let temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        let timeout = env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));

        Ok(Self {
            api_url,
            api_key,
            auth_header,
            model,
            max_tokens,
            temperature,
            timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiBrainConfigBuilder {
        OpenAiBrainConfigBuilder::default()
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Builder for OpenAiBrainConfig.
#[derive(Debug, Default)]
pub struct OpenAiBrainConfigBuilder {
    config: OpenAiBrainConfig,
}

impl OpenAiBrainConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set how the key is sent.
    pub fn auth_header(mut self, auth: AuthHeader) -> Self {
        self.config.auth_header = auth;
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiBrainConfig {
        self.config
    }
}
