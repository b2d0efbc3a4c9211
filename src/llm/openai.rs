//! OpenAI chat-completions provider
//!
//! Implements the Provider trait over the `/v1/chat/completions` endpoint.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::provider::{Provider, ProviderError};
use super::types::Message;

/// Default API base URL
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model to use
const DEFAULT_MODEL: &str = "gpt-4o";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 3000;

/// Default sampling temperature
const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration for the OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(300),
            base_url: OPENAI_API_URL.to_string(),
        }
    }
}

impl OpenAiConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Token usage reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    fn add(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// OpenAI API provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
    usage: Mutex<Usage>,
}

impl OpenAiProvider {
    /// Create a provider reading the key from the named environment variable
    pub fn from_env(env_var: &str, config: OpenAiConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(env_var).map_err(|_| ProviderError::MissingApiKey {
            env_var: env_var.to_string(),
        })?;
        Self::with_api_key(api_key, config)
    }

    /// Create a provider with an explicit API key
    pub fn with_api_key(api_key: String, config: OpenAiConfig) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey {
                env_var: DEFAULT_API_KEY_ENV.to_string(),
            });
        }
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            config,
            usage: Mutex::new(Usage::default()),
        })
    }

    /// Build the request body: history first, then the prompt as the final user turn
    fn build_request(&self, prompt: &str, history: &[Message]) -> Value {
        let mut messages: Vec<Value> = history
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();
        messages.push(json!({ "role": "user", "content": prompt }));

        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "messages": messages
        })
    }

    /// Pull the reply text out of a completion body
    fn parse_response(&self, body: &Value) -> Result<String, ProviderError> {
        if let Some(u) = body.get("usage") {
            let usage = Usage {
                prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0),
                completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
            };
            if let Ok(mut total) = self.usage.lock() {
                total.add(&usage);
            }
        }

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("No response content received".to_string()))
    }

    async fn send_request(&self, body: Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to decode response: {}", e)))
    }

    /// Cumulative token usage across calls
    pub fn total_usage(&self) -> Usage {
        self.usage.lock().map(|u| *u).unwrap_or_default()
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn get_response(&self, prompt: &str, history: &[Message]) -> Result<String, ProviderError> {
        log::debug!(
            "Requesting completion from {} ({} history messages)",
            self.config.model,
            history.len()
        );
        let body = self.build_request(prompt, history);
        let response = self.send_request(body).await?;
        self.parse_response(&response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::with_api_key("test-key".to_string(), OpenAiConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = OpenAiConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_config_with_model() {
        let config = OpenAiConfig::with_model("gpt-4o-mini");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiProvider::with_api_key(String::new(), OpenAiConfig::default());
        assert!(matches!(result, Err(ProviderError::MissingApiKey { .. })));
    }

    #[test]
    fn test_missing_env_var() {
        let result = OpenAiProvider::from_env("QUILL_TEST_KEY_THAT_IS_NEVER_SET", OpenAiConfig::default());
        assert!(matches!(result, Err(ProviderError::MissingApiKey { .. })));
    }

    #[test]
    fn test_build_request_appends_prompt_after_history() {
        let provider = provider();
        let history = vec![Message::system("You are helpful"), Message::user("Hi")];

        let body = provider.build_request("Follow up", &history);

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hi");
        assert_eq!(body["messages"][2]["role"], "user");
        assert_eq!(body["messages"][2]["content"], "Follow up");
    }

    #[test]
    fn test_parse_response_content_and_usage() {
        let provider = provider();
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hello!" } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
        });

        assert_eq!(provider.parse_response(&body).unwrap(), "Hello!");
        assert_eq!(provider.total_usage().total(), 15);
    }

    #[test]
    fn test_parse_response_without_content() {
        let provider = provider();
        let body = json!({ "choices": [] });
        assert!(matches!(
            provider.parse_response(&body),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
