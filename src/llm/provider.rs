//! Provider trait - the single capability the core needs from a language model

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::types::Message;

/// A language model backend.
///
/// Each call sends the prompt as a final user turn after `history` and returns
/// the raw text of the reply. Implementations never retry on their own.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn get_response(&self, prompt: &str, history: &[Message]) -> Result<String, ProviderError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Transport failures from a provider call
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),
}

/// Races every call of the wrapped provider against a timer.
///
/// An expired timer surfaces as [`ProviderError::Timeout`] and is propagated
/// like any other transport failure.
pub struct TimeoutProvider {
    inner: Arc<dyn Provider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl Provider for TimeoutProvider {
    async fn get_response(&self, prompt: &str, history: &[Message]) -> Result<String, ProviderError> {
        tokio::time::timeout(self.timeout, self.inner.get_response(prompt, history))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

/// One recorded call made against a [`MockProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub prompt: String,
    pub history: Vec<Message>,
}

enum Scripted {
    Text(String),
    Fail(String),
}

/// Scripted provider for tests and offline runs.
///
/// Replies are served in the order they were queued. Once the queue is empty
/// the fallback reply is used; without one the call fails.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<Scripted>>,
    fallback: Option<String>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that answers every call with the same text
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Mock that serves the given replies in order
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for reply in replies {
            mock.push_reply(reply);
        }
        mock
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Scripted::Text(reply.into()));
    }

    /// Queue a transport failure
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock_replies().push_back(Scripted::Fail(message.into()));
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn get_response(&self, prompt: &str, history: &[Message]) -> Result<String, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ProviderCall {
                prompt: prompt.to_string(),
                history: history.to_vec(),
            });
        }

        match self.lock_replies().pop_front() {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(ProviderError::Api { status: 500, message }),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ProviderError::InvalidResponse("mock provider has no reply queued".to_string())),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider;

    #[async_trait]
    impl Provider for SlowProvider {
        async fn get_response(&self, _prompt: &str, _history: &[Message]) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }

        fn model(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_mock_serves_replies_in_order() {
        let mock = MockProvider::with_replies(["one", "two"]);
        assert_eq!(mock.get_response("a", &[]).await.unwrap(), "one");
        assert_eq!(mock.get_response("b", &[]).await.unwrap(), "two");
        assert!(mock.get_response("c", &[]).await.is_err());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_prompt_and_history() {
        let mock = MockProvider::always("ok");
        let history = vec![Message::system("sys")];
        mock.get_response("hello", &history).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "hello");
        assert_eq!(calls[0].history, history);
    }

    #[tokio::test]
    async fn test_mock_error_reply() {
        let mock = MockProvider::new();
        mock.push_error("upstream down");
        let err = mock.get_response("x", &[]).await.unwrap_err();
        assert!(err.to_string().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_timeout_provider_expires() {
        let provider = TimeoutProvider::new(Arc::new(SlowProvider), Duration::from_millis(10));
        let err = provider.get_response("x", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_timeout_provider_passes_through() {
        let provider = TimeoutProvider::new(Arc::new(MockProvider::always("fast")), Duration::from_secs(1));
        assert_eq!(provider.get_response("x", &[]).await.unwrap(), "fast");
        assert_eq!(provider.model(), "mock-model");
    }
}
