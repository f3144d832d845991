//! Mailsift LLM Provider Layer
//!
//! Implementations of the `CompletionProvider` trait from `mailsift-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `ChatProvider`: OpenAI-compatible `/chat/completions` HTTP endpoint
//!
//! # Examples
//!
//! ```
//! use mailsift_llm::MockProvider;
//! use mailsift_domain::traits::CompletionProvider;
//! use mailsift_domain::Conversation;
//!
//! # async fn example() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let reply = provider.complete(&Conversation::with_prompt("hi")).await.unwrap();
//! assert_eq!(reply, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod chat;

use async_trait::async_trait;
use mailsift_domain::traits::{CompletionProvider, ProviderError};
use mailsift_domain::Conversation;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use chat::{ChatProvider, ChatProviderConfig};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider is misconfigured (bad header, unusable client settings)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Runtime failures are all retried; only a misconfigured provider is fatal
impl ProviderError for LlmError {
    fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::Config(_))
    }
}

/// Scripted outcome for one mock call
#[derive(Debug)]
enum MockReply {
    Text(String),
    Error(LlmError),
}

/// Mock LLM provider for deterministic testing
///
/// Returns queued replies in order, then falls back to a fixed default.
/// Every conversation it receives is recorded so tests can inspect the
/// turns sent on each attempt.
///
/// # Examples
///
/// ```
/// use mailsift_llm::{LlmError, MockProvider};
///
/// let provider = MockProvider::new("fallback");
/// provider.push_response("first");
/// provider.push_error(LlmError::RateLimitExceeded);
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    received: Arc<Mutex<Vec<Conversation>>>,
}

/// Recover the guard from a poisoned lock; mock state stays usable after a
/// panicking test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all calls
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply for the next unanswered call
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.script).push_back(MockReply::Text(response.into()));
    }

    /// Queue an error for the next unanswered call
    pub fn push_error(&self, error: LlmError) {
        lock(&self.script).push_back(MockReply::Error(error));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        lock(&self.received).len()
    }

    /// Conversations received so far, oldest first
    pub fn received(&self) -> Vec<Conversation> {
        lock(&self.received).clone()
    }

    /// Forget recorded calls
    pub fn reset_call_count(&self) {
        lock(&self.received).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    type Error = LlmError;

    async fn complete(&self, conversation: &Conversation) -> Result<String, Self::Error> {
        lock(&self.received).push(conversation.clone());

        match lock(&self.script).pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(e)) => Err(e),
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> Conversation {
        Conversation::with_prompt("any prompt")
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete(&prompt()).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_responses() {
        let provider = MockProvider::default();
        provider.push_response("world");
        provider.push_response("bar");

        assert_eq!(provider.complete(&prompt()).await.unwrap(), "world");
        assert_eq!(provider.complete(&prompt()).await.unwrap(), "bar");
        assert_eq!(
            provider.complete(&prompt()).await.unwrap(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.complete(&prompt()).await.unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.complete(&prompt()).await.unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.push_error(LlmError::Communication("connection reset".to_string()));

        let result = provider.complete(&prompt()).await;
        assert!(matches!(result.unwrap_err(), LlmError::Communication(_)));
    }

    #[tokio::test]
    async fn test_mock_provider_records_conversations() {
        let provider = MockProvider::new("ok");
        let mut conversation = prompt();
        provider.complete(&conversation).await.unwrap();
        conversation.push(mailsift_domain::ChatMessage::user("again"));
        provider.complete(&conversation).await.unwrap();

        let received = provider.received();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].len(), 1);
        assert_eq!(received[1].len(), 2);
    }

    #[tokio::test]
    async fn test_mock_provider_clone() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete(&prompt()).await.unwrap();

        // Both should share the same call count due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::Communication("reset".into()).is_retryable());
        assert!(LlmError::RateLimitExceeded.is_retryable());
        assert!(LlmError::InvalidResponse("bad".into()).is_retryable());
        assert!(LlmError::ModelNotAvailable("gpt".into()).is_retryable());
        assert!(!LlmError::Config("header".into()).is_retryable());
    }
}
