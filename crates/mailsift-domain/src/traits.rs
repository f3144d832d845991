//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::Conversation;
use async_trait::async_trait;

/// Error raised by a completion provider
///
/// The completion loop retries retryable errors and aborts on the rest.
pub trait ProviderError: std::error::Error + Send + Sync + 'static {
    /// Whether another attempt could succeed
    ///
    /// Every runtime failure is retryable, an unknown model included.
    /// Implementations return `false` only for configuration defects that no
    /// later attempt can fix, such as an unusable header.
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Trait for text-generation providers
///
/// Implemented by the infrastructure layer (mailsift-llm)
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Error type for provider operations
    type Error: ProviderError;

    /// Send the whole conversation and return the assistant's reply text
    async fn complete(&self, conversation: &Conversation) -> Result<String, Self::Error>;

    /// Identifier of the model behind this provider
    fn model_name(&self) -> &str;
}
